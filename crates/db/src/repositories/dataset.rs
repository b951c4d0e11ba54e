//! Dataset repository.

use std::sync::Arc;

use async_trait::async_trait;
use dac_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{Dataset, DatasetOwner, dataset, dataset_owner};

/// Storage contract for datasets and their owners.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Find a dataset by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<dataset::Model>>;

    /// Find datasets by IDs. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<dataset::Model>>;

    /// User ids of the data owners of a dataset.
    async fn find_owner_ids(&self, dataset_id: &str) -> AppResult<Vec<String>>;
}

/// Shared dataset store handle.
pub type SharedDatasetStore = Arc<dyn DatasetStore>;

/// Dataset repository for database operations.
#[derive(Clone)]
pub struct DatasetRepository {
    db: Arc<DatabaseConnection>,
}

impl DatasetRepository {
    /// Create a new dataset repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DatasetStore for DatasetRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<dataset::Model>> {
        Dataset::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<dataset::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Dataset::find()
            .filter(dataset::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_owner_ids(&self, dataset_id: &str) -> AppResult<Vec<String>> {
        let owners = DatasetOwner::find()
            .filter(dataset_owner::Column::DatasetId.eq(dataset_id))
            .order_by_asc(dataset_owner::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(owners.into_iter().map(|o| o.user_id).collect())
    }
}
