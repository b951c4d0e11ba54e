//! Data access request repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dac_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};
use serde_json::json;

use crate::entities::{DataAccessRequest, data_access_request};

/// Storage contract for DAR documents.
///
/// DAR writes never share a transaction with election writes; every write
/// here sets absolute values so a retry is harmless.
#[async_trait]
pub trait DataAccessRequestStore: Send + Sync {
    /// Find a DAR by reference ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<data_access_request::Model>>;

    /// Replace the requested dataset ids.
    async fn update_dataset_ids(&self, id: &str, dataset_ids: &[String]) -> AppResult<()>;

    /// Set the manage-view sort date.
    async fn touch_sort_date(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;
}

/// Shared DAR store handle.
pub type SharedDataAccessRequestStore = Arc<dyn DataAccessRequestStore>;

/// Data access request repository for database operations.
#[derive(Clone)]
pub struct DataAccessRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl DataAccessRequestRepository {
    /// Create a new DAR repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DataAccessRequestStore for DataAccessRequestRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<data_access_request::Model>> {
        DataAccessRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_dataset_ids(&self, id: &str, dataset_ids: &[String]) -> AppResult<()> {
        DataAccessRequest::update_many()
            .col_expr(
                data_access_request::Column::DatasetIds,
                Expr::value(json!(dataset_ids)),
            )
            .filter(data_access_request::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn touch_sort_date(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        DataAccessRequest::update_many()
            .col_expr(data_access_request::Column::SortDate, Expr::value(at))
            .filter(data_access_request::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
