//! Consent repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dac_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};

use crate::entities::{Consent, consent};

/// Storage contract for consents.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Find a consent by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<consent::Model>>;

    /// Set the manage-view sort date of the given consents.
    ///
    /// Repeating the call with the same arguments leaves the rows unchanged.
    async fn touch_sort_date(&self, ids: &[String], at: DateTime<Utc>) -> AppResult<()>;
}

/// Shared consent store handle.
pub type SharedConsentStore = Arc<dyn ConsentStore>;

/// Consent repository for database operations.
#[derive(Clone)]
pub struct ConsentRepository {
    db: Arc<DatabaseConnection>,
}

impl ConsentRepository {
    /// Create a new consent repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConsentStore for ConsentRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<consent::Model>> {
        Consent::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn touch_sort_date(&self, ids: &[String], at: DateTime<Utc>) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        Consent::update_many()
            .col_expr(consent::Column::SortDate, Expr::value(at))
            .col_expr(consent::Column::LastUpdate, Expr::value(at))
            .filter(consent::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_by_id() {
        let consent = consent::Model {
            id: "c1".to_string(),
            name: "Consent 1".to_string(),
            use_restriction: json!({"type": "everything"}),
            translated_use_restriction: None,
            requires_manual_review: false,
            sort_date: Utc::now().into(),
            last_update: None,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[consent]])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let found = repo.find_by_id("c1").await.unwrap().unwrap();

        assert_eq!(found.name, "Consent 1");
    }

    #[tokio::test]
    async fn test_touch_sort_date() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let result = repo
            .touch_sort_date(&["c1".to_string(), "c2".to_string()], Utc::now())
            .await;

        assert!(result.is_ok());
    }
}
