//! Election repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dac_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{
    AccessRp, Election, access_rp,
    election::{self, ElectionStatus, ElectionType},
};

/// Storage contract for election rows and the access/research-purpose link.
#[async_trait]
pub trait ElectionStore: Send + Sync {
    /// Find an election by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<election::Model>>;

    /// Insert a new election row.
    async fn insert(&self, model: election::Model) -> AppResult<election::Model>;

    /// Overwrite an existing election row.
    async fn update(&self, model: election::Model) -> AppResult<election::Model>;

    /// Delete an election row. Votes and links cascade.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// The open election for a reference and type, if any.
    ///
    /// `DataSet` elections are per dataset; use [`ElectionStore::find_open_dataset_election`].
    async fn find_open_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<election::Model>>;

    /// The open `DataSet` election for a reference and dataset, if any.
    async fn find_open_dataset_election(
        &self,
        reference_id: &str,
        dataset_id: &str,
    ) -> AppResult<Option<election::Model>>;

    /// Most recent election for a reference and type, optionally restricted to a status.
    async fn find_last_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        status: Option<ElectionStatus>,
    ) -> AppResult<Option<election::Model>>;

    /// Every election for a reference and type, newest first.
    async fn find_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Vec<election::Model>>;

    /// Every election for a reference, newest first.
    async fn find_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>>;

    /// Open elections for a reference (any type).
    async fn find_open_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>>;

    /// Elections of a type in a status.
    async fn find_by_type_and_status(
        &self,
        election_type: ElectionType,
        status: ElectionStatus,
    ) -> AppResult<Vec<election::Model>>;

    /// Open elections of a type created before `cutoff`.
    async fn find_open_created_before(
        &self,
        election_type: ElectionType,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<election::Model>>;

    /// Count open elections for a reference (any type).
    async fn count_open_by_reference(&self, reference_id: &str) -> AppResult<u64>;

    /// Count elections in a status, optionally restricted to a type.
    async fn count_by_status(
        &self,
        status: ElectionStatus,
        election_type: Option<ElectionType>,
    ) -> AppResult<u64>;

    /// Link a data access election to its research purpose election.
    async fn link_access_rp(&self, access_election_id: &str, rp_election_id: &str)
    -> AppResult<()>;

    /// Research purpose election paired with a data access election.
    async fn find_rp_id_by_access_id(&self, access_election_id: &str)
    -> AppResult<Option<String>>;

    /// Data access election paired with a research purpose election.
    async fn find_access_id_by_rp_id(&self, rp_election_id: &str) -> AppResult<Option<String>>;

    /// Remove the link of a data access election.
    async fn delete_access_rp(&self, access_election_id: &str) -> AppResult<()>;
}

/// Shared election store handle.
pub type SharedElectionStore = Arc<dyn ElectionStore>;

/// Election repository for database operations.
#[derive(Clone)]
pub struct ElectionRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl ElectionRepository {
    /// Create a new election repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get an election by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<election::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Election not found: {id}")))
    }
}

fn active_model(model: election::Model) -> election::ActiveModel {
    election::ActiveModel {
        id: Set(model.id),
        election_type: Set(model.election_type),
        status: Set(model.status),
        reference_id: Set(model.reference_id),
        dataset_id: Set(model.dataset_id),
        create_date: Set(model.create_date),
        last_update: Set(model.last_update),
        final_vote: Set(model.final_vote),
        final_vote_date: Set(model.final_vote_date),
        final_rationale: Set(model.final_rationale),
        final_access_vote: Set(model.final_access_vote),
        use_restriction: Set(model.use_restriction),
        translated_use_restriction: Set(model.translated_use_restriction),
    }
}

#[async_trait]
impl ElectionStore for ElectionRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<election::Model>> {
        Election::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, model: election::Model) -> AppResult<election::Model> {
        active_model(model)
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, model: election::Model) -> AppResult<election::Model> {
        active_model(model)
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        Election::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_open_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<election::Model>> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::ElectionType.eq(election_type))
            .filter(election::Column::Status.eq(ElectionStatus::Open))
            .order_by_desc(election::Column::CreateDate)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_open_dataset_election(
        &self,
        reference_id: &str,
        dataset_id: &str,
    ) -> AppResult<Option<election::Model>> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::ElectionType.eq(ElectionType::DataSet))
            .filter(election::Column::DatasetId.eq(dataset_id))
            .filter(election::Column::Status.eq(ElectionStatus::Open))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_last_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        status: Option<ElectionStatus>,
    ) -> AppResult<Option<election::Model>> {
        let mut query = Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::ElectionType.eq(election_type));

        if let Some(status) = status {
            query = query.filter(election::Column::Status.eq(status));
        }

        query
            .order_by_desc(election::Column::CreateDate)
            .order_by_desc(election::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Vec<election::Model>> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::ElectionType.eq(election_type))
            .order_by_desc(election::Column::CreateDate)
            .order_by_desc(election::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .order_by_desc(election::Column::CreateDate)
            .order_by_desc(election::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_open_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::Status.eq(ElectionStatus::Open))
            .order_by_asc(election::Column::CreateDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_type_and_status(
        &self,
        election_type: ElectionType,
        status: ElectionStatus,
    ) -> AppResult<Vec<election::Model>> {
        Election::find()
            .filter(election::Column::ElectionType.eq(election_type))
            .filter(election::Column::Status.eq(status))
            .order_by_asc(election::Column::CreateDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_open_created_before(
        &self,
        election_type: ElectionType,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<election::Model>> {
        Election::find()
            .filter(election::Column::ElectionType.eq(election_type))
            .filter(election::Column::Status.eq(ElectionStatus::Open))
            .filter(election::Column::CreateDate.lt(cutoff))
            .order_by_asc(election::Column::CreateDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_open_by_reference(&self, reference_id: &str) -> AppResult<u64> {
        Election::find()
            .filter(election::Column::ReferenceId.eq(reference_id))
            .filter(election::Column::Status.eq(ElectionStatus::Open))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_by_status(
        &self,
        status: ElectionStatus,
        election_type: Option<ElectionType>,
    ) -> AppResult<u64> {
        let mut condition = Condition::all().add(election::Column::Status.eq(status));
        if let Some(election_type) = election_type {
            condition = condition.add(election::Column::ElectionType.eq(election_type));
        }

        Election::find()
            .filter(condition)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn link_access_rp(
        &self,
        access_election_id: &str,
        rp_election_id: &str,
    ) -> AppResult<()> {
        let model = access_rp::ActiveModel {
            id: Set(self.id_gen.generate()),
            election_access_id: Set(access_election_id.to_string()),
            election_rp_id: Set(rp_election_id.to_string()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_rp_id_by_access_id(
        &self,
        access_election_id: &str,
    ) -> AppResult<Option<String>> {
        let link = AccessRp::find()
            .filter(access_rp::Column::ElectionAccessId.eq(access_election_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(link.map(|l| l.election_rp_id))
    }

    async fn find_access_id_by_rp_id(&self, rp_election_id: &str) -> AppResult<Option<String>> {
        let link = AccessRp::find()
            .filter(access_rp::Column::ElectionRpId.eq(rp_election_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(link.map(|l| l.election_access_id))
    }

    async fn delete_access_rp(&self, access_election_id: &str) -> AppResult<()> {
        AccessRp::delete_many()
            .filter(access_rp::Column::ElectionAccessId.eq(access_election_id))
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

    fn create_test_election(id: &str, status: ElectionStatus) -> election::Model {
        election::Model {
            id: id.to_string(),
            election_type: ElectionType::TranslateDul,
            status,
            reference_id: "consent1".to_string(),
            dataset_id: None,
            create_date: Utc::now().into(),
            last_update: None,
            final_vote: None,
            final_vote_date: None,
            final_rationale: None,
            final_access_vote: None,
            use_restriction: None,
            translated_use_restriction: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_election() {
        let election = create_test_election("e1", ElectionStatus::Open);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[election.clone()]])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        let found = repo.find_by_id("e1").await.unwrap().unwrap();

        assert_eq!(found.id, "e1");
        assert_eq!(found.status, ElectionStatus::Open);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<election::Model>::new()])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_open_by_reference_and_type() {
        let election = create_test_election("e1", ElectionStatus::Open);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[election]])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        let found = repo
            .find_open_by_reference_and_type("consent1", ElectionType::TranslateDul)
            .await
            .unwrap();

        assert_eq!(found.map(|e| e.id), Some("e1".to_string()));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        let count = repo.count_by_status(ElectionStatus::Open, None).await.unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_find_rp_id_by_access_id() {
        let link = access_rp::Model {
            id: "l1".to_string(),
            election_access_id: "access1".to_string(),
            election_rp_id: "rp1".to_string(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[link]])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        let rp_id = repo.find_rp_id_by_access_id("access1").await.unwrap();

        assert_eq!(rp_id, Some("rp1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_access_rp() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ElectionRepository::new(db);
        assert!(repo.delete_access_rp("access1").await.is_ok());
    }
}
