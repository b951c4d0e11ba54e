//! Vote repository.

use std::sync::Arc;

use async_trait::async_trait;
use dac_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{
    Vote,
    vote::{self, VoteType},
};

/// Storage contract for vote rows.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Find a vote by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>>;

    /// Insert a new vote row.
    async fn insert(&self, model: vote::Model) -> AppResult<vote::Model>;

    /// Overwrite an existing vote row.
    async fn update(&self, model: vote::Model) -> AppResult<vote::Model>;

    /// Delete a vote row.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Delete every vote of the given elections.
    async fn delete_by_election_ids(&self, election_ids: &[String]) -> AppResult<u64>;

    /// Every vote of an election.
    async fn find_by_election(&self, election_id: &str) -> AppResult<Vec<vote::Model>>;

    /// Votes of an election with the given type.
    async fn find_by_election_and_type(
        &self,
        election_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Vec<vote::Model>>;

    /// The vote of one user with one type on an election.
    async fn find_by_election_user_and_type(
        &self,
        election_id: &str,
        dac_user_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>>;

    /// Every vote of the given elections.
    async fn find_by_election_ids(&self, election_ids: &[String]) -> AppResult<Vec<vote::Model>>;
}

/// Shared vote store handle.
pub type SharedVoteStore = Arc<dyn VoteStore>;

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn active_model(model: vote::Model) -> vote::ActiveModel {
    vote::ActiveModel {
        id: Set(model.id),
        election_id: Set(model.election_id),
        dac_user_id: Set(model.dac_user_id),
        vote_type: Set(model.vote_type),
        vote: Set(model.vote),
        rationale: Set(model.rationale),
        has_concerns: Set(model.has_concerns),
        create_date: Set(model.create_date),
        update_date: Set(model.update_date),
        reminder_sent: Set(model.reminder_sent),
    }
}

#[async_trait]
impl VoteStore for VoteRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, model: vote::Model) -> AppResult<vote::Model> {
        active_model(model)
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, model: vote::Model) -> AppResult<vote::Model> {
        active_model(model)
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        Vote::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_by_election_ids(&self, election_ids: &[String]) -> AppResult<u64> {
        if election_ids.is_empty() {
            return Ok(0);
        }

        let result = Vote::delete_many()
            .filter(vote::Column::ElectionId.is_in(election_ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    async fn find_by_election(&self, election_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .order_by_asc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_election_and_type(
        &self,
        election_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .order_by_asc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_election_user_and_type(
        &self,
        election_id: &str,
        dac_user_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .filter(vote::Column::DacUserId.eq(dac_user_id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_election_ids(&self, election_ids: &[String]) -> AppResult<Vec<vote::Model>> {
        if election_ids.is_empty() {
            return Ok(vec![]);
        }

        Vote::find()
            .filter(vote::Column::ElectionId.is_in(election_ids.to_vec()))
            .order_by_asc(vote::Column::ElectionId)
            .order_by_asc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_vote(id: &str, user: &str, vote_type: VoteType) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            election_id: "e1".to_string(),
            dac_user_id: user.to_string(),
            vote_type,
            vote: None,
            rationale: None,
            has_concerns: None,
            create_date: None,
            update_date: None,
            reminder_sent: false,
        }
    }

    #[tokio::test]
    async fn test_find_by_election_and_type() {
        let v1 = create_test_vote("v1", "u1", VoteType::Dac);
        let v2 = create_test_vote("v2", "u2", VoteType::Dac);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let votes = repo
            .find_by_election_and_type("e1", VoteType::Dac)
            .await
            .unwrap();

        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|v| v.vote_type == VoteType::Dac));
    }

    #[tokio::test]
    async fn test_find_by_election_user_and_type_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let found = repo
            .find_by_election_user_and_type("e1", "u9", VoteType::Chairperson)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_by_election_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VoteRepository::new(db);
        let votes = repo.find_by_election_ids(&[]).await.unwrap();

        assert!(votes.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_election_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 6,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let deleted = repo
            .delete_by_election_ids(&["e1".to_string()])
            .await
            .unwrap();

        assert_eq!(deleted, 6);
    }
}
