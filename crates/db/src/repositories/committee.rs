//! Committee repository (users and roles).

use std::sync::Arc;

use async_trait::async_trait;
use dac_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{
    DacUser, UserRole, dac_user,
    user_role::{self, Role},
};

/// Storage contract for committee users and their roles.
#[async_trait]
pub trait CommitteeStore: Send + Sync {
    /// Find users by IDs. Missing ids are skipped.
    async fn find_users_by_ids(&self, ids: &[String]) -> AppResult<Vec<dac_user::Model>>;

    /// Roles held by a user.
    async fn find_roles(&self, user_id: &str) -> AppResult<Vec<Role>>;

    /// Users holding at least one of the given roles, ordered by id.
    async fn find_users_with_roles(&self, roles: &[Role]) -> AppResult<Vec<dac_user::Model>>;
}

/// Shared committee store handle.
pub type SharedCommitteeStore = Arc<dyn CommitteeStore>;

/// Committee repository for database operations.
#[derive(Clone)]
pub struct CommitteeRepository {
    db: Arc<DatabaseConnection>,
}

impl CommitteeRepository {
    /// Create a new committee repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommitteeStore for CommitteeRepository {
    async fn find_users_by_ids(&self, ids: &[String]) -> AppResult<Vec<dac_user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        DacUser::find()
            .filter(dac_user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_roles(&self, user_id: &str) -> AppResult<Vec<Role>> {
        let roles = UserRole::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(roles.into_iter().map(|r| r.role).collect())
    }

    async fn find_users_with_roles(&self, roles: &[Role]) -> AppResult<Vec<dac_user::Model>> {
        if roles.is_empty() {
            return Ok(vec![]);
        }

        let assignments = UserRole::find()
            .filter(user_role::Column::Role.is_in(roles.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut user_ids: Vec<String> = assignments.into_iter().map(|r| r.user_id).collect();
        user_ids.sort();
        user_ids.dedup();

        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        DacUser::find()
            .filter(dac_user::Column::Id.is_in(user_ids))
            .order_by_asc(dac_user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
