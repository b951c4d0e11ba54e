//! Committee directory.

use dac_common::AppResult;
use dac_db::{
    entities::{dac_user, user_role::Role},
    repositories::SharedCommitteeStore,
};

/// Read-side view of the committee: who votes, who chairs, who owns data.
#[derive(Clone)]
pub struct CommitteeDirectory {
    store: SharedCommitteeStore,
}

impl CommitteeDirectory {
    /// Create a new committee directory.
    #[must_use]
    pub const fn new(store: SharedCommitteeStore) -> Self {
        Self { store }
    }

    /// Users enabled to vote (chairpersons and members), ordered by id.
    pub async fn voting_members(&self) -> AppResult<Vec<dac_user::Model>> {
        self.store
            .find_users_with_roles(&[Role::Chairperson, Role::Member])
            .await
    }

    /// Users holding the chairperson role.
    pub async fn chairpersons(&self) -> AppResult<Vec<dac_user::Model>> {
        self.store.find_users_with_roles(&[Role::Chairperson]).await
    }

    pub async fn is_chairperson(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.store.find_roles(user_id).await?.contains(&Role::Chairperson))
    }

    pub async fn is_data_owner(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.store.find_roles(user_id).await?.contains(&Role::DataOwner))
    }

    /// Admins who opted in to notification mail.
    pub async fn admins_wanting_mail(&self) -> AppResult<Vec<dac_user::Model>> {
        let admins = self.store.find_users_with_roles(&[Role::Admin]).await?;
        Ok(admins.into_iter().filter(|u| u.email_preference).collect())
    }

    pub async fn find_users(&self, user_ids: &[String]) -> AppResult<Vec<dac_user::Model>> {
        self.store.find_users_by_ids(user_ids).await
    }
}
