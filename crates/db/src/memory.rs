//! In-memory implementation of every store trait.
//!
//! Backs service tests without a database. Ordering follows the SQL
//! repositories: "newest" means latest `create_date`, with insertion order
//! breaking ties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dac_common::{AppError, AppResult, IdGenerator};
use serde_json::json;

use crate::entities::{
    access_rp, consent, dac_user, data_access_request, dataset, dataset_owner,
    election::{self, ElectionStatus, ElectionType},
    mail_message::{self, EmailType},
    user_role::{self, Role},
    vote::{self, VoteType},
};
use crate::repositories::{
    CommitteeStore, ConsentStore, DataAccessRequestStore, DatasetStore, ElectionStore,
    MailLogStore, VoteStore,
};

#[derive(Default)]
struct MemoryState {
    elections: Vec<election::Model>,
    votes: Vec<vote::Model>,
    links: Vec<access_rp::Model>,
    consents: HashMap<String, consent::Model>,
    dars: HashMap<String, data_access_request::Model>,
    datasets: Vec<dataset::Model>,
    owners: Vec<dataset_owner::Model>,
    users: Vec<dac_user::Model>,
    roles: Vec<user_role::Model>,
    mail: Vec<mail_message::Model>,
}

/// Shared in-memory state implementing all store traits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    id_gen: IdGenerator,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a committee user holding the given roles.
    pub fn add_user(&self, id: &str, roles: &[Role]) {
        let mut state = self.state();
        state.users.push(dac_user::Model {
            id: id.to_string(),
            display_name: format!("User {id}"),
            email: format!("{id}@example.org"),
            email_preference: roles.contains(&Role::Admin),
        });
        for role in roles {
            let role_id = self.id_gen.generate();
            state.roles.push(user_role::Model {
                id: role_id,
                user_id: id.to_string(),
                role: *role,
            });
        }
    }

    /// Add or replace a consent.
    pub fn put_consent(&self, model: consent::Model) {
        self.state().consents.insert(model.id.clone(), model);
    }

    /// Add or replace a DAR.
    pub fn put_dar(&self, model: data_access_request::Model) {
        self.state().dars.insert(model.id.clone(), model);
    }

    /// Add a dataset.
    pub fn put_dataset(&self, model: dataset::Model) {
        let mut state = self.state();
        state.datasets.retain(|d| d.id != model.id);
        state.datasets.push(model);
    }

    /// Make a user a data owner of a dataset.
    pub fn add_dataset_owner(&self, dataset_id: &str, user_id: &str) {
        let id = self.id_gen.generate();
        self.state().owners.push(dataset_owner::Model {
            id,
            dataset_id: dataset_id.to_string(),
            user_id: user_id.to_string(),
        });
    }

    /// Snapshot of every election, in insertion order.
    #[must_use]
    pub fn elections(&self) -> Vec<election::Model> {
        self.state().elections.clone()
    }

    /// Snapshot of every vote, in insertion order.
    #[must_use]
    pub fn votes(&self) -> Vec<vote::Model> {
        self.state().votes.clone()
    }

    /// Snapshot of the access/research purpose links.
    #[must_use]
    pub fn links(&self) -> Vec<access_rp::Model> {
        self.state().links.clone()
    }

    /// Snapshot of the sent-notification log.
    #[must_use]
    pub fn mail(&self) -> Vec<mail_message::Model> {
        self.state().mail.clone()
    }
}

/// Newest first by create date, later insertion winning ties.
fn newest_first(mut elections: Vec<(usize, election::Model)>) -> Vec<election::Model> {
    elections.sort_by(|(ia, a), (ib, b)| b.create_date.cmp(&a.create_date).then(ib.cmp(ia)));
    elections.into_iter().map(|(_, e)| e).collect()
}

fn matching_elections<F>(state: &MemoryState, predicate: F) -> Vec<(usize, election::Model)>
where
    F: Fn(&election::Model) -> bool,
{
    state
        .elections
        .iter()
        .enumerate()
        .filter(|(_, e)| predicate(e))
        .map(|(i, e)| (i, e.clone()))
        .collect()
}

/// Mirrors the partial unique index on open elections.
fn check_single_open(state: &MemoryState, model: &election::Model) -> AppResult<()> {
    let duplicate_open = model.status == ElectionStatus::Open
        && state.elections.iter().any(|e| {
            e.id != model.id
                && e.is_open()
                && e.reference_id == model.reference_id
                && e.election_type == model.election_type
                && e.dataset_id == model.dataset_id
        });
    if duplicate_open {
        return Err(AppError::Database(
            "duplicate key value violates unique constraint \"idx_election_single_open\""
                .to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ElectionStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<election::Model>> {
        Ok(self.state().elections.iter().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, model: election::Model) -> AppResult<election::Model> {
        let mut state = self.state();
        check_single_open(&state, &model)?;
        state.elections.push(model.clone());
        Ok(model)
    }

    async fn update(&self, model: election::Model) -> AppResult<election::Model> {
        let mut state = self.state();
        check_single_open(&state, &model)?;
        let slot = state
            .elections
            .iter_mut()
            .find(|e| e.id == model.id)
            .ok_or_else(|| AppError::Database(format!("election row missing: {}", model.id)))?;
        *slot = model.clone();
        Ok(model)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut state = self.state();
        state.elections.retain(|e| e.id != id);
        state.votes.retain(|v| v.election_id != id);
        state
            .links
            .retain(|l| l.election_access_id != id && l.election_rp_id != id);
        Ok(())
    }

    async fn find_open_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<election::Model>> {
        let state = self.state();
        let found = matching_elections(&state, |e| {
            e.is_open() && e.reference_id == reference_id && e.election_type == election_type
        });
        Ok(newest_first(found).into_iter().next())
    }

    async fn find_open_dataset_election(
        &self,
        reference_id: &str,
        dataset_id: &str,
    ) -> AppResult<Option<election::Model>> {
        let state = self.state();
        Ok(state
            .elections
            .iter()
            .find(|e| {
                e.is_open()
                    && e.reference_id == reference_id
                    && e.election_type == ElectionType::DataSet
                    && e.dataset_id.as_deref() == Some(dataset_id)
            })
            .cloned())
    }

    async fn find_last_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        status: Option<ElectionStatus>,
    ) -> AppResult<Option<election::Model>> {
        let state = self.state();
        let found = matching_elections(&state, |e| {
            e.reference_id == reference_id
                && e.election_type == election_type
                && status.is_none_or(|s| e.status == s)
        });
        Ok(newest_first(found).into_iter().next())
    }

    async fn find_by_reference_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Vec<election::Model>> {
        let state = self.state();
        let found = matching_elections(&state, |e| {
            e.reference_id == reference_id && e.election_type == election_type
        });
        Ok(newest_first(found))
    }

    async fn find_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>> {
        let state = self.state();
        let found = matching_elections(&state, |e| e.reference_id == reference_id);
        Ok(newest_first(found))
    }

    async fn find_open_by_reference(&self, reference_id: &str) -> AppResult<Vec<election::Model>> {
        Ok(self
            .state()
            .elections
            .iter()
            .filter(|e| e.is_open() && e.reference_id == reference_id)
            .cloned()
            .collect())
    }

    async fn find_by_type_and_status(
        &self,
        election_type: ElectionType,
        status: ElectionStatus,
    ) -> AppResult<Vec<election::Model>> {
        Ok(self
            .state()
            .elections
            .iter()
            .filter(|e| e.election_type == election_type && e.status == status)
            .cloned()
            .collect())
    }

    async fn find_open_created_before(
        &self,
        election_type: ElectionType,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<election::Model>> {
        Ok(self
            .state()
            .elections
            .iter()
            .filter(|e| {
                e.is_open() && e.election_type == election_type && e.create_date < cutoff
            })
            .cloned()
            .collect())
    }

    async fn count_open_by_reference(&self, reference_id: &str) -> AppResult<u64> {
        Ok(self
            .state()
            .elections
            .iter()
            .filter(|e| e.is_open() && e.reference_id == reference_id)
            .count() as u64)
    }

    async fn count_by_status(
        &self,
        status: ElectionStatus,
        election_type: Option<ElectionType>,
    ) -> AppResult<u64> {
        Ok(self
            .state()
            .elections
            .iter()
            .filter(|e| e.status == status && election_type.is_none_or(|t| e.election_type == t))
            .count() as u64)
    }

    async fn link_access_rp(
        &self,
        access_election_id: &str,
        rp_election_id: &str,
    ) -> AppResult<()> {
        let id = self.id_gen.generate();
        self.state().links.push(access_rp::Model {
            id,
            election_access_id: access_election_id.to_string(),
            election_rp_id: rp_election_id.to_string(),
        });
        Ok(())
    }

    async fn find_rp_id_by_access_id(
        &self,
        access_election_id: &str,
    ) -> AppResult<Option<String>> {
        Ok(self
            .state()
            .links
            .iter()
            .find(|l| l.election_access_id == access_election_id)
            .map(|l| l.election_rp_id.clone()))
    }

    async fn find_access_id_by_rp_id(&self, rp_election_id: &str) -> AppResult<Option<String>> {
        Ok(self
            .state()
            .links
            .iter()
            .find(|l| l.election_rp_id == rp_election_id)
            .map(|l| l.election_access_id.clone()))
    }

    async fn delete_access_rp(&self, access_election_id: &str) -> AppResult<()> {
        self.state()
            .links
            .retain(|l| l.election_access_id != access_election_id);
        Ok(())
    }
}

#[async_trait]
impl VoteStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        Ok(self.state().votes.iter().find(|v| v.id == id).cloned())
    }

    async fn insert(&self, model: vote::Model) -> AppResult<vote::Model> {
        self.state().votes.push(model.clone());
        Ok(model)
    }

    async fn update(&self, model: vote::Model) -> AppResult<vote::Model> {
        let mut state = self.state();
        let slot = state
            .votes
            .iter_mut()
            .find(|v| v.id == model.id)
            .ok_or_else(|| AppError::Database(format!("vote row missing: {}", model.id)))?;
        *slot = model.clone();
        Ok(model)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.state().votes.retain(|v| v.id != id);
        Ok(())
    }

    async fn delete_by_election_ids(&self, election_ids: &[String]) -> AppResult<u64> {
        let mut state = self.state();
        let before = state.votes.len();
        state.votes.retain(|v| !election_ids.contains(&v.election_id));
        Ok((before - state.votes.len()) as u64)
    }

    async fn find_by_election(&self, election_id: &str) -> AppResult<Vec<vote::Model>> {
        Ok(self
            .state()
            .votes
            .iter()
            .filter(|v| v.election_id == election_id)
            .cloned()
            .collect())
    }

    async fn find_by_election_and_type(
        &self,
        election_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Vec<vote::Model>> {
        Ok(self
            .state()
            .votes
            .iter()
            .filter(|v| v.election_id == election_id && v.vote_type == vote_type)
            .cloned()
            .collect())
    }

    async fn find_by_election_user_and_type(
        &self,
        election_id: &str,
        dac_user_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        Ok(self
            .state()
            .votes
            .iter()
            .find(|v| {
                v.election_id == election_id
                    && v.dac_user_id == dac_user_id
                    && v.vote_type == vote_type
            })
            .cloned())
    }

    async fn find_by_election_ids(&self, election_ids: &[String]) -> AppResult<Vec<vote::Model>> {
        Ok(self
            .state()
            .votes
            .iter()
            .filter(|v| election_ids.contains(&v.election_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConsentStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<consent::Model>> {
        Ok(self.state().consents.get(id).cloned())
    }

    async fn touch_sort_date(&self, ids: &[String], at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state();
        for id in ids {
            if let Some(consent) = state.consents.get_mut(id) {
                consent.sort_date = at.into();
                consent.last_update = Some(at.into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DataAccessRequestStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<data_access_request::Model>> {
        Ok(self.state().dars.get(id).cloned())
    }

    async fn update_dataset_ids(&self, id: &str, dataset_ids: &[String]) -> AppResult<()> {
        if let Some(dar) = self.state().dars.get_mut(id) {
            dar.dataset_ids = json!(dataset_ids);
        }
        Ok(())
    }

    async fn touch_sort_date(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(dar) = self.state().dars.get_mut(id) {
            dar.sort_date = at.into();
        }
        Ok(())
    }
}

#[async_trait]
impl DatasetStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<dataset::Model>> {
        Ok(self.state().datasets.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<dataset::Model>> {
        Ok(self
            .state()
            .datasets
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn find_owner_ids(&self, dataset_id: &str) -> AppResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .state()
            .owners
            .iter()
            .filter(|o| o.dataset_id == dataset_id)
            .map(|o| o.user_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CommitteeStore for InMemoryStore {
    async fn find_users_by_ids(&self, ids: &[String]) -> AppResult<Vec<dac_user::Model>> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_roles(&self, user_id: &str) -> AppResult<Vec<Role>> {
        Ok(self
            .state()
            .roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.role)
            .collect())
    }

    async fn find_users_with_roles(&self, roles: &[Role]) -> AppResult<Vec<dac_user::Model>> {
        let state = self.state();
        let mut users: Vec<dac_user::Model> = state
            .users
            .iter()
            .filter(|u| {
                state
                    .roles
                    .iter()
                    .any(|r| r.user_id == u.id && roles.contains(&r.role))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}

#[async_trait]
impl MailLogStore for InMemoryStore {
    async fn exists(&self, election_ids: &[String], email_type: EmailType) -> AppResult<bool> {
        Ok(self
            .state()
            .mail
            .iter()
            .any(|m| m.email_type == email_type && election_ids.contains(&m.election_id)))
    }

    async fn record(
        &self,
        election_id: &str,
        reference_id: &str,
        email_type: EmailType,
    ) -> AppResult<mail_message::Model> {
        let model = mail_message::Model {
            id: self.id_gen.generate(),
            election_id: election_id.to_string(),
            reference_id: reference_id.to_string(),
            email_type,
            create_date: Utc::now().into(),
        };
        self.state().mail.push(model.clone());
        Ok(model)
    }
}
