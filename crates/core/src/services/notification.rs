//! Notification sink.
//!
//! Election and vote transitions fire notifications through this trait. The
//! delivery mechanism (email templates, queues) lives outside the core;
//! delivery failures are logged by the caller and never roll back state.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dac_common::AppResult;
use dac_db::entities::{dac_user, election, vote};

/// Trait for sending committee notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Every required vote is in; the chairperson should collect the decision.
    async fn send_collect_message(&self, election_id: &str) -> AppResult<()>;

    /// Remind the voter owning this vote.
    async fn send_reminder_message(&self, vote_id: &str) -> AppResult<()>;

    /// A new case was opened for these voters.
    async fn send_new_case_message_to_list(
        &self,
        votes: &[vote::Model],
        election: &election::Model,
    ) -> AppResult<()>;

    /// Some or all datasets of a DAR were disabled when its election opened.
    async fn send_disabled_datasets_message(
        &self,
        user_id: &str,
        dataset_ids: &[String],
        dar_code: &str,
    ) -> AppResult<()>;

    /// A DAR touching datasets that need owner approval was approved.
    ///
    /// `owner_datasets` maps each data owner id to the dataset ids they own.
    async fn send_admin_flagged_dar_approved(
        &self,
        dar_code: &str,
        admins: &[dac_user::Model],
        owner_datasets: &BTreeMap<String, Vec<String>>,
    ) -> AppResult<()>;

    /// Ask data owners to review a DAR against their datasets.
    async fn send_needs_approval_message(
        &self,
        owner_datasets: &BTreeMap<String, Vec<String>>,
        dar_code: &str,
    ) -> AppResult<()>;

    /// Every data owner election of a DAR is closed.
    async fn send_closed_dataset_elections_message(
        &self,
        elections: &[election::Model],
    ) -> AppResult<()>;
}

/// A no-op implementation of `NotificationSink` for when mail is disabled.
#[derive(Clone, Default)]
pub struct NoOpNotificationSink;

#[async_trait]
impl NotificationSink for NoOpNotificationSink {
    async fn send_collect_message(&self, _election_id: &str) -> AppResult<()> {
        Ok(())
    }

    async fn send_reminder_message(&self, _vote_id: &str) -> AppResult<()> {
        Ok(())
    }

    async fn send_new_case_message_to_list(
        &self,
        _votes: &[vote::Model],
        _election: &election::Model,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn send_disabled_datasets_message(
        &self,
        _user_id: &str,
        _dataset_ids: &[String],
        _dar_code: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn send_admin_flagged_dar_approved(
        &self,
        _dar_code: &str,
        _admins: &[dac_user::Model],
        _owner_datasets: &BTreeMap<String, Vec<String>>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn send_needs_approval_message(
        &self,
        _owner_datasets: &BTreeMap<String, Vec<String>>,
        _dar_code: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn send_closed_dataset_elections_message(
        &self,
        _elections: &[election::Model],
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for shared `NotificationSink` trait object.
pub type NotificationSinkService = Arc<dyn NotificationSink>;

/// Log a failed notification and carry on.
pub(crate) fn log_failure(kind: &str, result: AppResult<()>) {
    if let Err(e) = result {
        tracing::warn!(notification = kind, error = %e, "Notification failed");
    }
}
