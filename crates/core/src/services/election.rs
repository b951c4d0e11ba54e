//! Election service.
//!
//! The election state machine: opening elections under the committee and
//! reference preconditions, status transitions with pair cascades, data owner
//! approval tallies, and the vote-completion predicates behind the collect
//! notifications.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use dac_common::{AppError, AppResult, ElectionConfig, IdGenerator};
use dac_db::{
    entities::{
        data_access_request,
        election::{self, ElectionStatus, ElectionType},
        mail_message::EmailType,
        vote::{self, VoteType},
    },
    repositories::{SharedElectionStore, SharedMailLogStore, SharedVoteStore},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    committee::CommitteeDirectory,
    notification::{self, NotificationSinkService},
    reference::{Reference, ReferenceResolver},
};

const INACTIVE_DATASETS: &str = "Election was not created. The following DataSets are disabled : ";
const DUL_NOT_APPROVED: &str =
    "The Data Use Limitation Election related to this Dataset has not been approved yet.";
const NO_QUORUM: &str = "There has to be a Chairperson and at least 4 Members cataloged in the system to create an election.";
const NO_CHAIRPERSON: &str = "There has to be a Chairperson.";
const ELECTION_NOT_FOUND: &str = "Election for specified id does not exist";

/// Optional fields supplied when opening an election.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateElectionInput {
    /// Initial status; OPEN when absent.
    #[validate(length(min = 1, max = 16))]
    pub status: Option<String>,
    /// Dataset under review, required for `DataSet` elections.
    pub dataset_id: Option<String>,
}

/// Fields accepted by `update_election_by_id`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElectionInput {
    #[validate(length(min = 1, max = 16))]
    pub status: Option<String>,
    /// Chairperson decision, recorded on the CHAIRPERSON vote as well.
    pub final_vote: Option<bool>,
    #[validate(length(max = 4096))]
    pub final_rationale: Option<String>,
    pub final_access_vote: Option<bool>,
}

/// One row of an election status history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionStatusRow {
    pub election_id: String,
    pub create_date: DateTime<Utc>,
    pub status: ElectionStatus,
    pub election_type: &'static str,
}

/// A closed election with the label of what it reviewed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedElection {
    pub election: election::Model,
    /// Consent name or DAR code; `None` when the reference is gone.
    pub display_id: Option<String>,
}

/// Data owner approval state of a DAR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetElectionStatus {
    ApprovalNotNeeded,
    DsPending,
    DsDenied,
    DsApproved,
}

/// Election service for business logic.
#[derive(Clone)]
pub struct ElectionService {
    elections: SharedElectionStore,
    votes: SharedVoteStore,
    mail_log: SharedMailLogStore,
    references: ReferenceResolver,
    committee: CommitteeDirectory,
    notifier: NotificationSinkService,
    config: ElectionConfig,
    id_gen: IdGenerator,
}

impl ElectionService {
    /// Create a new election service.
    #[must_use]
    pub const fn new(
        elections: SharedElectionStore,
        votes: SharedVoteStore,
        mail_log: SharedMailLogStore,
        references: ReferenceResolver,
        committee: CommitteeDirectory,
        notifier: NotificationSinkService,
        config: ElectionConfig,
    ) -> Self {
        Self {
            elections,
            votes,
            mail_log,
            references,
            committee,
            notifier,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open an election on a reference.
    ///
    /// Preconditions are checked in order and the first failure wins: data
    /// access requirements, committee quorum (all types but `DataSet`),
    /// reference existence, no open election, and a recognized status.
    pub async fn create_election(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        input: CreateElectionInput,
    ) -> AppResult<election::Model> {
        input.validate()?;

        if election_type == ElectionType::DataAccess {
            self.validate_data_access_request(reference_id).await?;
        }
        if election_type != ElectionType::DataSet {
            self.validate_quorum().await?;
        }

        let reference = self
            .references
            .resolve(reference_id, election_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invalid id: {reference_id}")))?;

        let dataset_id = if election_type == ElectionType::DataSet {
            Some(input.dataset_id.clone().ok_or_else(|| {
                AppError::InvalidArgument("A Data Set election requires a dataset id".to_string())
            })?)
        } else {
            None
        };
        self.validate_no_open_election(reference_id, election_type, dataset_id.as_deref())
            .await?;

        let status = match input.status.as_deref() {
            Some(value) => parse_status(value)?,
            None => ElectionStatus::Open,
        };

        let now = Utc::now();
        let model = election::Model {
            id: self.id_gen.generate(),
            election_type,
            status,
            reference_id: reference_id.to_string(),
            dataset_id,
            create_date: now.into(),
            last_update: None,
            final_vote: None,
            final_vote_date: None,
            final_rationale: None,
            final_access_vote: None,
            use_restriction: snapshot_restriction(&reference, election_type),
            translated_use_restriction: snapshot_translation(&reference, election_type),
        };
        let election = self.elections.insert(model).await?;
        self.touch_sort_date(reference_id, election_type, now).await;

        if election_type == ElectionType::Rp
            && let Err(e) = self.link_to_access_election(&election).await
        {
            if let Err(cleanup) = self.elections.delete(&election.id).await {
                tracing::error!(
                    election_id = %election.id,
                    error = %cleanup,
                    "Failed to drop unlinked election"
                );
            }
            return Err(e);
        }

        tracing::info!(
            election_id = %election.id,
            reference_id = reference_id,
            election_type = ?election_type,
            "Election created"
        );
        Ok(election)
    }

    /// The DAR must exist, keep at least one active dataset, and sit under
    /// a consent whose latest DUL election was approved.
    async fn validate_data_access_request(&self, dar_id: &str) -> AppResult<()> {
        let dar = self
            .references
            .dar(dar_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Data Access Request not found: {dar_id}")))?;

        self.drop_disabled_datasets(&dar).await?;

        let datasets = self.references.datasets_of(&dar).await?;
        let Some(first) = datasets.iter().find(|d| d.active) else {
            return Err(AppError::InvalidArgument(DUL_NOT_APPROVED.to_string()));
        };
        if !self.consent_is_approved(&first.consent_id).await? {
            return Err(AppError::InvalidArgument(DUL_NOT_APPROVED.to_string()));
        }
        Ok(())
    }

    /// Rewrite the DAR without its disabled datasets, or fail when none
    /// remain. The requester is notified either way.
    async fn drop_disabled_datasets(&self, dar: &data_access_request::Model) -> AppResult<()> {
        let datasets = self.references.datasets_of(dar).await?;
        let disabled: Vec<String> = datasets
            .iter()
            .filter(|d| !d.active)
            .map(|d| d.id.clone())
            .collect();
        if disabled.is_empty() {
            return Ok(());
        }

        notification::log_failure(
            "disabled_datasets",
            self.notifier
                .send_disabled_datasets_message(&dar.user_id, &disabled, &dar.dar_code)
                .await,
        );

        if disabled.len() == datasets.len() {
            return Err(AppError::InvalidArgument(format!(
                "{INACTIVE_DATASETS}{disabled:?}"
            )));
        }

        let active: Vec<String> = datasets
            .iter()
            .filter(|d| d.active)
            .map(|d| d.id.clone())
            .collect();
        self.references.rewrite_dar_datasets(&dar.id, &active).await?;
        tracing::warn!(
            dar_id = %dar.id,
            disabled = ?disabled,
            "Disabled datasets removed from data access request"
        );
        Ok(())
    }

    async fn consent_is_approved(&self, consent_id: &str) -> AppResult<bool> {
        let Some(last_closed) = self
            .elections
            .find_last_by_reference_and_type(
                consent_id,
                ElectionType::TranslateDul,
                Some(ElectionStatus::Closed),
            )
            .await?
        else {
            return Ok(false);
        };
        if self.elections.count_open_by_reference(consent_id).await? != 0 {
            return Ok(false);
        }

        let chair_vote = self
            .votes
            .find_by_election_and_type(&last_closed.id, VoteType::Chairperson)
            .await?
            .into_iter()
            .next();
        let decision = chair_vote
            .and_then(|v| v.vote)
            .or(last_closed.final_vote);
        Ok(decision == Some(true))
    }

    async fn validate_quorum(&self) -> AppResult<()> {
        let members = self.committee.voting_members().await?;
        if members.len() < self.config.min_voting_members {
            return Err(AppError::InvalidArgument(NO_QUORUM.to_string()));
        }
        if self.committee.chairpersons().await?.is_empty() {
            return Err(AppError::InvalidArgument(NO_CHAIRPERSON.to_string()));
        }
        Ok(())
    }

    async fn validate_no_open_election(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        dataset_id: Option<&str>,
    ) -> AppResult<()> {
        let existing = match dataset_id {
            Some(dataset_id) => {
                self.elections
                    .find_open_dataset_election(reference_id, dataset_id)
                    .await?
            }
            None => {
                self.elections
                    .find_open_by_reference_and_type(reference_id, election_type)
                    .await?
            }
        };
        if let Some(existing) = existing {
            return Err(AppError::Conflict(format!(
                "An open election already exists for the specified id. Election id: {}",
                existing.id
            )));
        }
        Ok(())
    }

    async fn link_to_access_election(&self, rp: &election::Model) -> AppResult<()> {
        let Some(access) = self
            .elections
            .find_open_by_reference_and_type(&rp.reference_id, ElectionType::DataAccess)
            .await?
        else {
            tracing::warn!(
                election_id = %rp.id,
                reference_id = %rp.reference_id,
                "Research purpose election opened without a data access election"
            );
            return Ok(());
        };
        self.elections.link_access_rp(&access.id, &rp.id).await
    }

    /// Sort-date touches are idempotent side effects; a failure is logged.
    async fn touch_sort_date(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        at: DateTime<Utc>,
    ) {
        if let Err(e) = self
            .references
            .touch_sort_date(reference_id, election_type, at)
            .await
        {
            tracing::warn!(reference_id = reference_id, error = %e, "Failed to touch sort date");
        }
    }

    async fn get_election(&self, election_id: &str) -> AppResult<election::Model> {
        self.elections
            .find_by_id(election_id)
            .await?
            .ok_or_else(|| AppError::NotFound(ELECTION_NOT_FOUND.to_string()))
    }

    /// Apply a status change and optional decision to an election.
    ///
    /// A missing status means OPEN. Reopening fails with a conflict when
    /// another election on the same reference is already open. CLOSED and
    /// FINAL stamp the final vote date; CANCELED and CLOSED cascade to the
    /// paired access/RP election. The election row is saved before the
    /// chair vote and the pair are touched.
    pub async fn update_election_by_id(
        &self,
        election_id: &str,
        input: UpdateElectionInput,
    ) -> AppResult<election::Model> {
        input.validate()?;
        let status = match input.status.as_deref() {
            Some(value) => parse_status(value)?,
            None => ElectionStatus::Open,
        };
        let mut election = self.get_election(election_id).await?;
        if status == ElectionStatus::Open && !election.is_open() {
            self.validate_no_open_election(
                &election.reference_id,
                election.election_type,
                election.dataset_id.as_deref(),
            )
            .await?;
        }
        let now = Utc::now();

        if matches!(status, ElectionStatus::Closed | ElectionStatus::Final) {
            election.final_vote_date = Some(now.into());
        }
        let decision = input.final_vote.map(|decision| {
            let rationale = input.final_rationale.filter(|r| !r.trim().is_empty());
            election.final_vote = Some(decision);
            election.final_rationale.clone_from(&rationale);
            if election.final_vote_date.is_none() {
                election.final_vote_date = Some(now.into());
            }
            (decision, rationale)
        });
        if input.final_access_vote.is_some() {
            election.final_access_vote = input.final_access_vote;
        }

        election.status = status;
        election.last_update = Some(now.into());
        let election = self.elections.update(election).await?;

        if let Some((decision, rationale)) = decision {
            self.record_chair_decision(&election.id, decision, rationale, now)
                .await?;
        }
        if matches!(status, ElectionStatus::Canceled | ElectionStatus::Closed) {
            self.cascade_to_pair(&election, status, now).await?;
        }
        self.touch_sort_date(&election.reference_id, election.election_type, now)
            .await;

        tracing::info!(election_id = election_id, status = ?status, "Election updated");
        Ok(election)
    }

    /// Close an election with the chairperson's decision.
    ///
    /// Writes the decision to the CHAIRPERSON vote and to the election row.
    pub async fn close_election_with_decision(
        &self,
        election_id: &str,
        decision: bool,
        rationale: Option<String>,
    ) -> AppResult<election::Model> {
        self.update_election_by_id(
            election_id,
            UpdateElectionInput {
                status: Some("Closed".to_string()),
                final_vote: Some(decision),
                final_rationale: rationale,
                final_access_vote: None,
            },
        )
        .await
    }

    async fn record_chair_decision(
        &self,
        election_id: &str,
        decision: bool,
        rationale: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let chair_vote = self
            .votes
            .find_by_election_and_type(election_id, VoteType::Chairperson)
            .await?
            .into_iter()
            .next();
        if let Some(mut vote) = chair_vote {
            vote.vote = Some(decision);
            vote.rationale = rationale;
            vote.create_date = Some(at.into());
            vote.update_date = Some(at.into());
            self.votes.update(vote).await?;
        }
        Ok(())
    }

    async fn paired_election_id(&self, election: &election::Model) -> AppResult<Option<String>> {
        match election.election_type {
            ElectionType::DataAccess => self.elections.find_rp_id_by_access_id(&election.id).await,
            ElectionType::Rp => self.elections.find_access_id_by_rp_id(&election.id).await,
            ElectionType::TranslateDul | ElectionType::DataSet => Ok(None),
        }
    }

    async fn cascade_to_pair(
        &self,
        election: &election::Model,
        status: ElectionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let Some(pair_id) = self.paired_election_id(election).await? else {
            return Ok(());
        };
        if let Some(mut pair) = self.elections.find_by_id(&pair_id).await?
            && pair.status != status
        {
            pair.status = status;
            pair.last_update = Some(at.into());
            self.elections.update(pair).await?;
            tracing::debug!(election_id = %pair_id, status = ?status, "Paired election updated");
        }
        Ok(())
    }

    /// Record the final access decision on a data access election and move
    /// it, with its research purpose pair, to FINAL.
    pub async fn update_final_access_vote(
        &self,
        election_id: &str,
        approved: bool,
    ) -> AppResult<election::Model> {
        let mut election = self.get_election(election_id).await?;
        if election.election_type != ElectionType::DataAccess {
            return Err(AppError::InvalidArgument(
                "Final access decisions apply to Data Access elections only".to_string(),
            ));
        }

        let now = Utc::now();
        election.final_access_vote = Some(approved);
        election.status = ElectionStatus::Final;
        election.last_update = Some(now.into());
        if election.final_vote_date.is_none() {
            election.final_vote_date = Some(now.into());
        }
        let election = self.elections.update(election).await?;

        if let Some(rp_id) = self.elections.find_rp_id_by_access_id(&election.id).await?
            && let Some(mut rp) = self.elections.find_by_id(&rp_id).await?
        {
            rp.status = ElectionStatus::Final;
            rp.last_update = Some(now.into());
            self.elections.update(rp).await?;
        }
        self.touch_sort_date(&election.reference_id, election.election_type, now)
            .await;

        tracing::info!(election_id = election_id, approved = approved, "Final access vote recorded");
        Ok(election)
    }

    /// Tally the data owner votes and close the election.
    ///
    /// Access is granted unless some owner denied or flagged concerns.
    pub async fn close_data_owner_approval_election(
        &self,
        election_id: &str,
    ) -> AppResult<election::Model> {
        let mut election = self.get_election(election_id).await?;
        let owner_votes = self
            .votes
            .find_by_election_and_type(election_id, VoteType::DataOwner)
            .await?;
        let rejected = owner_votes
            .iter()
            .any(|v| v.vote == Some(false) || v.has_concerns == Some(true));

        election.final_access_vote = Some(!rejected);
        election.status = ElectionStatus::Closed;
        election.last_update = Some(Utc::now().into());
        let election = self.elections.update(election).await?;

        tracing::info!(
            election_id = election_id,
            approved = !rejected,
            "Data owner election closed"
        );
        notification::log_failure(
            "closed_dataset_elections",
            self.notify_if_dataset_elections_closed(&election.reference_id)
                .await,
        );
        Ok(election)
    }

    /// Latest `DataSet` election per dataset of a reference.
    async fn latest_dataset_elections(&self, reference_id: &str) -> AppResult<Vec<election::Model>> {
        let all = self
            .elections
            .find_by_reference_and_type(reference_id, ElectionType::DataSet)
            .await?;
        let mut seen = BTreeSet::new();
        Ok(all
            .into_iter()
            .filter(|e| seen.insert(e.dataset_id.clone()))
            .collect())
    }

    async fn notify_if_dataset_elections_closed(&self, reference_id: &str) -> AppResult<()> {
        let latest = self.latest_dataset_elections(reference_id).await?;
        if latest.iter().any(|e| e.status != ElectionStatus::Closed) {
            return Ok(());
        }
        let access = self
            .elections
            .find_last_by_reference_and_type(reference_id, ElectionType::DataAccess, None)
            .await?;
        let elections: Vec<election::Model> = access.into_iter().collect();
        self.notifier
            .send_closed_dataset_elections_message(&elections)
            .await
    }

    /// Whether a data owner election has no uncast DATA_OWNER votes left.
    pub async fn check_data_owner_to_close_election(&self, election_id: &str) -> AppResult<bool> {
        let election = self.get_election(election_id).await?;
        if election.election_type != ElectionType::DataSet {
            return Ok(false);
        }
        let owner_votes = self
            .votes
            .find_by_election_and_type(election_id, VoteType::DataOwner)
            .await?;
        Ok(owner_votes.iter().all(vote::Model::is_cast))
    }

    /// Cancel every open DUL election and open a fresh one per consent.
    ///
    /// Returns the new elections; votes are not created here.
    pub async fn cancel_open_election_and_reopen(&self) -> AppResult<Vec<election::Model>> {
        let open = self
            .elections
            .find_by_type_and_status(ElectionType::TranslateDul, ElectionStatus::Open)
            .await?;
        if open.is_empty() {
            return Ok(vec![]);
        }

        let now = Utc::now();
        let mut consent_ids = Vec::new();
        for mut election in open {
            if !consent_ids.contains(&election.reference_id) {
                consent_ids.push(election.reference_id.clone());
            }
            election.status = ElectionStatus::Canceled;
            election.last_update = Some(now.into());
            self.elections.update(election).await?;
        }
        if let Err(e) = self.references.touch_consents(&consent_ids, now).await {
            tracing::warn!(error = %e, "Failed to touch consent sort dates");
        }

        let mut reopened = Vec::with_capacity(consent_ids.len());
        for consent_id in &consent_ids {
            reopened.push(
                self.create_election(
                    consent_id,
                    ElectionType::TranslateDul,
                    CreateElectionInput::default(),
                )
                .await?,
            );
        }
        tracing::info!(count = reopened.len(), "Open DUL elections canceled and reopened");
        Ok(reopened)
    }

    async fn pending_dac_votes(&self, election_id: &str) -> AppResult<Vec<vote::Model>> {
        Ok(self
            .votes
            .find_by_election_and_type(election_id, VoteType::Dac)
            .await?
            .into_iter()
            .filter(|v| !v.is_cast())
            .collect())
    }

    /// Whether the vote just cast makes it time to collect the decision.
    ///
    /// True when no DAC vote is pending, or when the only pending one
    /// belongs to a chairperson who has not cast the CHAIRPERSON vote.
    pub async fn validate_collect_email_condition(&self, vote: &vote::Model) -> AppResult<bool> {
        let pending = self.pending_dac_votes(&vote.election_id).await?;
        match pending.as_slice() {
            [] => Ok(true),
            [remaining] => {
                if !self.committee.is_chairperson(&remaining.dac_user_id).await? {
                    return Ok(false);
                }
                let chair_vote = self
                    .votes
                    .find_by_election_user_and_type(
                        &vote.election_id,
                        &remaining.dac_user_id,
                        VoteType::Chairperson,
                    )
                    .await?;
                Ok(chair_vote.is_none_or(|v| !v.is_cast()))
            }
            _ => Ok(false),
        }
    }

    /// Collect check across a data access election and its research
    /// purpose pair. Only fires once per pair.
    pub async fn validate_collect_dar_email_condition(
        &self,
        vote: &vote::Model,
    ) -> AppResult<bool> {
        let election = self.get_election(&vote.election_id).await?;
        let (access_id, rp_id) = match election.election_type {
            ElectionType::Rp => (
                self.elections.find_access_id_by_rp_id(&election.id).await?,
                Some(election.id.clone()),
            ),
            _ => (
                Some(election.id.clone()),
                self.elections.find_rp_id_by_access_id(&election.id).await?,
            ),
        };
        let pair_ids: Vec<String> = access_id.iter().chain(rp_id.iter()).cloned().collect();
        if self.mail_log.exists(&pair_ids, EmailType::Collect).await? {
            return Ok(false);
        }

        let access_pending = match &access_id {
            Some(id) => self.pending_dac_votes(id).await?.len(),
            None => 0,
        };
        let rp_pending = match &rp_id {
            Some(id) => self.pending_dac_votes(id).await?.len(),
            None => 0,
        };
        let chair_ids: Vec<String> = self
            .committee
            .chairpersons()
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();

        match (access_pending, rp_pending) {
            (0, 0) => Ok(!chair_ids.contains(&vote.dac_user_id)),
            (0, 1) => self.chair_votes_uncast(rp_id.as_deref(), &chair_ids).await,
            (1, 0) => self.chair_votes_uncast(access_id.as_deref(), &chair_ids).await,
            (1, 1) => Ok(self
                .chair_votes_uncast(access_id.as_deref(), &chair_ids)
                .await?
                && self.chair_votes_uncast(rp_id.as_deref(), &chair_ids).await?),
            _ => Ok(false),
        }
    }

    async fn chair_votes_uncast(
        &self,
        election_id: Option<&str>,
        chair_ids: &[String],
    ) -> AppResult<bool> {
        let Some(election_id) = election_id else {
            return Ok(true);
        };
        let votes = self.votes.find_by_election(election_id).await?;
        Ok(votes
            .iter()
            .filter(|v| chair_ids.contains(&v.dac_user_id))
            .all(|v| !v.is_cast()))
    }

    /// Open one data owner election per distinct dataset that has none open.
    ///
    /// `owner_datasets` maps each owner id to the dataset ids they own.
    pub async fn create_data_set_elections(
        &self,
        reference_id: &str,
        owner_datasets: &BTreeMap<String, Vec<String>>,
    ) -> AppResult<Vec<election::Model>> {
        let dataset_ids: BTreeSet<&String> = owner_datasets.values().flatten().collect();
        let mut created = Vec::new();
        for dataset_id in dataset_ids {
            if self
                .elections
                .find_open_dataset_election(reference_id, dataset_id)
                .await?
                .is_some()
            {
                continue;
            }
            let model = election::Model {
                id: self.id_gen.generate(),
                election_type: ElectionType::DataSet,
                status: ElectionStatus::Open,
                reference_id: reference_id.to_string(),
                dataset_id: Some(dataset_id.clone()),
                create_date: Utc::now().into(),
                last_update: None,
                final_vote: None,
                final_vote_date: None,
                final_rationale: None,
                final_access_vote: None,
                use_restriction: None,
                translated_use_restriction: None,
            };
            created.push(self.elections.insert(model).await?);
        }
        if !created.is_empty() {
            tracing::info!(
                reference_id = reference_id,
                count = created.len(),
                "Data owner elections created"
            );
        }
        Ok(created)
    }

    pub async fn is_data_set_election_open(&self) -> AppResult<bool> {
        Ok(self
            .elections
            .count_by_status(ElectionStatus::Open, Some(ElectionType::DataSet))
            .await?
            > 0)
    }

    /// Data owner approval state of a DAR.
    pub async fn dar_dataset_election_status(
        &self,
        dar_id: &str,
    ) -> AppResult<DatasetElectionStatus> {
        let dar = self
            .references
            .dar(dar_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Data Access Request not found: {dar_id}")))?;
        let datasets = self.references.datasets_of(&dar).await?;
        if !datasets.iter().any(|d| d.needs_approval) {
            return Ok(DatasetElectionStatus::ApprovalNotNeeded);
        }

        let open_access = self
            .elections
            .find_open_by_reference_and_type(dar_id, ElectionType::DataAccess)
            .await?;
        let dataset_elections = self.latest_dataset_elections(dar_id).await?;
        if open_access.is_some()
            || dataset_elections.is_empty()
            || dataset_elections.iter().any(election::Model::is_open)
        {
            return Ok(DatasetElectionStatus::DsPending);
        }
        if dataset_elections
            .iter()
            .any(|e| e.final_access_vote == Some(false))
        {
            return Ok(DatasetElectionStatus::DsDenied);
        }
        Ok(DatasetElectionStatus::DsApproved)
    }

    /// Open elections of a type created more than `days` ago.
    pub async fn find_expired_elections(
        &self,
        election_type: ElectionType,
        days: i64,
    ) -> AppResult<Vec<election::Model>> {
        let cutoff = Utc::now() - Duration::days(days);
        self.elections
            .find_open_created_before(election_type, cutoff)
            .await
    }

    pub async fn describe_election_by_id(&self, election_id: &str) -> AppResult<election::Model> {
        self.get_election(election_id).await
    }

    /// The open DUL election of a consent.
    pub async fn describe_consent_election(&self, consent_id: &str) -> AppResult<election::Model> {
        if self.references.consent(consent_id).await?.is_none() {
            return Err(AppError::NotFound("Invalid ConsentId".to_string()));
        }
        self.elections
            .find_open_by_reference_and_type(consent_id, ElectionType::TranslateDul)
            .await?
            .ok_or_else(|| AppError::NotFound("Election was not found".to_string()))
    }

    /// The open data access election of a DAR, else its open RP election.
    pub async fn describe_data_request_election(&self, dar_id: &str) -> AppResult<election::Model> {
        if let Some(access) = self
            .elections
            .find_open_by_reference_and_type(dar_id, ElectionType::DataAccess)
            .await?
        {
            return Ok(access);
        }
        self.elections
            .find_open_by_reference_and_type(dar_id, ElectionType::Rp)
            .await?
            .ok_or_else(|| AppError::NotFound("Election was not found".to_string()))
    }

    /// Delete an election. A data access election takes its RP pair with it.
    pub async fn delete_election(&self, reference_id: &str, election_id: &str) -> AppResult<()> {
        let election = self.get_election(election_id).await?;
        if election.reference_id != reference_id {
            return Err(AppError::NotFound(format!(
                "Does not exist an election for the specified id: {reference_id}"
            )));
        }

        if election.election_type == ElectionType::DataAccess {
            let rp_id = self.elections.find_rp_id_by_access_id(election_id).await?;
            self.elections.delete_access_rp(election_id).await?;
            if let Some(rp_id) = rp_id {
                self.elections.delete(&rp_id).await?;
            }
        }
        self.elections.delete(election_id).await?;
        tracing::info!(election_id = election_id, reference_id = reference_id, "Election deleted");
        Ok(())
    }

    pub async fn describe_elections_by_consent_id(
        &self,
        consent_id: &str,
    ) -> AppResult<Vec<ElectionStatusRow>> {
        let elections = self.elections.find_by_reference(consent_id).await?;
        Ok(elections.iter().map(status_row).collect())
    }

    pub async fn describe_elections_by_dar(&self, dar_id: &str) -> AppResult<Vec<ElectionStatusRow>> {
        let elections = self.elections.find_by_reference(dar_id).await?;
        Ok(elections
            .iter()
            .filter(|e| e.election_type == ElectionType::DataAccess)
            .map(status_row)
            .collect())
    }

    pub async fn describe_closed_elections_by_type(
        &self,
        election_type: ElectionType,
    ) -> AppResult<Vec<ClosedElection>> {
        let elections = self
            .elections
            .find_by_type_and_status(election_type, ElectionStatus::Closed)
            .await?;
        let mut closed = Vec::with_capacity(elections.len());
        for election in elections {
            let display_id = self
                .references
                .resolve(&election.reference_id, election_type)
                .await?
                .map(|r| r.display_id().to_string());
            closed.push(ClosedElection {
                election,
                display_id,
            });
        }
        Ok(closed)
    }

    pub async fn find_rp_election_by_access_id(
        &self,
        access_election_id: &str,
    ) -> AppResult<Option<String>> {
        self.elections.find_rp_id_by_access_id(access_election_id).await
    }

    pub async fn find_access_election_by_rp_id(
        &self,
        rp_election_id: &str,
    ) -> AppResult<Option<String>> {
        self.elections.find_access_id_by_rp_id(rp_election_id).await
    }
}

fn parse_status(value: &str) -> AppResult<ElectionStatus> {
    ElectionStatus::parse(value).ok_or_else(|| {
        AppError::InvalidArgument(format!(
            "Invalid value. Valid status are: {}",
            ElectionStatus::valid_values()
        ))
    })
}

/// `DataSet` elections carry no restriction of their own.
fn snapshot_restriction(
    reference: &Reference,
    election_type: ElectionType,
) -> Option<serde_json::Value> {
    match election_type {
        ElectionType::DataSet => None,
        _ => reference.use_restriction(),
    }
}

fn snapshot_translation(reference: &Reference, election_type: ElectionType) -> Option<String> {
    match election_type {
        ElectionType::DataSet => None,
        _ => reference.translated_use_restriction(),
    }
}

fn status_row(election: &election::Model) -> ElectionStatusRow {
    ElectionStatusRow {
        election_id: election.id.clone(),
        create_date: election.create_date.with_timezone(&Utc),
        status: election.status,
        election_type: election.election_type.label(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::notification::recording::RecordingNotificationSink;
    use crate::services::testing::{
        World, cast, consent_model, dar_model, dataset_model, election_model, vote_model,
    };
    use dac_db::entities::dataset;
    use dac_db::repositories::{ElectionStore, MailLogStore};
    use maplit::btreemap;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_consent_election_snapshots_restriction() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));
        let service = world.election_service();

        let election = service
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await
            .unwrap();
        assert_eq!(election.status, ElectionStatus::Open);
        assert_eq!(election.use_restriction, Some(json!({"type": "everything"})));

        let mut edited = consent_model("c1");
        edited.use_restriction = json!({"type": "nothing"});
        world.store.put_consent(edited);

        let stored = service.describe_election_by_id(&election.id).await.unwrap();
        assert_eq!(stored.use_restriction, Some(json!({"type": "everything"})));
    }

    #[tokio::test]
    async fn test_quorum_requires_four_members() {
        let world = World::new();
        world.store.add_user("chair", &[dac_db::entities::user_role::Role::Chairperson]);
        world.store.add_user("m1", &[dac_db::entities::user_role::Role::Member]);
        world.store.add_user("m2", &[dac_db::entities::user_role::Role::Member]);
        world.store.put_consent(consent_model("c1"));

        let result = world
            .election_service()
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await;
        match result {
            Err(AppError::InvalidArgument(msg)) => assert_eq!(msg, NO_QUORUM),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quorum_requires_chairperson() {
        let world = World::new();
        for i in 1..=5 {
            world
                .store
                .add_user(&format!("m{i}"), &[dac_db::entities::user_role::Role::Member]);
        }
        world.store.put_consent(consent_model("c1"));

        let result = world
            .election_service()
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await;
        match result {
            Err(AppError::InvalidArgument(msg)) => assert_eq!(msg, NO_CHAIRPERSON),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_data_set_election_skips_quorum() {
        let world = World::new();
        world.store.put_dar(dar_model("d1", &["ds1"], true));

        let election = world
            .election_service()
            .create_election(
                "d1",
                ElectionType::DataSet,
                CreateElectionInput {
                    status: None,
                    dataset_id: Some("ds1".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(election.dataset_id.as_deref(), Some("ds1"));
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let world = World::with_committee(4);
        let result = world
            .election_service()
            .create_election("missing", ElectionType::TranslateDul, CreateElectionInput::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_second_open_election_conflicts() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));
        let service = world.election_service();

        let first = service
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await
            .unwrap();
        let second = service
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await;
        match second {
            Err(AppError::Conflict(msg)) => assert!(msg.ends_with(&first.id)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_status_rejected() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));

        let result = world
            .election_service()
            .create_election(
                "c1",
                ElectionType::TranslateDul,
                CreateElectionInput {
                    status: Some("Pending".to_string()),
                    dataset_id: None,
                },
            )
            .await;
        match result {
            Err(AppError::InvalidArgument(msg)) => {
                assert_eq!(msg, "Invalid value. Valid status are: Open, Closed, Canceled, Final");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(world.store.elections().is_empty());
    }

    #[tokio::test]
    async fn test_partially_disabled_dar_is_rewritten() {
        let world = World::with_committee(4);
        world.seed_approved_dar(true).await;
        world.store.put_dataset(dataset_model("ds2", "c1", false));

        let election = world
            .election_service()
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await
            .unwrap();
        assert_eq!(election.election_type, ElectionType::DataAccess);

        let dar = world.resolver().dar("d1").await.unwrap().unwrap();
        assert_eq!(dar.dataset_id_list(), vec!["ds1".to_string()]);
        assert_eq!(world.sink.count("disabled_datasets:researcher:DAR-d1:ds2"), 1);
    }

    #[tokio::test]
    async fn test_all_disabled_dar_fails() {
        let world = World::with_committee(4);
        world.seed_approved_dar(true).await;
        world.store.put_dataset(dataset_model("ds1", "c1", false));
        world.store.put_dataset(dataset_model("ds2", "c1", false));

        let result = world
            .election_service()
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await;
        match result {
            Err(AppError::InvalidArgument(msg)) => assert!(msg.starts_with(INACTIVE_DATASETS)),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(world.sink.count("disabled_datasets"), 1);
        assert!(
            world
                .store
                .elections()
                .iter()
                .all(|e| e.election_type != ElectionType::DataAccess)
        );
    }

    #[tokio::test]
    async fn test_data_access_requires_approved_dul() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));
        world.store.put_dataset(dataset_model("ds1", "c1", true));
        world.store.put_dar(dar_model("d1", &["ds1"], true));
        let service = world.election_service();

        let no_dul = service
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await;
        assert!(matches!(no_dul, Err(AppError::InvalidArgument(ref m)) if m == DUL_NOT_APPROVED));

        world.approve_consent("c1").await;
        world
            .insert_election(election_model(
                "reopened",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;
        let open_dul = service
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await;
        assert!(matches!(open_dul, Err(AppError::InvalidArgument(ref m)) if m == DUL_NOT_APPROVED));
    }

    #[tokio::test]
    async fn test_denied_dul_blocks_data_access() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));
        world.store.put_dataset(dataset_model("ds1", "c1", true));
        world.store.put_dar(dar_model("d1", &["ds1"], true));
        let mut dul = election_model("dul", ElectionType::TranslateDul, ElectionStatus::Closed, "c1");
        dul.final_vote = Some(false);
        world.insert_election(dul).await;
        world
            .insert_vote(cast(vote_model("cv", "dul", "chair", VoteType::Chairperson), false))
            .await;

        let result = world
            .election_service()
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_rp_election_links_to_access() {
        let world = World::with_committee(4);
        world.seed_approved_dar(true).await;
        let service = world.election_service();

        let access = service
            .create_election("d1", ElectionType::DataAccess, CreateElectionInput::default())
            .await
            .unwrap();
        let rp = service
            .create_election("d1", ElectionType::Rp, CreateElectionInput::default())
            .await
            .unwrap();

        assert_eq!(
            service.find_rp_election_by_access_id(&access.id).await.unwrap(),
            Some(rp.id.clone())
        );
        assert_eq!(
            service.find_access_election_by_rp_id(&rp.id).await.unwrap(),
            Some(access.id)
        );
        assert_eq!(rp.translated_use_restriction.as_deref(), Some("Cancer research only"));
    }

    async fn linked_pair(world: &World) -> (election::Model, election::Model) {
        let access = world
            .insert_election(election_model(
                "access",
                ElectionType::DataAccess,
                ElectionStatus::Open,
                "d1",
            ))
            .await;
        let rp = world
            .insert_election(election_model("rp", ElectionType::Rp, ElectionStatus::Open, "d1"))
            .await;
        world.store.link_access_rp("access", "rp").await.unwrap();
        (access, rp)
    }

    #[tokio::test]
    async fn test_cancel_cascades_to_pair() {
        let world = World::new();
        linked_pair(&world).await;
        let service = world.election_service();

        let updated = service
            .update_election_by_id(
                "rp",
                UpdateElectionInput {
                    status: Some("Canceled".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ElectionStatus::Canceled);
        assert!(updated.final_vote_date.is_none());

        let access = service.describe_election_by_id("access").await.unwrap();
        assert_eq!(access.status, ElectionStatus::Canceled);
    }

    fn open_ids(world: &World) -> Vec<String> {
        let mut ids: Vec<String> = world
            .store
            .elections()
            .into_iter()
            .filter(election::Model::is_open)
            .map(|e| e.id)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_reopen_conflicts_with_open_election() {
        let world = World::new();
        world
            .insert_election(election_model(
                "e1",
                ElectionType::TranslateDul,
                ElectionStatus::Closed,
                "c1",
            ))
            .await;
        world
            .insert_vote(vote_model("cv", "e1", "chair", VoteType::Chairperson))
            .await;
        world
            .insert_election(election_model(
                "e2",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;
        let service = world.election_service();

        let reopened = service
            .update_election_by_id(
                "e1",
                UpdateElectionInput {
                    final_vote: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(reopened, Err(AppError::Conflict(_))));
        assert_eq!(open_ids(&world), vec!["e2".to_string()]);

        let e1 = service.describe_election_by_id("e1").await.unwrap();
        assert_eq!(e1.status, ElectionStatus::Closed);
        assert_eq!(e1.final_vote, None);
        let chair_vote = world.store.votes().into_iter().find(|v| v.id == "cv").unwrap();
        assert_eq!(chair_vote.vote, None);

        // Once the other election is gone, reopening goes through.
        service
            .update_election_by_id(
                "e2",
                UpdateElectionInput {
                    status: Some("Canceled".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let e1 = service
            .update_election_by_id("e1", UpdateElectionInput::default())
            .await
            .unwrap();
        assert_eq!(e1.status, ElectionStatus::Open);
        assert_eq!(open_ids(&world), vec!["e1".to_string()]);
    }

    #[tokio::test]
    async fn test_update_open_election_keeps_it_open() {
        let world = World::new();
        world
            .insert_election(election_model(
                "e1",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;

        let updated = world
            .election_service()
            .update_election_by_id(
                "e1",
                UpdateElectionInput {
                    final_rationale: Some("Draft".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ElectionStatus::Open);
        assert_eq!(open_ids(&world), vec!["e1".to_string()]);
    }

    #[tokio::test]
    async fn test_update_missing_election_and_bad_status() {
        let world = World::new();
        let service = world.election_service();

        let missing = service
            .update_election_by_id("nope", UpdateElectionInput::default())
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let bad = service
            .update_election_by_id(
                "nope",
                UpdateElectionInput {
                    status: Some("Done".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(bad, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_close_with_decision_writes_chair_vote() {
        let world = World::new();
        world
            .insert_election(election_model(
                "e1",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;
        world
            .insert_vote(vote_model("cv", "e1", "chair", VoteType::Chairperson))
            .await;

        let closed = world
            .election_service()
            .close_election_with_decision("e1", true, Some("Consistent".to_string()))
            .await
            .unwrap();

        assert_eq!(closed.status, ElectionStatus::Closed);
        assert_eq!(closed.final_vote, Some(true));
        assert_eq!(closed.final_rationale.as_deref(), Some("Consistent"));
        assert!(closed.final_vote_date.is_some());

        let chair_vote = world
            .store
            .votes()
            .into_iter()
            .find(|v| v.id == "cv")
            .unwrap();
        assert_eq!(chair_vote.vote, Some(true));
        assert_eq!(chair_vote.rationale.as_deref(), Some("Consistent"));
        assert!(chair_vote.create_date.is_some());
    }

    #[tokio::test]
    async fn test_update_final_access_vote_finalizes_pair() {
        let world = World::new();
        linked_pair(&world).await;
        let service = world.election_service();

        let access = service.update_final_access_vote("access", true).await.unwrap();
        assert_eq!(access.status, ElectionStatus::Final);
        assert_eq!(access.final_access_vote, Some(true));

        let rp = service.describe_election_by_id("rp").await.unwrap();
        assert_eq!(rp.status, ElectionStatus::Final);

        let wrong_type = service.update_final_access_vote("rp", true).await;
        assert!(matches!(wrong_type, Err(AppError::InvalidArgument(_))));
    }

    async fn dataset_election(world: &World, id: &str, dataset_id: &str) -> election::Model {
        let mut election = election_model(id, ElectionType::DataSet, ElectionStatus::Open, "d1");
        election.dataset_id = Some(dataset_id.to_string());
        world.insert_election(election).await
    }

    #[tokio::test]
    async fn test_data_owner_tally() {
        let world = World::new();
        dataset_election(&world, "ds-e1", "ds1").await;
        world
            .insert_vote(cast(vote_model("o1", "ds-e1", "owner1", VoteType::DataOwner), true))
            .await;
        let mut concerned = cast(vote_model("o2", "ds-e1", "owner2", VoteType::DataOwner), true);
        concerned.has_concerns = Some(true);
        world.insert_vote(concerned).await;

        let closed = world
            .election_service()
            .close_data_owner_approval_election("ds-e1")
            .await
            .unwrap();
        assert_eq!(closed.status, ElectionStatus::Closed);
        assert_eq!(closed.final_access_vote, Some(false));
    }

    #[tokio::test]
    async fn test_data_owner_tally_approves() {
        let world = World::new();
        dataset_election(&world, "ds-e1", "ds1").await;
        world
            .insert_vote(cast(vote_model("o1", "ds-e1", "owner1", VoteType::DataOwner), true))
            .await;

        let closed = world
            .election_service()
            .close_data_owner_approval_election("ds-e1")
            .await
            .unwrap();
        assert_eq!(closed.final_access_vote, Some(true));
        assert_eq!(world.sink.count("closed_dataset_elections"), 1);
    }

    #[tokio::test]
    async fn test_closed_dataset_notice_waits_for_every_dataset() {
        let world = World::new();
        dataset_election(&world, "ds-e1", "ds1").await;
        dataset_election(&world, "ds-e2", "ds2").await;

        world
            .election_service()
            .close_data_owner_approval_election("ds-e1")
            .await
            .unwrap();
        assert_eq!(world.sink.count("closed_dataset_elections"), 0);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_block_close() {
        let world = World::with_sink(RecordingNotificationSink::failing());
        dataset_election(&world, "ds-e1", "ds1").await;

        let closed = world
            .election_service()
            .close_data_owner_approval_election("ds-e1")
            .await
            .unwrap();
        assert_eq!(closed.status, ElectionStatus::Closed);
        let stored = ElectionStore::find_by_id(&world.store, "ds-e1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ElectionStatus::Closed);
    }

    #[tokio::test]
    async fn test_check_data_owner_to_close() {
        let world = World::new();
        dataset_election(&world, "ds-e1", "ds1").await;
        world
            .insert_vote(cast(vote_model("o1", "ds-e1", "owner1", VoteType::DataOwner), true))
            .await;
        world
            .insert_vote(vote_model("o2", "ds-e1", "owner2", VoteType::DataOwner))
            .await;
        let service = world.election_service();

        assert!(!service.check_data_owner_to_close_election("ds-e1").await.unwrap());

        world
            .vote_service()
            .first_vote_update(
                crate::services::vote::CastVoteInput {
                    vote: Some(true),
                    ..Default::default()
                },
                "o2",
            )
            .await
            .unwrap();
        assert!(service.check_data_owner_to_close_election("ds-e1").await.unwrap());

        world
            .insert_election(election_model(
                "dul",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;
        assert!(!service.check_data_owner_to_close_election("dul").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_open_election_and_reopen() {
        let world = World::with_committee(4);
        world.store.put_consent(consent_model("c1"));
        world.store.put_consent(consent_model("c2"));
        let service = world.election_service();
        let first = service
            .create_election("c1", ElectionType::TranslateDul, CreateElectionInput::default())
            .await
            .unwrap();
        service
            .create_election("c2", ElectionType::TranslateDul, CreateElectionInput::default())
            .await
            .unwrap();

        let reopened = service.cancel_open_election_and_reopen().await.unwrap();
        assert_eq!(reopened.len(), 2);

        let canceled = service.describe_election_by_id(&first.id).await.unwrap();
        assert_eq!(canceled.status, ElectionStatus::Canceled);
        for consent_id in ["c1", "c2"] {
            let open: Vec<_> = world
                .store
                .elections()
                .into_iter()
                .filter(|e| e.reference_id == consent_id && e.is_open())
                .collect();
            assert_eq!(open.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_reopen_without_quorum_leaves_everything_canceled() {
        let world = World::new();
        for (id, consent_id) in [("e1", "c1"), ("e2", "c2")] {
            world.store.put_consent(consent_model(consent_id));
            world
                .insert_election(election_model(
                    id,
                    ElectionType::TranslateDul,
                    ElectionStatus::Open,
                    consent_id,
                ))
                .await;
        }

        let result = world.election_service().cancel_open_election_and_reopen().await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));

        let statuses: BTreeMap<String, ElectionStatus> = world
            .store
            .elections()
            .into_iter()
            .map(|e| (e.id, e.status))
            .collect();
        assert_eq!(
            statuses,
            btreemap! {
                "e1".to_string() => ElectionStatus::Canceled,
                "e2".to_string() => ElectionStatus::Canceled,
            }
        );
    }

    /// Four DAC votes; `cast_by` lists the voters who already voted.
    async fn dac_election(world: &World, cast_by: &[&str]) {
        world
            .insert_election(election_model(
                "e1",
                ElectionType::TranslateDul,
                ElectionStatus::Open,
                "c1",
            ))
            .await;
        for user in ["chair", "m1", "m2", "m3"] {
            let vote = vote_model(&format!("dac-{user}"), "e1", user, VoteType::Dac);
            let vote = if cast_by.contains(&user) { cast(vote, true) } else { vote };
            world.insert_vote(vote).await;
        }
        world
            .insert_vote(vote_model("chair-vote", "e1", "chair", VoteType::Chairperson))
            .await;
    }

    #[tokio::test]
    async fn test_collect_when_chair_casts_last_dac_vote() {
        let world = World::with_committee(3);
        dac_election(&world, &["chair", "m1", "m2", "m3"]).await;
        let vote = cast(vote_model("dac-chair", "e1", "chair", VoteType::Dac), true);

        assert!(
            world
                .election_service()
                .validate_collect_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_no_collect_while_member_pending() {
        let world = World::with_committee(3);
        dac_election(&world, &["chair", "m1", "m2"]).await;
        let vote = cast(vote_model("dac-m2", "e1", "m2", VoteType::Dac), true);

        assert!(
            !world
                .election_service()
                .validate_collect_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_collect_when_only_chair_pending() {
        let world = World::with_committee(3);
        dac_election(&world, &["m1", "m2", "m3"]).await;
        let vote = cast(vote_model("dac-m3", "e1", "m3", VoteType::Dac), true);

        assert!(
            world
                .election_service()
                .validate_collect_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    /// Access and RP elections with DAC votes for `chair` and `m1`.
    async fn dar_pair(world: &World, access_cast: &[&str], rp_cast: &[&str]) {
        linked_pair(world).await;
        for (election_id, cast_by) in [("access", access_cast), ("rp", rp_cast)] {
            for user in ["chair", "m1"] {
                let vote = vote_model(&format!("{election_id}-{user}"), election_id, user, VoteType::Dac);
                let vote = if cast_by.contains(&user) { cast(vote, true) } else { vote };
                world.insert_vote(vote).await;
            }
        }
    }

    #[tokio::test]
    async fn test_collect_dar_both_complete() {
        let world = World::with_committee(1);
        dar_pair(&world, &["chair", "m1"], &["chair", "m1"]).await;
        let service = world.election_service();

        let member_vote = cast(vote_model("rp-m1", "rp", "m1", VoteType::Dac), true);
        assert!(service.validate_collect_dar_email_condition(&member_vote).await.unwrap());

        let chair_vote = cast(vote_model("rp-chair", "rp", "chair", VoteType::Dac), true);
        assert!(!service.validate_collect_dar_email_condition(&chair_vote).await.unwrap());
    }

    #[tokio::test]
    async fn test_collect_dar_one_pending_on_rp() {
        let world = World::with_committee(1);
        dar_pair(&world, &["chair", "m1"], &["m1"]).await;
        let vote = cast(vote_model("rp-m1", "rp", "m1", VoteType::Dac), true);

        assert!(
            world
                .election_service()
                .validate_collect_dar_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_collect_dar_one_pending_on_access() {
        let world = World::with_committee(1);
        dar_pair(&world, &["m1"], &["chair", "m1"]).await;
        let vote = cast(vote_model("access-m1", "access", "m1", VoteType::Dac), true);

        assert!(
            world
                .election_service()
                .validate_collect_dar_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_collect_dar_one_pending_on_each() {
        let world = World::with_committee(1);
        dar_pair(&world, &["m1"], &["m1"]).await;
        let vote = cast(vote_model("access-m1", "access", "m1", VoteType::Dac), true);
        let service = world.election_service();

        assert!(service.validate_collect_dar_email_condition(&vote).await.unwrap());

        world
            .store
            .record("access", "d1", EmailType::Collect)
            .await
            .unwrap();
        assert!(!service.validate_collect_dar_email_condition(&vote).await.unwrap());
    }

    #[tokio::test]
    async fn test_collect_dar_too_many_pending() {
        let world = World::with_committee(1);
        dar_pair(&world, &[], &["chair", "m1"]).await;
        let vote = cast(vote_model("rp-m1", "rp", "m1", VoteType::Dac), true);

        assert!(
            !world
                .election_service()
                .validate_collect_dar_email_condition(&vote)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_data_set_elections_skips_open() {
        let world = World::new();
        dataset_election(&world, "existing", "ds1").await;
        let owners = btreemap! {
            "o1".to_string() => vec!["ds1".to_string(), "ds2".to_string()],
            "o2".to_string() => vec!["ds2".to_string(), "ds3".to_string()],
        };
        let service = world.election_service();

        let created = service.create_data_set_elections("d1", &owners).await.unwrap();
        let datasets: Vec<_> = created.iter().filter_map(|e| e.dataset_id.clone()).collect();
        assert_eq!(datasets, vec!["ds2".to_string(), "ds3".to_string()]);
        assert!(service.is_data_set_election_open().await.unwrap());

        let again = service.create_data_set_elections("d1", &owners).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_dar_dataset_election_status() {
        let world = World::new();
        world.store.put_dar(dar_model("d1", &["ds1"], true));
        world.store.put_dataset(dataset_model("ds1", "c1", true));
        let service = world.election_service();

        assert_eq!(
            service.dar_dataset_election_status("d1").await.unwrap(),
            DatasetElectionStatus::ApprovalNotNeeded
        );

        world.store.put_dataset(dataset::Model {
            needs_approval: true,
            ..dataset_model("ds1", "c1", true)
        });
        assert_eq!(
            service.dar_dataset_election_status("d1").await.unwrap(),
            DatasetElectionStatus::DsPending
        );

        dataset_election(&world, "ds-e1", "ds1").await;
        assert_eq!(
            service.dar_dataset_election_status("d1").await.unwrap(),
            DatasetElectionStatus::DsPending
        );

        service.close_data_owner_approval_election("ds-e1").await.unwrap();
        assert_eq!(
            service.dar_dataset_election_status("d1").await.unwrap(),
            DatasetElectionStatus::DsApproved
        );

        let mut denied = service.describe_election_by_id("ds-e1").await.unwrap();
        denied.final_access_vote = Some(false);
        ElectionStore::update(&world.store, denied).await.unwrap();
        assert_eq!(
            service.dar_dataset_election_status("d1").await.unwrap(),
            DatasetElectionStatus::DsDenied
        );
    }

    #[tokio::test]
    async fn test_delete_data_access_election_removes_rp() {
        let world = World::new();
        linked_pair(&world).await;
        world
            .insert_vote(vote_model("v1", "rp", "m1", VoteType::Dac))
            .await;
        let service = world.election_service();

        let wrong_reference = service.delete_election("d2", "access").await;
        assert!(matches!(wrong_reference, Err(AppError::NotFound(_))));

        service.delete_election("d1", "access").await.unwrap();
        assert!(world.store.elections().is_empty());
        assert!(world.store.links().is_empty());
        assert!(world.store.votes().is_empty());
    }

    #[tokio::test]
    async fn test_describe_data_request_election_falls_back_to_rp() {
        let world = World::new();
        world
            .insert_election(election_model("rp", ElectionType::Rp, ElectionStatus::Open, "d1"))
            .await;
        let service = world.election_service();

        let found = service.describe_data_request_election("d1").await.unwrap();
        assert_eq!(found.id, "rp");
        assert!(matches!(
            service.describe_data_request_election("d2").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_history_labels() {
        let world = World::new();
        world
            .insert_election(election_model(
                "e1",
                ElectionType::TranslateDul,
                ElectionStatus::Closed,
                "c1",
            ))
            .await;

        let rows = world
            .election_service()
            .describe_elections_by_consent_id("c1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].election_type, "Data Use Limitation");
        assert_eq!(rows[0].status, ElectionStatus::Closed);
    }

    #[tokio::test]
    async fn test_find_expired_elections() {
        let world = World::new();
        let mut old = election_model("old", ElectionType::DataAccess, ElectionStatus::Open, "d1");
        old.create_date = (Utc::now() - Duration::days(10)).into();
        world.insert_election(old).await;
        world
            .insert_election(election_model(
                "fresh",
                ElectionType::DataAccess,
                ElectionStatus::Open,
                "d2",
            ))
            .await;

        let expired = world
            .election_service()
            .find_expired_elections(ElectionType::DataAccess, 7)
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "old");
    }
}
