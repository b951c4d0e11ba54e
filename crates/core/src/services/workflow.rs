//! Review workflow.
//!
//! Glue between elections, votes and notifications: opening a review fans
//! out votes and tells the committee, and every cast re-evaluates the close
//! and collect triggers while holding the election's lock.

use std::collections::BTreeMap;

use dac_common::{AppError, AppResult};
use dac_db::{
    entities::{
        data_access_request,
        election::{self, ElectionType},
        mail_message::EmailType,
        vote::{self, VoteType},
    },
    repositories::SharedMailLogStore,
};

use super::{
    committee::CommitteeDirectory,
    election::{CreateElectionInput, ElectionService},
    locks::ElectionLocks,
    match_engine::MatchEngineService,
    notification::{self, NotificationSinkService},
    reference::ReferenceResolver,
    vote::{CastVoteInput, VoteService},
};

/// Elections opened for a data access request.
#[derive(Debug, Clone)]
pub struct DataAccessReview {
    pub access: election::Model,
    /// Absent when the DAR has no restriction and goes to manual review.
    pub rp: Option<election::Model>,
}

/// Result of a data owner's vote.
#[derive(Debug, Clone)]
pub struct DataOwnerVoteOutcome {
    pub vote: vote::Model,
    /// The data owner election, when this vote was the last one pending.
    pub closed_election: Option<election::Model>,
}

/// Result of a FINAL or AGREEMENT vote.
#[derive(Debug, Clone)]
pub struct FinalAccessOutcome {
    pub vote: vote::Model,
    /// The data access election, once its final access decision resolved.
    pub resolved_election: Option<election::Model>,
    /// Data owner elections opened by an approval.
    pub dataset_elections: Vec<election::Model>,
}

#[derive(Clone)]
pub struct ReviewWorkflowService {
    elections: ElectionService,
    votes: VoteService,
    references: ReferenceResolver,
    committee: CommitteeDirectory,
    mail_log: SharedMailLogStore,
    notifier: NotificationSinkService,
    matcher: MatchEngineService,
    locks: ElectionLocks,
}

impl ReviewWorkflowService {
    /// Create a new review workflow service.
    #[must_use]
    pub const fn new(
        elections: ElectionService,
        votes: VoteService,
        references: ReferenceResolver,
        committee: CommitteeDirectory,
        mail_log: SharedMailLogStore,
        notifier: NotificationSinkService,
        matcher: MatchEngineService,
        locks: ElectionLocks,
    ) -> Self {
        Self {
            elections,
            votes,
            references,
            committee,
            mail_log,
            notifier,
            matcher,
            locks,
        }
    }

    /// Open a Data Use Limitation review of a consent.
    pub async fn open_consent_review(
        &self,
        consent_id: &str,
        input: CreateElectionInput,
    ) -> AppResult<election::Model> {
        let election = self
            .elections
            .create_election(consent_id, ElectionType::TranslateDul, input)
            .await?;
        let votes = self.open_votes(&election, false).await?;
        self.notify_new_case(&votes, &election).await;
        Ok(election)
    }

    /// Open the review of a data access request.
    ///
    /// A DAR with a restriction gets a linked research purpose election and
    /// AGREEMENT votes; one without goes to manual review.
    pub async fn open_data_access_review(
        &self,
        dar_id: &str,
        input: CreateElectionInput,
    ) -> AppResult<DataAccessReview> {
        let access = self
            .elections
            .create_election(dar_id, ElectionType::DataAccess, input)
            .await?;
        let (dar, access_votes, rp) = match self.complete_data_access_review(dar_id, &access).await
        {
            Ok(opened) => opened,
            Err(e) => {
                self.discard_data_access_election(dar_id, &access.id).await;
                return Err(e);
            }
        };
        let is_manual_review = rp.is_none();
        self.notify_new_case(&access_votes, &access).await;

        match self.references.consent_for_dar(&dar).await? {
            Some(consent) => {
                if let Err(e) = self.matcher.request_match(&consent.id, dar_id).await {
                    tracing::warn!(dar_id = dar_id, error = %e, "Match request failed");
                }
            }
            None => tracing::warn!(dar_id = dar_id, "No consent found to match against"),
        }

        tracing::info!(
            dar_id = dar_id,
            election_id = %access.id,
            manual_review = is_manual_review,
            "Data access review opened"
        );
        Ok(DataAccessReview { access, rp })
    }

    /// Votes and the research purpose pair of a freshly opened access
    /// election.
    async fn complete_data_access_review(
        &self,
        dar_id: &str,
        access: &election::Model,
    ) -> AppResult<(
        data_access_request::Model,
        Vec<vote::Model>,
        Option<election::Model>,
    )> {
        let dar = self
            .references
            .dar(dar_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Data Access Request not found: {dar_id}")))?;
        let is_manual_review = dar.restriction.is_none();

        let access_votes = self.open_votes(access, is_manual_review).await?;
        let rp = if is_manual_review {
            None
        } else {
            let rp = self
                .elections
                .create_election(dar_id, ElectionType::Rp, CreateElectionInput::default())
                .await?;
            self.open_votes(&rp, false).await?;
            Some(rp)
        };
        Ok((dar, access_votes, rp))
    }

    /// Remove a half-opened access election along with its votes and any
    /// linked research purpose election.
    async fn discard_data_access_election(&self, dar_id: &str, access_id: &str) {
        match self.elections.delete_election(dar_id, access_id).await {
            Ok(()) => tracing::warn!(
                dar_id = dar_id,
                election_id = access_id,
                "Data access review rolled back"
            ),
            Err(e) => tracing::error!(
                dar_id = dar_id,
                election_id = access_id,
                error = %e,
                "Failed to roll back data access review"
            ),
        }
    }

    /// Cancel and reopen every in-flight DUL review, e.g. after the
    /// chairperson changed.
    pub async fn reopen_consent_reviews(&self) -> AppResult<Vec<election::Model>> {
        let reopened = self.elections.cancel_open_election_and_reopen().await?;
        for election in &reopened {
            let votes = self.open_votes(election, false).await?;
            self.notify_new_case(&votes, election).await;
        }
        Ok(reopened)
    }

    /// Cast a vote on a DUL election and notify the chairperson once it is
    /// time to collect.
    pub async fn submit_consent_vote(
        &self,
        vote_id: &str,
        input: CastVoteInput,
    ) -> AppResult<vote::Model> {
        let current = self.votes.describe_vote(vote_id).await?;
        let _guard = self.locks.lock(&current.election_id).await;

        let vote = self.votes.first_vote_update(input, vote_id).await?;
        if vote.vote_type == VoteType::Dac
            && self.elections.validate_collect_email_condition(&vote).await?
        {
            notification::log_failure(
                "collect",
                self.notifier.send_collect_message(&vote.election_id).await,
            );
        }
        Ok(vote)
    }

    /// First cast of a vote on a data access or research purpose election.
    pub async fn submit_data_request_vote(
        &self,
        vote_id: &str,
        input: CastVoteInput,
    ) -> AppResult<vote::Model> {
        let current = self.votes.describe_vote(vote_id).await?;
        let lock_id = self.pair_lock_id(&current.election_id).await?;
        let _guard = self.locks.lock(&lock_id).await;

        let vote = self.votes.first_vote_update(input, vote_id).await?;
        self.collect_data_request(&vote, &lock_id).await?;
        Ok(vote)
    }

    /// Re-cast a vote on a data access or research purpose election.
    pub async fn update_data_request_vote(
        &self,
        vote_id: &str,
        reference_id: &str,
        input: CastVoteInput,
    ) -> AppResult<vote::Model> {
        let current = self.votes.describe_vote_by_id(vote_id, reference_id).await?;
        let lock_id = self.pair_lock_id(&current.election_id).await?;
        let _guard = self.locks.lock(&lock_id).await;

        let vote = self.votes.update_vote(input, vote_id, reference_id).await?;
        self.collect_data_request(&vote, &lock_id).await?;
        Ok(vote)
    }

    /// The access election id guards both members of a pair.
    async fn pair_lock_id(&self, election_id: &str) -> AppResult<String> {
        let election = self.elections.describe_election_by_id(election_id).await?;
        if election.election_type == ElectionType::Rp
            && let Some(access_id) = self.elections.find_access_election_by_rp_id(&election.id).await?
        {
            return Ok(access_id);
        }
        Ok(election.id)
    }

    async fn collect_data_request(&self, vote: &vote::Model, access_id: &str) -> AppResult<()> {
        if vote.vote_type != VoteType::Dac
            || !self.elections.validate_collect_dar_email_condition(vote).await?
        {
            return Ok(());
        }

        match self.notifier.send_collect_message(access_id).await {
            Ok(()) => {
                let election = self.elections.describe_election_by_id(access_id).await?;
                self.mail_log
                    .record(access_id, &election.reference_id, EmailType::Collect)
                    .await?;
                tracing::info!(election_id = access_id, "Collect notification sent");
            }
            Err(e) => {
                tracing::warn!(notification = "collect", error = %e, "Notification failed");
            }
        }
        Ok(())
    }

    /// Cast a data owner vote and close the election when no owner is left.
    pub async fn submit_data_owner_vote(
        &self,
        vote_id: &str,
        input: CastVoteInput,
    ) -> AppResult<DataOwnerVoteOutcome> {
        let current = self.votes.describe_vote(vote_id).await?;
        if current.vote_type != VoteType::DataOwner {
            return Err(AppError::InvalidArgument(
                "Vote is not a data owner vote".to_string(),
            ));
        }
        let _guard = self.locks.lock(&current.election_id).await;

        let vote = self.votes.first_vote_update(input, vote_id).await?;
        let closed_election = if self
            .elections
            .check_data_owner_to_close_election(&vote.election_id)
            .await?
        {
            Some(
                self.elections
                    .close_data_owner_approval_election(&vote.election_id)
                    .await?,
            )
        } else {
            None
        };
        Ok(DataOwnerVoteOutcome {
            vote,
            closed_election,
        })
    }

    /// Cast a FINAL or AGREEMENT vote.
    ///
    /// Once the FINAL vote and any AGREEMENT vote are cast, the FINAL value
    /// becomes the election's final access decision. An approval opens data
    /// owner elections for the datasets that need one.
    pub async fn submit_final_access_vote(
        &self,
        vote_id: &str,
        input: CastVoteInput,
    ) -> AppResult<FinalAccessOutcome> {
        let current = self.votes.describe_vote(vote_id).await?;
        if !matches!(current.vote_type, VoteType::Final | VoteType::Agreement) {
            return Err(AppError::InvalidArgument(
                "Vote is not a final access vote".to_string(),
            ));
        }
        let _guard = self.locks.lock(&current.election_id).await;

        let vote = self.votes.first_vote_update(input, vote_id).await?;
        let finals = self
            .votes
            .describe_votes_by_type(&vote.election_id, VoteType::Final)
            .await?;
        let agreements = self
            .votes
            .describe_votes_by_type(&vote.election_id, VoteType::Agreement)
            .await?;

        let decision = finals.iter().find_map(|v| v.vote);
        let Some(approved) = decision.filter(|_| agreements.iter().all(vote::Model::is_cast))
        else {
            return Ok(FinalAccessOutcome {
                vote,
                resolved_election: None,
                dataset_elections: vec![],
            });
        };

        let election = self
            .elections
            .update_final_access_vote(&vote.election_id, approved)
            .await?;
        let dataset_elections = if approved {
            self.request_data_owner_approval(&election).await?
        } else {
            vec![]
        };
        Ok(FinalAccessOutcome {
            vote,
            resolved_election: Some(election),
            dataset_elections,
        })
    }

    async fn request_data_owner_approval(
        &self,
        access: &election::Model,
    ) -> AppResult<Vec<election::Model>> {
        let Some(dar) = self.references.dar(&access.reference_id).await? else {
            return Ok(vec![]);
        };

        let mut owner_datasets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for dataset in self.references.datasets_of(&dar).await? {
            if !dataset.needs_approval {
                continue;
            }
            for owner_id in self.references.owner_ids(&dataset.id).await? {
                owner_datasets
                    .entry(owner_id)
                    .or_default()
                    .push(dataset.id.clone());
            }
        }
        if owner_datasets.is_empty() {
            return Ok(vec![]);
        }

        let created = self
            .elections
            .create_data_set_elections(&dar.id, &owner_datasets)
            .await?;
        for election in &created {
            self.votes.create_data_owners_review_votes(election).await?;
        }

        let admins = self.committee.admins_wanting_mail().await?;
        notification::log_failure(
            "flagged_dar_approved",
            self.notifier
                .send_admin_flagged_dar_approved(&dar.dar_code, &admins, &owner_datasets)
                .await,
        );
        notification::log_failure(
            "needs_approval",
            self.notifier
                .send_needs_approval_message(&owner_datasets, &dar.dar_code)
                .await,
        );
        Ok(created)
    }

    /// Flag a vote as reminded and notify its voter.
    pub async fn send_reminder(&self, vote_id: &str) -> AppResult<vote::Model> {
        let vote = self.votes.update_vote_reminder_flag(vote_id, true).await?;
        notification::log_failure(
            "reminder",
            self.notifier.send_reminder_message(vote_id).await,
        );
        Ok(vote)
    }

    async fn open_votes(
        &self,
        election: &election::Model,
        is_manual_review: bool,
    ) -> AppResult<Vec<vote::Model>> {
        let _guard = self.locks.lock(&election.id).await;
        self.votes
            .create_votes(&election.id, election.election_type, is_manual_review)
            .await
    }

    async fn notify_new_case(&self, votes: &[vote::Model], election: &election::Model) {
        let dac_votes: Vec<vote::Model> = votes
            .iter()
            .filter(|v| v.vote_type == VoteType::Dac)
            .cloned()
            .collect();
        notification::log_failure(
            "new_case",
            self.notifier
                .send_new_case_message_to_list(&dac_votes, election)
                .await,
        );
    }
}
