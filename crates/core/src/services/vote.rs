//! Vote service.
//!
//! Owns vote rows: fan-out when an election opens, casting and re-casting,
//! reminder flags, and the admin removal paths.

use chrono::Utc;
use dac_common::{AppError, AppResult, IdGenerator};
use dac_db::{
    entities::{
        election::{self, ElectionType},
        vote::{self, VoteType},
    },
    repositories::{SharedElectionStore, SharedVoteStore},
};
use serde::Deserialize;
use validator::Validate;

use super::{committee::CommitteeDirectory, reference::ReferenceResolver};

const VOTE_NOT_FOUND: &str = "Vote for specified id does not exist";

/// A voter's submission.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteInput {
    pub vote: Option<bool>,
    #[validate(length(max = 4096))]
    pub rationale: Option<String>,
    /// Data owner reservations; ignored for committee votes.
    pub has_concerns: Option<bool>,
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    elections: SharedElectionStore,
    votes: SharedVoteStore,
    references: ReferenceResolver,
    committee: CommitteeDirectory,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        elections: SharedElectionStore,
        votes: SharedVoteStore,
        references: ReferenceResolver,
        committee: CommitteeDirectory,
    ) -> Self {
        Self {
            elections,
            votes,
            references,
            committee,
            id_gen: IdGenerator::new(),
        }
    }

    fn empty_vote(&self, election_id: &str, user_id: &str, vote_type: VoteType) -> vote::Model {
        vote::Model {
            id: self.id_gen.generate(),
            election_id: election_id.to_string(),
            dac_user_id: user_id.to_string(),
            vote_type,
            vote: None,
            rationale: None,
            has_concerns: None,
            create_date: None,
            update_date: None,
            reminder_sent: false,
        }
    }

    /// Pre-create the empty votes of a freshly opened election.
    ///
    /// Every voting member gets a DAC vote. Chairpersons also get a
    /// CHAIRPERSON vote and, on data access elections, a FINAL vote plus an
    /// AGREEMENT vote unless the election needs manual review.
    pub async fn create_votes(
        &self,
        election_id: &str,
        election_type: ElectionType,
        is_manual_review: bool,
    ) -> AppResult<Vec<vote::Model>> {
        let members = self.committee.voting_members().await?;
        let chair_ids: Vec<String> = self
            .committee
            .chairpersons()
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();

        let mut created = Vec::new();
        for member in &members {
            let mut types = vec![VoteType::Dac];
            if chair_ids.contains(&member.id) {
                types.push(VoteType::Chairperson);
                if election_type == ElectionType::DataAccess {
                    types.push(VoteType::Final);
                    if !is_manual_review {
                        types.push(VoteType::Agreement);
                    }
                }
            }
            for vote_type in types {
                let vote = self.empty_vote(election_id, &member.id, vote_type);
                created.push(self.votes.insert(vote).await?);
            }
        }

        tracing::info!(
            election_id = election_id,
            votes = created.len(),
            "Election votes created"
        );
        Ok(created)
    }

    /// `create_votes` for each election in turn.
    pub async fn create_votes_for_elections(
        &self,
        elections: &[election::Model],
        is_manual_review: bool,
    ) -> AppResult<Vec<vote::Model>> {
        let mut created = Vec::new();
        for election in elections {
            created.extend(
                self.create_votes(&election.id, election.election_type, is_manual_review)
                    .await?,
            );
        }
        Ok(created)
    }

    /// One DATA_OWNER vote per owner of the election's dataset.
    pub async fn create_data_owners_review_votes(
        &self,
        election: &election::Model,
    ) -> AppResult<Vec<vote::Model>> {
        let Some(dataset_id) = election.dataset_id.as_deref() else {
            return Ok(vec![]);
        };

        let mut created = Vec::new();
        for owner_id in self.references.owner_ids(dataset_id).await? {
            let existing = self
                .votes
                .find_by_election_user_and_type(&election.id, &owner_id, VoteType::DataOwner)
                .await?;
            if existing.is_some() {
                continue;
            }
            let vote = self.empty_vote(&election.id, &owner_id, VoteType::DataOwner);
            created.push(self.votes.insert(vote).await?);
        }
        Ok(created)
    }

    async fn get_vote(&self, vote_id: &str) -> AppResult<vote::Model> {
        self.votes
            .find_by_id(vote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(VOTE_NOT_FOUND.to_string()))
    }

    async fn election_of(&self, vote: &vote::Model) -> AppResult<election::Model> {
        self.elections
            .find_by_id(&vote.election_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Election not found: {}", vote.election_id)))
    }

    /// DAC votes of a data access election freeze once it leaves OPEN.
    fn ensure_editable(vote: &vote::Model, election: &election::Model) -> AppResult<()> {
        if vote.vote_type == VoteType::Dac
            && election.election_type == ElectionType::DataAccess
            && !election.is_open()
        {
            return Err(AppError::InvalidArgument(
                "Votes of a closed Data Access election cannot be changed".to_string(),
            ));
        }
        Ok(())
    }

    /// First cast of a vote. Resubmitting the same payload overwrites the
    /// previous cast.
    pub async fn first_vote_update(
        &self,
        input: CastVoteInput,
        vote_id: &str,
    ) -> AppResult<vote::Model> {
        input.validate()?;
        let mut vote = self.get_vote(vote_id).await?;
        let election = self.election_of(&vote).await?;
        Self::ensure_editable(&vote, &election)?;

        vote.vote = input.vote;
        vote.rationale = normalize_rationale(input.rationale);
        vote.create_date = Some(Utc::now().into());
        vote.update_date = None;
        vote.reminder_sent = false;
        if input.has_concerns.is_some() {
            vote.has_concerns = input.has_concerns;
        }

        let vote = self.votes.update(vote).await?;
        tracing::debug!(vote_id = %vote.id, election_id = %vote.election_id, "Vote cast");
        Ok(vote)
    }

    /// Re-cast a vote through a reference.
    ///
    /// The cast timestamp stays; `update_date` only moves when a value is
    /// supplied.
    pub async fn update_vote(
        &self,
        input: CastVoteInput,
        vote_id: &str,
        reference_id: &str,
    ) -> AppResult<vote::Model> {
        input.validate()?;
        let mut vote = self.get_vote(vote_id).await?;
        let election = self.election_of(&vote).await?;
        if election.reference_id != reference_id {
            return Err(AppError::NotFound(VOTE_NOT_FOUND.to_string()));
        }
        Self::ensure_editable(&vote, &election)?;

        let now = Utc::now();
        if input.vote.is_some() {
            vote.update_date = Some(now.into());
        }
        if vote.create_date.is_none() {
            vote.create_date = Some(now.into());
        }
        vote.vote = input.vote;
        vote.rationale = normalize_rationale(input.rationale);
        vote.reminder_sent = false;
        if input.has_concerns.is_some() {
            vote.has_concerns = input.has_concerns;
        }

        self.votes.update(vote).await
    }

    pub async fn update_vote_reminder_flag(
        &self,
        vote_id: &str,
        reminder_sent: bool,
    ) -> AppResult<vote::Model> {
        let mut vote = self.get_vote(vote_id).await?;
        vote.reminder_sent = reminder_sent;
        self.votes.update(vote).await
    }

    /// Votes of every open election on a reference.
    pub async fn describe_votes(&self, reference_id: &str) -> AppResult<Vec<vote::Model>> {
        let open_ids: Vec<String> = self
            .elections
            .find_open_by_reference(reference_id)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        let votes = self.votes.find_by_election_ids(&open_ids).await?;
        if votes.is_empty() {
            return Err(AppError::NotFound(format!(
                "Could not find votes for specified reference id: {reference_id}"
            )));
        }
        Ok(votes)
    }

    pub async fn describe_vote(&self, vote_id: &str) -> AppResult<vote::Model> {
        self.get_vote(vote_id).await
    }

    pub async fn describe_vote_by_id(
        &self,
        vote_id: &str,
        reference_id: &str,
    ) -> AppResult<vote::Model> {
        let vote = self.get_vote(vote_id).await?;
        let election = self.election_of(&vote).await?;
        if election.reference_id != reference_id {
            return Err(AppError::NotFound(VOTE_NOT_FOUND.to_string()));
        }
        Ok(vote)
    }

    /// The owner's vote on the open data owner election of a DAR.
    pub async fn describe_data_owner_vote(
        &self,
        reference_id: &str,
        owner_id: &str,
    ) -> AppResult<vote::Model> {
        let elections = self
            .elections
            .find_by_reference_and_type(reference_id, ElectionType::DataSet)
            .await?;
        for election in elections.iter().filter(|e| e.is_open()) {
            if let Some(vote) = self
                .votes
                .find_by_election_user_and_type(&election.id, owner_id, VoteType::DataOwner)
                .await?
            {
                return Ok(vote);
            }
        }
        Err(AppError::NotFound(format!(
            "No data owner vote for {owner_id} on {reference_id}"
        )))
    }

    /// The FINAL vote of a data access election.
    pub async fn describe_final_access_vote(&self, election_id: &str) -> AppResult<vote::Model> {
        self.votes
            .find_by_election_and_type(election_id, VoteType::Final)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::NotFound(format!("No final access vote for election {election_id}"))
            })
    }

    pub async fn describe_votes_by_type(
        &self,
        election_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Vec<vote::Model>> {
        self.votes
            .find_by_election_and_type(election_id, vote_type)
            .await
    }

    pub async fn delete_vote(&self, vote_id: &str, reference_id: &str) -> AppResult<()> {
        let vote = self.describe_vote_by_id(vote_id, reference_id).await?;
        self.votes.delete(&vote.id).await?;
        tracing::info!(vote_id = vote_id, reference_id = reference_id, "Vote deleted");
        Ok(())
    }

    /// Remove every vote of every election on a reference.
    pub async fn delete_votes(&self, reference_id: &str) -> AppResult<u64> {
        let election_ids: Vec<String> = self
            .elections
            .find_by_reference(reference_id)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        if election_ids.is_empty() {
            return Err(AppError::NotFound(format!(
                "Does not exist an election for the specified id: {reference_id}"
            )));
        }
        let deleted = self.votes.delete_by_election_ids(&election_ids).await?;
        tracing::info!(reference_id = reference_id, deleted = deleted, "Votes deleted");
        Ok(deleted)
    }
}

fn normalize_rationale(rationale: Option<String>) -> Option<String> {
    rationale.filter(|r| !r.trim().is_empty())
}
