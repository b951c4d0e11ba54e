//! Per-user pending case projection.

use std::cmp::Ordering;

use dac_common::AppResult;
use dac_db::{
    entities::{
        election::{self, ElectionStatus, ElectionType},
        vote::{self, VoteType},
    },
    repositories::{SharedElectionStore, SharedVoteStore},
};
use serde::Serialize;

use super::{committee::CommitteeDirectory, reference::ReferenceResolver};

/// Whether the user still owes a vote on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pending,
    Editable,
}

/// One election awaiting (or open to) a committee member's vote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCase {
    pub election_id: String,
    pub reference_id: String,
    /// Consent name or DAR code.
    pub front_end_id: Option<String>,
    pub vote_id: String,
    /// The user's vote on the paired research purpose election.
    pub rp_vote_id: Option<String>,
    pub rp_election_id: Option<String>,
    pub total_votes: usize,
    pub votes_logged: usize,
    /// `votes_logged/total_votes`, as shown on the case list.
    pub logged: String,
    pub already_voted: bool,
    pub is_reminder_sent: bool,
    pub status: CaseStatus,
    /// Whether the user's CHAIRPERSON vote is cast. Only reported once the
    /// user has voted on the case itself.
    pub is_final_vote: bool,
    pub election_status: ElectionStatus,
}

impl PendingCase {
    const fn is_ready_to_collect(&self) -> bool {
        self.votes_logged == self.total_votes
    }
}

/// A data owner's vote on one dataset of a DAR.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataOwnerPendingCase {
    pub election_id: String,
    pub reference_id: String,
    pub dar_code: Option<String>,
    pub dataset_id: Option<String>,
    pub dataset_name: Option<String>,
    pub vote_id: String,
    pub already_voted: bool,
    pub has_concerns: Option<bool>,
}

/// Builds the pending case lists shown to committee members and data owners.
#[derive(Clone)]
pub struct PendingCaseService {
    elections: SharedElectionStore,
    votes: SharedVoteStore,
    references: ReferenceResolver,
    committee: CommitteeDirectory,
}

impl PendingCaseService {
    /// Create a new pending case service.
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
        }
    }

    /// Open DUL elections the user holds a DAC vote on.
    pub async fn describe_consent_pending_cases(&self, user_id: &str) -> AppResult<Vec<PendingCase>> {
        let elections = self
            .elections
            .find_by_type_and_status(ElectionType::TranslateDul, ElectionStatus::Open)
            .await?;

        let mut cases = Vec::new();
        for election in elections {
            let Some(vote) = self.user_vote(&election.id, user_id, VoteType::Dac).await? else {
                continue;
            };
            let (total_votes, votes_logged) = self.dac_progress(&election.id).await?;
            let front_end_id = self
                .references
                .consent(&election.reference_id)
                .await?
                .map(|c| c.name);
            let is_final_vote = self.chair_vote_cast(&election.id, user_id).await?;

            cases.push(build_case(
                &election,
                &vote,
                None,
                front_end_id,
                (total_votes, votes_logged),
                is_final_vote,
                election.status,
            ));
        }

        self.order_for(user_id, cases).await
    }

    /// Data access elections the user holds a DAC vote on, joined with
    /// their research purpose pair.
    ///
    /// Chairpersons also see closed elections whose final access decision
    /// is not yet an approval. Cases come back in store order.
    pub async fn describe_data_request_pending_cases(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<PendingCase>> {
        let is_chair = self.committee.is_chairperson(user_id).await?;
        let statuses: &[ElectionStatus] = if is_chair {
            &[ElectionStatus::Open, ElectionStatus::Closed, ElectionStatus::Final]
        } else {
            &[ElectionStatus::Open]
        };

        let mut elections = Vec::new();
        for status in statuses {
            elections.extend(
                self.elections
                    .find_by_type_and_status(ElectionType::DataAccess, *status)
                    .await?
                    .into_iter()
                    .filter(|e| e.is_open() || e.final_access_vote != Some(true)),
            );
        }

        let mut cases = Vec::new();
        for access in elections {
            let Some(access_vote) = self.user_vote(&access.id, user_id, VoteType::Dac).await?
            else {
                continue;
            };

            let rp = match self.elections.find_rp_id_by_access_id(&access.id).await? {
                Some(rp_id) => self.elections.find_by_id(&rp_id).await?,
                None => None,
            };
            let rp_vote = match &rp {
                Some(rp) => self.user_vote(&rp.id, user_id, VoteType::Dac).await?,
                None => None,
            };

            let (total_votes, votes_logged) = self.dac_progress(&access.id).await?;
            let front_end_id = self
                .references
                .dar(&access.reference_id)
                .await?
                .map(|d| d.dar_code);
            let is_final_vote = self.chair_vote_cast(&access.id, user_id).await?;
            let election_status = if access.status == ElectionStatus::Final
                && rp.as_ref().is_none_or(|r| r.status == ElectionStatus::Final)
            {
                ElectionStatus::Final
            } else {
                ElectionStatus::Open
            };

            let mut case = build_case(
                &access,
                &access_vote,
                rp_vote.as_ref(),
                front_end_id,
                (total_votes, votes_logged),
                is_final_vote,
                election_status,
            );
            case.rp_election_id = rp.map(|r| r.id);
            cases.push(case);
        }
        Ok(cases)
    }

    /// Open data owner elections the user holds a DATA_OWNER vote on.
    pub async fn describe_data_owner_pending_cases(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<DataOwnerPendingCase>> {
        let elections = self
            .elections
            .find_by_type_and_status(ElectionType::DataSet, ElectionStatus::Open)
            .await?;

        let mut cases = Vec::new();
        for election in elections {
            let Some(vote) = self
                .user_vote(&election.id, user_id, VoteType::DataOwner)
                .await?
            else {
                continue;
            };
            let dar_code = self
                .references
                .dar(&election.reference_id)
                .await?
                .map(|d| d.dar_code);
            let dataset_name = match election.dataset_id.as_deref() {
                Some(id) => self.references.dataset(id).await?.map(|d| d.name),
                None => None,
            };

            cases.push(DataOwnerPendingCase {
                election_id: election.id,
                reference_id: election.reference_id,
                dar_code,
                dataset_id: election.dataset_id,
                dataset_name,
                vote_id: vote.id.clone(),
                already_voted: vote.is_cast(),
                has_concerns: vote.has_concerns,
            });
        }
        Ok(cases)
    }

    async fn user_vote(
        &self,
        election_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        self.votes
            .find_by_election_user_and_type(election_id, user_id, vote_type)
            .await
    }

    /// `(total, cast)` over the DAC votes of an election.
    async fn dac_progress(&self, election_id: &str) -> AppResult<(usize, usize)> {
        let votes = self
            .votes
            .find_by_election_and_type(election_id, VoteType::Dac)
            .await?;
        let logged = votes.iter().filter(|v| v.is_cast()).count();
        Ok((votes.len(), logged))
    }

    async fn chair_vote_cast(&self, election_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self
            .user_vote(election_id, user_id, VoteType::Chairperson)
            .await?
            .is_some_and(|v| v.is_cast()))
    }

    async fn order_for(&self, user_id: &str, mut cases: Vec<PendingCase>) -> AppResult<Vec<PendingCase>> {
        if self.committee.is_chairperson(user_id).await? {
            cases.sort_by(chair_order);
        } else {
            cases.sort_by_key(member_rank);
        }
        Ok(cases)
    }
}

fn build_case(
    election: &election::Model,
    vote: &vote::Model,
    rp_vote: Option<&vote::Model>,
    front_end_id: Option<String>,
    (total_votes, votes_logged): (usize, usize),
    is_final_vote: bool,
    election_status: ElectionStatus,
) -> PendingCase {
    let already_voted = vote.is_cast() && rp_vote.is_none_or(vote::Model::is_cast);
    let is_reminder_sent = vote.reminder_sent || rp_vote.is_some_and(|v| v.reminder_sent);
    PendingCase {
        election_id: election.id.clone(),
        reference_id: election.reference_id.clone(),
        front_end_id,
        vote_id: vote.id.clone(),
        rp_vote_id: rp_vote.map(|v| v.id.clone()),
        rp_election_id: None,
        total_votes,
        votes_logged,
        logged: format!("{votes_logged}/{total_votes}"),
        already_voted,
        is_reminder_sent,
        status: if already_voted {
            CaseStatus::Editable
        } else {
            CaseStatus::Pending
        },
        is_final_vote: already_voted && is_final_vote,
        election_status,
    }
}

/// Fully logged cases first. The rest by progress, most advanced first.
/// Cases the chairperson already voted on lead within each tier.
fn chair_order(a: &PendingCase, b: &PendingCase) -> Ordering {
    b.is_ready_to_collect()
        .cmp(&a.is_ready_to_collect())
        .then_with(|| {
            if a.is_ready_to_collect() {
                Ordering::Equal
            } else {
                (b.votes_logged, b.total_votes).cmp(&(a.votes_logged, a.total_votes))
            }
        })
        .then_with(|| b.already_voted.cmp(&a.already_voted))
}

/// Reminded cases, then unvoted ones, then voted ones.
const fn member_rank(case: &PendingCase) -> u8 {
    if case.is_reminder_sent {
        0
    } else if !case.already_voted {
        1
    } else {
        2
    }
}
