//! Election review projection.
//!
//! Reviews are read models: a missing election yields `None` rather than an
//! error, so callers can tell "no review yet" apart from a failure.

use dac_common::AppResult;
use dac_db::{
    entities::{
        consent,
        election::{self, ElectionStatus, ElectionType},
        vote::{self, VoteType},
    },
    repositories::{SharedElectionStore, SharedVoteStore},
};
use serde::Serialize;

use super::{committee::CommitteeDirectory, reference::ReferenceResolver};

/// A vote row with its voter's directory entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVote {
    pub vote: vote::Model,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Counts over the votes of a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub total: usize,
    pub cast: usize,
    pub approvals: usize,
    pub denials: usize,
    pub pending: usize,
}

impl VoteTally {
    fn over(votes: &[ReviewVote]) -> Self {
        votes.iter().fold(Self::default(), |mut tally, row| {
            tally.total += 1;
            match row.vote.vote {
                Some(true) => {
                    tally.cast += 1;
                    tally.approvals += 1;
                }
                Some(false) => {
                    tally.cast += 1;
                    tally.denials += 1;
                }
                None => tally.pending += 1,
            }
            tally
        })
    }
}

/// Everything shown when reviewing an election's outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionReview {
    pub election: election::Model,
    /// The consent behind the reference; for DARs, that of the first dataset.
    pub consent: Option<consent::Model>,
    pub votes: Vec<ReviewVote>,
    pub agreement_vote: Option<vote::Model>,
    pub tally: VoteTally,
}

/// Which votes of an election a review lists.
#[derive(Debug, Clone, Copy)]
enum VoteFilter {
    AllButChairperson,
    Only(VoteType),
}

impl VoteFilter {
    /// `None` lists every non-chairperson vote, `Some(true)` the FINAL votes
    /// and `Some(false)` the DAC votes.
    const fn from_final_access_flag(flag: Option<bool>) -> Self {
        match flag {
            None => Self::AllButChairperson,
            Some(true) => Self::Only(VoteType::Final),
            Some(false) => Self::Only(VoteType::Dac),
        }
    }

    fn keeps(self, vote: &vote::Model) -> bool {
        match self {
            Self::AllButChairperson => vote.vote_type != VoteType::Chairperson,
            Self::Only(vote_type) => vote.vote_type == vote_type,
        }
    }
}

#[derive(Clone)]
pub struct ReviewResultsService {
    elections: SharedElectionStore,
    votes: SharedVoteStore,
    references: ReferenceResolver,
    committee: CommitteeDirectory,
}

impl ReviewResultsService {
    /// Create a new review results service.
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

    /// Review of one election.
    ///
    /// `is_final_access` picks the listed votes: `Some(true)` for FINAL,
    /// `Some(false)` for DAC, `None` for everything but CHAIRPERSON.
    pub async fn describe_election_review_by_election_id(
        &self,
        election_id: &str,
        is_final_access: Option<bool>,
    ) -> AppResult<Option<ElectionReview>> {
        match self.elections.find_by_id(election_id).await? {
            Some(election) => Ok(Some(
                self.review(election, VoteFilter::from_final_access_flag(is_final_access))
                    .await?,
            )),
            None => Ok(None),
        }
    }

    /// Review of the most recently closed election on a reference.
    pub async fn describe_election_review_by_reference_id(
        &self,
        reference_id: &str,
    ) -> AppResult<Option<ElectionReview>> {
        let last_closed = self
            .elections
            .find_by_reference(reference_id)
            .await?
            .into_iter()
            .find(|e| e.status == ElectionStatus::Closed);
        match last_closed {
            Some(election) => Ok(Some(self.review(election, VoteFilter::AllButChairperson).await?)),
            None => Ok(None),
        }
    }

    /// Review of the newest election of a type, whatever its status.
    pub async fn describe_last_election_review_by_reference_id_and_type(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<ElectionReview>> {
        let last = self
            .elections
            .find_last_by_reference_and_type(reference_id, election_type, None)
            .await?;
        match last {
            Some(election) => Ok(Some(
                self.review(election, VoteFilter::Only(VoteType::Dac)).await?,
            )),
            None => Ok(None),
        }
    }

    /// DAC votes of the open election the chairperson is about to decide.
    pub async fn describe_collect_election_review(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<ElectionReview>> {
        let open = self
            .elections
            .find_open_by_reference_and_type(reference_id, election_type)
            .await?;
        match open {
            Some(election) => Ok(Some(
                self.review(election, VoteFilter::Only(VoteType::Dac)).await?,
            )),
            None => Ok(None),
        }
    }

    /// Review of the research purpose election paired with an access election.
    pub async fn describe_rp_election_review(
        &self,
        access_election_id: &str,
    ) -> AppResult<Option<ElectionReview>> {
        let Some(rp_id) = self
            .elections
            .find_rp_id_by_access_id(access_election_id)
            .await?
        else {
            return Ok(None);
        };
        match self.elections.find_by_id(&rp_id).await? {
            Some(rp) => Ok(Some(self.review(rp, VoteFilter::Only(VoteType::Dac)).await?)),
            None => Ok(None),
        }
    }

    pub async fn describe_agreement_vote(&self, election_id: &str) -> AppResult<Option<vote::Model>> {
        Ok(self
            .votes
            .find_by_election_and_type(election_id, VoteType::Agreement)
            .await?
            .into_iter()
            .next())
    }

    /// Whether any election of any type is open.
    pub async fn open_elections(&self) -> AppResult<bool> {
        Ok(self.elections.count_by_status(ElectionStatus::Open, None).await? > 0)
    }

    async fn review(&self, election: election::Model, filter: VoteFilter) -> AppResult<ElectionReview> {
        let votes: Vec<vote::Model> = self
            .votes
            .find_by_election(&election.id)
            .await?
            .into_iter()
            .filter(|v| filter.keeps(v))
            .collect();

        let voter_ids: Vec<String> = votes.iter().map(|v| v.dac_user_id.clone()).collect();
        let voters = self.committee.find_users(&voter_ids).await?;
        let votes: Vec<ReviewVote> = votes
            .into_iter()
            .map(|vote| {
                let voter = voters.iter().find(|u| u.id == vote.dac_user_id);
                ReviewVote {
                    display_name: voter.map(|u| u.display_name.clone()),
                    email: voter.map(|u| u.email.clone()),
                    vote,
                }
            })
            .collect();

        let agreement_vote = if election.election_type == ElectionType::DataAccess {
            self.describe_agreement_vote(&election.id).await?
        } else {
            None
        };
        let consent = self
            .references
            .consent_for_reference(&election.reference_id, election.election_type)
            .await?;

        Ok(ElectionReview {
            tally: VoteTally::over(&votes),
            election,
            consent,
            votes,
            agreement_vote,
        })
    }
}
