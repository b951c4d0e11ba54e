//! Election and vote services.

#![allow(missing_docs)]

pub mod committee;
pub mod election;
pub mod locks;
pub mod match_engine;
pub mod notification;
pub mod pending_case;
pub mod reference;
pub mod review_results;
pub mod vote;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use committee::CommitteeDirectory;
pub use election::{
    ClosedElection, CreateElectionInput, DatasetElectionStatus, ElectionService,
    ElectionStatusRow, UpdateElectionInput,
};
pub use locks::{ElectionGuard, ElectionLocks};
pub use match_engine::{MatchEngine, MatchEngineService, NoOpMatchEngine};
pub use notification::{NoOpNotificationSink, NotificationSink, NotificationSinkService};
pub use pending_case::{CaseStatus, DataOwnerPendingCase, PendingCase, PendingCaseService};
pub use reference::{Reference, ReferenceResolver};
pub use review_results::{ElectionReview, ReviewResultsService, ReviewVote, VoteTally};
pub use vote::{CastVoteInput, VoteService};
pub use workflow::{
    DataAccessReview, DataOwnerVoteOutcome, FinalAccessOutcome, ReviewWorkflowService,
};
