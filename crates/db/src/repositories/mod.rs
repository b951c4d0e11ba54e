//! Store traits and their database repositories.

pub mod committee;
pub mod consent;
pub mod data_access_request;
pub mod dataset;
pub mod election;
pub mod mail_message;
pub mod vote;

pub use committee::{CommitteeRepository, CommitteeStore, SharedCommitteeStore};
pub use consent::{ConsentRepository, ConsentStore, SharedConsentStore};
pub use data_access_request::{
    DataAccessRequestRepository, DataAccessRequestStore, SharedDataAccessRequestStore,
};
pub use dataset::{DatasetRepository, DatasetStore, SharedDatasetStore};
pub use election::{ElectionRepository, ElectionStore, SharedElectionStore};
pub use mail_message::{MailLogStore, MailMessageRepository, SharedMailLogStore};
pub use vote::{SharedVoteStore, VoteRepository, VoteStore};
