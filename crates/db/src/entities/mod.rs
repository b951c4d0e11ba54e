//! Database entities.

#![allow(missing_docs)]

pub mod access_rp;
pub mod consent;
pub mod dac_user;
pub mod data_access_request;
pub mod dataset;
pub mod dataset_owner;
pub mod election;
pub mod mail_message;
pub mod user_role;
pub mod vote;

pub use access_rp::Entity as AccessRp;
pub use consent::Entity as Consent;
pub use dac_user::Entity as DacUser;
pub use data_access_request::Entity as DataAccessRequest;
pub use dataset::Entity as Dataset;
pub use dataset_owner::Entity as DatasetOwner;
pub use election::Entity as Election;
pub use mail_message::Entity as MailMessage;
pub use user_role::Entity as UserRole;
pub use vote::Entity as Vote;
