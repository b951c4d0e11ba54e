//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_dac_user_table;
mod m20250301_000002_create_consent_table;
mod m20250301_000003_create_dataset_table;
mod m20250301_000004_create_data_access_request_table;
mod m20250301_000005_create_election_table;
mod m20250301_000006_create_vote_table;
mod m20250301_000007_create_access_rp_table;
mod m20250301_000008_create_mail_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_dac_user_table::Migration),
            Box::new(m20250301_000002_create_consent_table::Migration),
            Box::new(m20250301_000003_create_dataset_table::Migration),
            Box::new(m20250301_000004_create_data_access_request_table::Migration),
            Box::new(m20250301_000005_create_election_table::Migration),
            Box::new(m20250301_000006_create_vote_table::Migration),
            Box::new(m20250301_000007_create_access_rp_table::Migration),
            Box::new(m20250301_000008_create_mail_message_table::Migration),
        ]
    }
}
