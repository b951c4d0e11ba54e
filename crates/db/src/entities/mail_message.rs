//! Sent-notification log.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of notification recorded in the log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EmailType {
    #[sea_orm(string_value = "Collect")]
    Collect,
    #[sea_orm(string_value = "Reminder")]
    Reminder,
    #[sea_orm(string_value = "NewCase")]
    NewCase,
    #[sea_orm(string_value = "DisabledDatasets")]
    DisabledDatasets,
    #[sea_orm(string_value = "ClosedDatasetElections")]
    ClosedDatasetElections,
    #[sea_orm(string_value = "FlaggedDarApproved")]
    FlaggedDarApproved,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mail_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub election_id: String,

    pub reference_id: String,

    pub email_type: EmailType,

    pub create_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
