//! Vote entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of vote row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum VoteType {
    /// Committee member vote.
    #[sea_orm(string_value = "DAC")]
    Dac,
    /// Chairperson decision.
    #[sea_orm(string_value = "CHAIRPERSON")]
    Chairperson,
    /// Final access decision on a data access election.
    #[sea_orm(string_value = "FINAL")]
    Final,
    /// Chairperson agreement with the automated match.
    #[sea_orm(string_value = "AGREEMENT")]
    Agreement,
    /// Data owner approval.
    #[sea_orm(string_value = "DATA_OWNER")]
    DataOwner,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub election_id: String,

    /// Voter.
    #[sea_orm(indexed)]
    pub dac_user_id: String,

    pub vote_type: VoteType,

    /// `None` until cast.
    #[sea_orm(nullable)]
    pub vote: Option<bool>,

    #[sea_orm(column_type = "Text", nullable)]
    pub rationale: Option<String>,

    #[sea_orm(nullable)]
    pub has_concerns: Option<bool>,

    /// Set when the vote is cast.
    #[sea_orm(nullable)]
    pub create_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub update_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = false)]
    pub reminder_sent: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::election::Entity",
        from = "Column::ElectionId",
        to = "super::election::Column::Id",
        on_delete = "Cascade"
    )]
    Election,
}

impl Related<super::election::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Election.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether a value has been cast.
    #[must_use]
    pub const fn is_cast(&self) -> bool {
        self.vote.is_some()
    }
}
