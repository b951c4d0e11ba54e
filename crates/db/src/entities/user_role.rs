//! Role assignment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Committee or platform role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "Chairperson")]
    Chairperson,
    #[sea_orm(string_value = "Member")]
    Member,
    #[sea_orm(string_value = "DataOwner")]
    DataOwner,
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Alumni")]
    Alumni,
    #[sea_orm(string_value = "Researcher")]
    Researcher,
}

impl Role {
    /// Roles that receive DAC and chairperson votes.
    #[must_use]
    pub const fn can_vote(self) -> bool {
        matches!(self, Self::Chairperson | Self::Member)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub role: Role,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dac_user::Entity",
        from = "Column::UserId",
        to = "super::dac_user::Column::Id",
        on_delete = "Cascade"
    )]
    DacUser,
}

impl Related<super::dac_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DacUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
