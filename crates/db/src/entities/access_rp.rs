//! Link between a data access election and its research purpose election.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_rp")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub election_access_id: String,

    #[sea_orm(unique)]
    pub election_rp_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::election::Entity",
        from = "Column::ElectionAccessId",
        to = "super::election::Column::Id",
        on_delete = "Cascade"
    )]
    AccessElection,

    #[sea_orm(
        belongs_to = "super::election::Entity",
        from = "Column::ElectionRpId",
        to = "super::election::Column::Id",
        on_delete = "Cascade"
    )]
    RpElection,
}

impl ActiveModelBehavior for ActiveModel {}
