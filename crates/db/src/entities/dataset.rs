//! Dataset entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dataset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Consent governing this dataset.
    #[sea_orm(indexed)]
    pub consent_id: String,

    /// Disabled datasets cannot be requested.
    #[sea_orm(default_value = true)]
    pub active: bool,

    /// Whether data owners must approve access.
    #[sea_orm(default_value = false)]
    pub needs_approval: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consent::Entity",
        from = "Column::ConsentId",
        to = "super::consent::Column::Id",
        on_delete = "Cascade"
    )]
    Consent,

    #[sea_orm(has_many = "super::dataset_owner::Entity")]
    DatasetOwner,
}

impl Related<super::consent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consent.def()
    }
}

impl Related<super::dataset_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatasetOwner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
