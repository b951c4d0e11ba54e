//! Consent (Data Use Limitation) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name shown to committee members.
    pub name: String,

    /// Structured restriction expression.
    #[sea_orm(column_type = "JsonBinary")]
    pub use_restriction: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub translated_use_restriction: Option<String>,

    #[sea_orm(default_value = false)]
    pub requires_manual_review: bool,

    /// Manage-view ordering key.
    pub sort_date: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_update: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dataset::Entity")]
    Dataset,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
