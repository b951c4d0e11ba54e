//! Data Access Request entity.
//!
//! DAR bodies live apart from election rows; writes to this table never
//! share a transaction with election or vote writes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_access_request")]
pub struct Model {
    /// DAR reference id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human-readable code, e.g. `DAR-12`.
    pub dar_code: String,

    /// Requesting researcher.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Requested dataset ids, in request order.
    #[sea_orm(column_type = "JsonBinary")]
    pub dataset_ids: Json,

    /// Structured research purpose restriction; absent means manual review.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub restriction: Option<Json>,

    #[sea_orm(column_type = "Text", nullable)]
    pub translated_restriction: Option<String>,

    /// Manage-view ordering key.
    pub sort_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Requested dataset ids.
    #[must_use]
    pub fn dataset_id_list(&self) -> Vec<String> {
        self.dataset_ids
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
