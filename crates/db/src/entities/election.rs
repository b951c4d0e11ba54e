//! Election entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of election.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ElectionType {
    /// Data Use Limitation review of a consent.
    #[sea_orm(string_value = "TranslateDUL")]
    TranslateDul,
    /// Data Access Request review.
    #[sea_orm(string_value = "DataAccess")]
    DataAccess,
    /// Research Purpose review paired with a data access election.
    #[sea_orm(string_value = "RP")]
    Rp,
    /// Data owner approval of one dataset referenced by a DAR.
    #[sea_orm(string_value = "DataSet")]
    DataSet,
}

impl ElectionType {
    /// Human-readable label used in status history views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TranslateDul => "Data Use Limitation",
            Self::DataAccess => "Data Access Request",
            Self::Rp => "Research Purpose",
            Self::DataSet => "Data Set",
        }
    }

    /// Whether elections of this type reference a DAR (as opposed to a consent).
    #[must_use]
    pub const fn references_dar(self) -> bool {
        !matches!(self, Self::TranslateDul)
    }
}

/// Election status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ElectionStatus {
    /// Accepting votes.
    #[sea_orm(string_value = "Open")]
    Open,
    /// All required votes logged and the decision recorded.
    #[sea_orm(string_value = "Closed")]
    Closed,
    /// Superseded or withdrawn.
    #[sea_orm(string_value = "Canceled")]
    Canceled,
    /// Data access decision resolved.
    #[sea_orm(string_value = "Final")]
    Final,
}

impl ElectionStatus {
    /// Parses a caller-supplied status value.
    ///
    /// Returns `None` for anything other than the stored spellings.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Open" => Some(Self::Open),
            "Closed" => Some(Self::Closed),
            "Canceled" => Some(Self::Canceled),
            "Final" => Some(Self::Final),
            _ => None,
        }
    }

    /// Stored spelling of every status, in declaration order.
    #[must_use]
    pub const fn valid_values() -> &'static str {
        "Open, Closed, Canceled, Final"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "election")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub election_type: ElectionType,

    #[sea_orm(indexed)]
    pub status: ElectionStatus,

    /// Consent id for DUL elections, DAR id otherwise.
    #[sea_orm(indexed)]
    pub reference_id: String,

    /// Only set for `DataSet` elections.
    #[sea_orm(nullable)]
    pub dataset_id: Option<String>,

    pub create_date: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_update: Option<DateTimeWithTimeZone>,

    /// Chairperson decision, mirrored from the CHAIRPERSON vote.
    #[sea_orm(nullable)]
    pub final_vote: Option<bool>,

    #[sea_orm(nullable)]
    pub final_vote_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub final_rationale: Option<String>,

    /// Data owner / data access approval outcome.
    #[sea_orm(nullable)]
    pub final_access_vote: Option<bool>,

    /// Snapshot of the governing restriction at creation time.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub use_restriction: Option<Json>,

    #[sea_orm(column_type = "Text", nullable)]
    pub translated_use_restriction: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the election is still accepting votes.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ElectionStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(ElectionStatus::parse("Open"), Some(ElectionStatus::Open));
        assert_eq!(ElectionStatus::parse("Final"), Some(ElectionStatus::Final));
        assert_eq!(ElectionStatus::parse("open"), None);
        assert_eq!(ElectionStatus::parse("Pending"), None);
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(ElectionType::TranslateDul.label(), "Data Use Limitation");
        assert_eq!(ElectionType::DataAccess.label(), "Data Access Request");
        assert!(!ElectionType::TranslateDul.references_dar());
        assert!(ElectionType::Rp.references_dar());
    }
}
