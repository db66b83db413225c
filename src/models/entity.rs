//! Entity model: the unit of check-in, derived from a backing document.

use serde::{Deserialize, Serialize};

/// Position of a person inside their owning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityRole {
    Leader,
    Member,
}

/// Which collection an entity was materialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Rsvp,
    Unstop,
}

impl RecordSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rsvp" => Some(RecordSource::Rsvp),
            "unstop" => Some(RecordSource::Unstop),
            _ => None,
        }
    }
}

/// Addressable slot inside a team document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTarget {
    Leader,
    Member(usize),
}

impl EntityTarget {
    /// Build a target from the wire representation (`role`, `memberIndex`).
    pub fn from_parts(role: EntityRole, member_index: Option<i64>) -> Option<Self> {
        match role {
            EntityRole::Leader => Some(EntityTarget::Leader),
            EntityRole::Member => member_index
                .filter(|i| *i >= 0)
                .map(|i| EntityTarget::Member(i as usize)),
        }
    }
}

/// A single checkable person. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub unique_id: String,
    pub parent_doc_id: String,
    pub name: String,
    pub role: EntityRole,
    /// Index into the owning document's `members` array; `-1` for leaders
    pub member_index: i64,
    pub checked_in: bool,
    pub check_in_time: Option<String>,
    pub team: String,
    pub event_name: String,
    /// Code printed on this person's badge, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub source: RecordSource,
}

impl Entity {
    pub fn target(&self) -> Option<EntityTarget> {
        EntityTarget::from_parts(self.role, Some(self.member_index))
    }

    pub fn is_leader(&self) -> bool {
        self.role == EntityRole::Leader
    }
}
