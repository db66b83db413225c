//! Team record model: the "rsvp" document shape.
//!
//! The leader's fields live at the document root; members are an embedded array.

use serde::{Deserialize, Serialize};

/// A member sub-record embedded in a team document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default)]
    pub check_in_time: Option<String>,
    /// Fields this service does not interpret; carried through array rewrites untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A team document keyed by an opaque document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Older imports wrote the event under `event` and the team under `team_name`
    #[serde(default, rename = "event", skip_serializing_if = "Option::is_none")]
    pub legacy_event: Option<String>,
    #[serde(default, rename = "team_name", skip_serializing_if = "Option::is_none")]
    pub legacy_team: Option<String>,
    pub checked_in: bool,
    pub check_in_time: Option<String>,
    pub members: Vec<MemberRecord>,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Replace the element at `index`, returning the full rewritten array.
///
/// The store has no partial array-element update, so member writes always go
/// through a complete copy of the list with exactly one slot changed.
pub fn replace_member(
    members: &[MemberRecord],
    index: usize,
    replacement: MemberRecord,
) -> Option<Vec<MemberRecord>> {
    if index >= members.len() {
        return None;
    }
    let mut rewritten = members.to_vec();
    rewritten[index] = replacement;
    Some(rewritten)
}

/// Present and not blank.
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Member entry in a create-team request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body for registering a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Document key; generated when omitted
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default, rename = "event")]
    pub legacy_event: Option<String>,
    #[serde(default, rename = "team_name")]
    pub legacy_team: Option<String>,
    #[serde(default)]
    pub members: Vec<CreateMemberRequest>,
}
