//! Read-side projections served to the dashboard and the public attendance page.

use serde::{Deserialize, Serialize};

use super::{Entity, RecordSource};

/// Headline counters shown above the attendee table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total: usize,
    pub checked_in: usize,
    pub pending: usize,
}

/// Flat attendee list plus counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub attendees: Vec<Entity>,
    pub stats: RosterStats,
}

/// Attendees sharing a team name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceGroup {
    pub team_name: String,
    pub members: Vec<Entity>,
}

/// Registration details found by email in either source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationProfile {
    pub id: String,
    pub source: RecordSource,
    pub name: String,
    pub email: String,
    pub team: String,
    pub role: String,
}

/// Query string for `GET /api/registrations`.
#[derive(Debug, Deserialize)]
pub struct RegistrationQuery {
    pub email: String,
}

/// Corrections submitted by a registrant.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRegistrationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
