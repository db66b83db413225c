//! Candidate record model: the flat "unstop" export shape.

use serde::{Deserialize, Serialize};

/// One registrant per document, field names as exported by the registration platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    #[serde(rename = "Candidate's Name")]
    pub name: String,
    #[serde(rename = "Candidate's Email")]
    pub email: String,
    #[serde(rename = "Team Name", skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(rename = "Candidate role", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "checkedIn", default)]
    pub checked_in: bool,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

/// Request body for importing a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCandidateRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "Candidate's Name")]
    pub name: String,
    #[serde(rename = "Candidate's Email")]
    pub email: String,
    #[serde(rename = "Team Name", default)]
    pub team_name: Option<String>,
    #[serde(rename = "Candidate role", default)]
    pub role: Option<String>,
}
