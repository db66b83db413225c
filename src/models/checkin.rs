//! Scan and check-in request/response models.

use serde::{Deserialize, Serialize};

use super::{Entity, EntityRole};

/// Terminal outcome of one scan or check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInStatus {
    Success,
    Duplicate,
    NotFound,
    Error,
    SelectionRequired,
}

/// Discriminated result handed back to the scanner or dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanResult {
    /// Transition applied
    Success { entity: Entity, message: String },
    /// Already checked in; nothing written
    Duplicate { entity: Entity, message: String },
    /// No document matched the code
    NotFound { code: String, message: String },
    /// The transactional write failed or the record is unusable
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        entity: Option<Entity>,
        message: String,
    },
    /// Document found but the operator has to pick the person
    #[serde(rename_all = "camelCase")]
    SelectionRequired {
        parent_doc_id: String,
        entities: Vec<Entity>,
        message: String,
    },
}

impl ScanResult {
    pub fn status(&self) -> CheckInStatus {
        match self {
            ScanResult::Success { .. } => CheckInStatus::Success,
            ScanResult::Duplicate { .. } => CheckInStatus::Duplicate,
            ScanResult::NotFound { .. } => CheckInStatus::NotFound,
            ScanResult::Error { .. } => CheckInStatus::Error,
            ScanResult::SelectionRequired { .. } => CheckInStatus::SelectionRequired,
        }
    }

    pub fn entity(&self) -> Option<&Entity> {
        match self {
            ScanResult::Success { entity, .. } | ScanResult::Duplicate { entity, .. } => {
                Some(entity)
            }
            ScanResult::Error { entity, .. } => entity.as_ref(),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScanResult::Success { message, .. }
            | ScanResult::Duplicate { message, .. }
            | ScanResult::NotFound { message, .. }
            | ScanResult::Error { message, .. }
            | ScanResult::SelectionRequired { message, .. } => message,
        }
    }
}

/// Request body for `POST /api/scan`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

/// Request body for `POST /api/checkin`: the operator's pick after a selection prompt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub parent_doc_id: String,
    pub role: EntityRole,
    #[serde(default)]
    pub member_index: Option<i64>,
}

/// Request body for the dashboard attendance toggle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdateRequest {
    pub role: EntityRole,
    #[serde(default)]
    pub member_index: Option<i64>,
    pub checked_in: bool,
}
