//! Errors for the check-in backend.
//!
//! [`AppError`] covers both the HTTP surface and the check-in engine. Engine
//! failures (an empty document, an unknown slot, a lost attendance race) keep
//! their own variants so they reach the scanner as distinct codes instead of
//! generic not-found or conflict errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::EntityTarget;

/// Machine-readable codes carried in the error envelope.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
    pub const EMPTY_RECORD: &str = "EMPTY_RECORD";
    pub const SLOT_NOT_FOUND: &str = "SLOT_NOT_FOUND";
    pub const TRANSACTION_CONFLICT: &str = "TRANSACTION_CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    /// A document, candidate or registration does not exist
    NotFound(String),
    Validation(String),
    /// A profile write raced another writer (registration corrections, imports)
    Conflict {
        message: String,
        current_version: i64,
    },
    /// A located document yields no checkable person
    EmptyRecord { doc_id: String },
    /// The document exists but has no named person at the requested slot
    SlotNotFound {
        doc_id: String,
        target: EntityTarget,
    },
    /// Another attendance transaction committed first
    TransactionConflict { doc_id: String, version: i64 },
    Database(String),
    Internal(String),
    BadRequest(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::SlotNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } | AppError::TransactionConflict { .. } => {
                StatusCode::CONFLICT
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict { .. } => codes::VERSION_MISMATCH,
            AppError::EmptyRecord { .. } => codes::EMPTY_RECORD,
            AppError::SlotNotFound { .. } => codes::SLOT_NOT_FOUND,
            AppError::TransactionConflict { .. } => codes::TRANSACTION_CONFLICT,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Human-readable message; shown verbatim on the scanner for engine failures.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::Conflict { message, .. } => message.clone(),
            AppError::EmptyRecord { doc_id } => format!("Empty record found for {}", doc_id),
            AppError::SlotNotFound { doc_id, target } => match target {
                EntityTarget::Leader => format!("No leader registered in {}", doc_id),
                EntityTarget::Member(index) => {
                    format!("No member at position {} in {}", index, doc_id)
                }
            },
            AppError::TransactionConflict { doc_id, .. } => {
                format!("{} was updated by another scan, try again", doc_id)
            }
        }
    }

    /// Version the client should re-read from, for conflict errors.
    fn current_version(&self) -> Option<i64> {
        match self {
            AppError::Conflict {
                current_version, ..
            } => Some(*current_version),
            AppError::TransactionConflict { version, .. } => Some(*version),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Primary-key collisions on insert; every other database error is passed through.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// `{success: false, error, revisionId}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        let details = error
            .current_version()
            .map(|version| serde_json::json!({ "currentVersion": version }));

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
            revision_id,
        }
    }
}

/// An error rendered together with the revision the client last saw.
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
