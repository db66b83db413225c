//! Scanner endpoints.
//!
//! Every outcome, including "not found" and write failures, is a regular
//! `ScanResult` so the scanner can show it and return to ready-to-scan.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CheckInRequest, EntityTarget, ScanRequest, ScanResult};
use crate::AppState;

/// POST /api/scan - Resolve a scanned code and check the person in.
pub async fn scan_code(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<ScanResult> {
    let result = state.engine.scan(&request.code).await;
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(result, revision_id)
}

/// POST /api/checkin - Check in the person the operator picked.
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<ScanResult> {
    let Some(target) = EntityTarget::from_parts(request.role, request.member_index) else {
        let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
        return error(
            AppError::Validation("memberIndex is required for members".to_string()),
            revision_id,
        );
    };

    let result = state.engine.check_in(&request.parent_doc_id, target).await;
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(result, revision_id)
}
