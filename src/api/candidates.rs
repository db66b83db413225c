//! Candidate (second registration source) endpoints.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::engine::normalize::normalize_candidate;
use crate::errors::AppError;
use crate::events::ChangeEvent;
use crate::models::{CandidateRecord, CreateCandidateRequest, Entity};
use crate::AppState;

/// GET /api/candidates - Candidates as normalized entities.
pub async fn list_candidates(State(state): State<AppState>) -> ApiResult<Vec<Entity>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_candidates().await {
        Ok(candidates) => success(
            candidates.iter().map(normalize_candidate).collect(),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/candidates - Import a candidate.
pub async fn create_candidate(
    State(state): State<AppState>,
    Json(request): Json<CreateCandidateRequest>,
) -> ApiResult<CandidateRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.name.trim().is_empty() || request.email.trim().is_empty() {
        return error(
            AppError::Validation("Candidate name and email are required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_candidate(&request).await {
        Ok(candidate) => {
            state.feed.publish(ChangeEvent::CandidatesUpdated);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(candidate, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
