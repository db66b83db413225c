//! Team document endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::engine::store::TeamStore;
use crate::errors::AppError;
use crate::events::ChangeEvent;
use crate::models::{
    has_text, AttendanceUpdateRequest, CreateTeamRequest, Entity, EntityTarget, RevisionInfo,
    TeamRecord,
};
use crate::AppState;

/// GET /api/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state
        .repo
        .get_revision_info()
        .await
        .map_err(|e| crate::errors::AppErrorWithRevision {
            error: e,
            revision_id: 0,
        })?;

    success(revision_info.clone(), revision_info.revision_id)
}

/// GET /api/teams - List all team documents.
pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Vec<TeamRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_teams().await {
        Ok(teams) => success(teams, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/teams/:id - Get a single team document.
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TeamRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_team(&id).await {
        Ok(Some(team)) => success(team, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Team {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/teams - Register a team.
pub async fn create_team(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> ApiResult<TeamRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    // A record nobody can check in to is rejected up front
    let addressable =
        has_text(&request.name) || request.members.iter().any(|m| has_text(&m.name));
    if !addressable {
        return error(
            AppError::Validation("A team needs a leader name or at least one named member".to_string()),
            revision_id,
        );
    }

    match state.repo.create_team(&request).await {
        Ok(team) => {
            tracing::info!(doc = %team.id, members = team.members.len(), "Team registered");
            state.feed.publish(ChangeEvent::TeamUpdated {
                parent_doc_id: team.id.clone(),
            });
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(team, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/teams/:id - Delete a whole team.
pub async fn delete_team(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_team(&id).await {
        Ok(()) => {
            tracing::info!(doc = %id, "Team deleted");
            state.feed.publish(ChangeEvent::TeamDeleted { parent_doc_id: id });
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/teams/:id/attendance - Dashboard check-in/check-out toggle.
pub async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AttendanceUpdateRequest>,
) -> ApiResult<Entity> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(target) = EntityTarget::from_parts(request.role, request.member_index) else {
        return error(
            AppError::Validation("memberIndex is required for members".to_string()),
            revision_id,
        );
    };

    match state
        .engine
        .set_attendance(&id, target, request.checked_in)
        .await
    {
        Ok(entity) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entity, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
