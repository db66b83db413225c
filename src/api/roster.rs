//! Roster endpoints.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::engine::normalize::normalize_all;
use crate::engine::roster::{group_by_team, roster_view};
use crate::engine::store::TeamStore;
use crate::models::{AttendanceGroup, RosterView};
use crate::AppState;

/// GET /api/attendees - Every checkable person, sorted by name, with counters.
pub async fn list_attendees(State(state): State<AppState>) -> ApiResult<RosterView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_teams().await {
        Ok(teams) => success(roster_view(normalize_all(&teams)), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/attendance - Attendance grouped by team.
pub async fn list_attendance(State(state): State<AppState>) -> ApiResult<Vec<AttendanceGroup>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_teams().await {
        Ok(teams) => success(group_by_team(normalize_all(&teams)), revision_id),
        Err(e) => error(e, revision_id),
    }
}
