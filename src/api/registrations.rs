//! Registration lookup across both attendee sources.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::engine::normalize::DEFAULT_TEAM_NAME;
use crate::errors::AppError;
use crate::events::ChangeEvent;
use crate::models::{
    CandidateRecord, RecordSource, RegistrationProfile, RegistrationQuery, TeamRecord,
    UpdateRegistrationRequest,
};
use crate::AppState;

const DEFAULT_ROLE: &str = "Participant";

/// GET /api/registrations?email= - Find a registration, rsvp teams first.
pub async fn find_registration(
    State(state): State<AppState>,
    Query(params): Query<RegistrationQuery>,
) -> ApiResult<RegistrationProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let email = params.email.trim();

    if email.is_empty() {
        return error(
            AppError::Validation("Email is required".to_string()),
            revision_id,
        );
    }

    match state.repo.find_team_by_email(email).await {
        Ok(Some(team)) => return success(team_profile(&team), revision_id),
        Ok(None) => {}
        Err(e) => return error(e, revision_id),
    }

    match state.repo.find_candidate_by_email(email).await {
        Ok(Some(candidate)) => success(candidate_profile(&candidate), revision_id),
        Ok(None) => error(
            AppError::NotFound("No registration found with this email".to_string()),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/registrations/:source/:id - Correct name, email or team.
pub async fn update_registration(
    State(state): State<AppState>,
    Path((source, id)): Path<(String, String)>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> ApiResult<RegistrationProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return error(
            AppError::Validation("Name cannot be empty".to_string()),
            revision_id,
        );
    }

    let updated = match RecordSource::parse(&source) {
        Some(RecordSource::Rsvp) => state
            .repo
            .update_team_profile(&id, &request)
            .await
            .map(|team| {
                state.feed.publish(ChangeEvent::TeamUpdated {
                    parent_doc_id: team.id.clone(),
                });
                team_profile(&team)
            }),
        Some(RecordSource::Unstop) => state
            .repo
            .update_candidate_profile(&id, &request)
            .await
            .map(|candidate| {
                state.feed.publish(ChangeEvent::CandidatesUpdated);
                candidate_profile(&candidate)
            }),
        None => Err(AppError::BadRequest(format!(
            "Unknown registration source {}",
            source
        ))),
    };

    match updated {
        Ok(profile) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(profile, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

fn team_profile(team: &TeamRecord) -> RegistrationProfile {
    RegistrationProfile {
        id: team.id.clone(),
        source: RecordSource::Rsvp,
        name: team.name.clone().unwrap_or_default(),
        email: team.email.clone().unwrap_or_default(),
        team: team
            .team
            .clone()
            .or_else(|| team.legacy_team.clone())
            .unwrap_or_else(|| DEFAULT_TEAM_NAME.to_string()),
        role: DEFAULT_ROLE.to_string(),
    }
}

fn candidate_profile(candidate: &CandidateRecord) -> RegistrationProfile {
    RegistrationProfile {
        id: candidate.id.clone(),
        source: RecordSource::Unstop,
        name: candidate.name.clone(),
        email: candidate.email.clone(),
        team: candidate
            .team_name
            .clone()
            .unwrap_or_else(|| DEFAULT_TEAM_NAME.to_string()),
        role: candidate
            .role
            .clone()
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
    }
}
