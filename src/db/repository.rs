//! Database repository for attendee documents.
//!
//! Uses prepared statements and transactions for data integrity. Every write
//! bumps the document `version` with a conditional UPDATE, so a stale writer
//! fails instead of overwriting a newer state.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::engine::store::{DocumentWrite, TeamStore, TxDecision, TxOutcome};
use crate::errors::{is_unique_violation, AppError};
use crate::models::{
    CandidateRecord, CreateCandidateRequest, CreateTeamRequest, MemberRecord, RevisionInfo,
    TeamRecord, UpdateRegistrationRequest,
};

/// `SELECT <every team column> FROM teams <tail>`
macro_rules! select_teams {
    ($tail:literal) => {
        concat!(
            "SELECT id, name, ticket_id, email, team, event_name, event, team_name, ",
            "checked_in, check_in_time, members, updated_at, version FROM teams ",
            $tail
        )
    };
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== TEAM OPERATIONS ====================

    /// Find the first team whose leader registered with `email`.
    pub async fn find_team_by_email(&self, email: &str) -> Result<Option<TeamRecord>, AppError> {
        let row = sqlx::query(
            select_teams!("WHERE email = ? ORDER BY id LIMIT 1")
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    /// Register a team document.
    pub async fn create_team(&self, request: &CreateTeamRequest) -> Result<TeamRecord, AppError> {
        let id = request
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if let Some(existing) = self.get_team(&id).await? {
            return Err(AppError::Conflict {
                message: format!("Team {} already exists", id),
                current_version: existing.version,
            });
        }

        let now = Utc::now().to_rfc3339();
        let ticket_id = trimmed_ticket(&request.ticket_id);
        let members: Vec<MemberRecord> = request
            .members
            .iter()
            .map(|m| MemberRecord {
                name: m.name.clone(),
                ticket_id: trimmed_ticket(&m.ticket_id),
                email: m.email.clone(),
                ..Default::default()
            })
            .collect();
        let members_json = serde_json::to_string(&members)?;

        sqlx::query(
            "INSERT INTO teams (id, name, ticket_id, email, team, event_name, event, team_name, checked_in, check_in_time, members, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?, 1)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&ticket_id)
        .bind(&request.email)
        .bind(&request.team)
        .bind(&request.event_name)
        .bind(&request.legacy_event)
        .bind(&request.legacy_team)
        .bind(&members_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict {
                    message: format!("Team {} already exists", id),
                    current_version: 1,
                }
            } else {
                AppError::from(e)
            }
        })?;

        self.increment_revision().await?;

        Ok(TeamRecord {
            id,
            name: request.name.clone(),
            ticket_id,
            email: request.email.clone(),
            team: request.team.clone(),
            event_name: request.event_name.clone(),
            legacy_event: request.legacy_event.clone(),
            legacy_team: request.legacy_team.clone(),
            checked_in: false,
            check_in_time: None,
            members,
            updated_at: now,
            version: 1,
        })
    }

    /// Correct the leader's registration details.
    pub async fn update_team_profile(
        &self,
        id: &str,
        request: &UpdateRegistrationRequest,
    ) -> Result<TeamRecord, AppError> {
        let existing = self
            .get_team(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;
        let name = request.name.clone().or(existing.name.clone());
        let email = request.email.clone().or(existing.email.clone());
        let team = request.team.clone().or(existing.team.clone());

        // Use conditional UPDATE with version check to prevent race conditions
        let result = sqlx::query(
            "UPDATE teams SET name = ?, email = ?, team = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(&name)
        .bind(&email)
        .bind(&team)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_team(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|t| t.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(TeamRecord {
            name,
            email,
            team,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Delete a whole team document.
    pub async fn delete_team(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Team {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== CANDIDATE OPERATIONS ====================

    /// List all candidates.
    pub async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, team_name, role, checked_in, updated_at, version FROM candidates ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(candidate_from_row).collect())
    }

    /// Get a candidate by ID.
    pub async fn get_candidate(&self, id: &str) -> Result<Option<CandidateRecord>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, team_name, role, checked_in, updated_at, version FROM candidates WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(candidate_from_row))
    }

    /// Find the first candidate registered with `email`.
    pub async fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CandidateRecord>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, team_name, role, checked_in, updated_at, version FROM candidates WHERE email = ? ORDER BY id LIMIT 1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(candidate_from_row))
    }

    /// Import a candidate.
    pub async fn create_candidate(
        &self,
        request: &CreateCandidateRequest,
    ) -> Result<CandidateRecord, AppError> {
        let id = request
            .id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if let Some(existing) = self.get_candidate(&id).await? {
            return Err(AppError::Conflict {
                message: format!("Candidate {} already exists", id),
                current_version: existing.version,
            });
        }

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO candidates (id, name, email, team_name, role, checked_in, updated_at, version) VALUES (?, ?, ?, ?, ?, 0, ?, 1)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.team_name)
        .bind(&request.role)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict {
                    message: format!("Candidate {} already exists", id),
                    current_version: 1,
                }
            } else {
                AppError::from(e)
            }
        })?;

        self.increment_revision().await?;

        Ok(CandidateRecord {
            id,
            name: request.name.clone(),
            email: request.email.clone(),
            team_name: request.team_name.clone(),
            role: request.role.clone(),
            checked_in: false,
            updated_at: now,
            version: 1,
        })
    }

    /// Correct a candidate's registration details.
    pub async fn update_candidate_profile(
        &self,
        id: &str,
        request: &UpdateRegistrationRequest,
    ) -> Result<CandidateRecord, AppError> {
        let existing = self
            .get_candidate(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidate {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;
        let name = request.name.clone().unwrap_or(existing.name.clone());
        let email = request.email.clone().unwrap_or(existing.email.clone());
        let team_name = request.team.clone().or(existing.team_name.clone());

        let result = sqlx::query(
            "UPDATE candidates SET name = ?, email = ?, team_name = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(&name)
        .bind(&email)
        .bind(&team_name)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_candidate(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|c| c.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(CandidateRecord {
            name,
            email,
            team_name,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }
}

impl TeamStore for Repository {
    async fn get_team(&self, id: &str) -> Result<Option<TeamRecord>, AppError> {
        let row = sqlx::query(
            select_teams!("WHERE id = ?")
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn find_team_by_ticket(&self, ticket: &str) -> Result<Option<TeamRecord>, AppError> {
        let row = sqlx::query(
            select_teams!("WHERE TRIM(ticket_id) = ? ORDER BY id LIMIT 1")
        )
        .bind(ticket)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn list_teams(&self) -> Result<Vec<TeamRecord>, AppError> {
        let rows = sqlx::query(
            select_teams!("ORDER BY id")
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(team_from_row).collect()
    }

    async fn run_transaction<T, F>(&self, id: &str, body: F) -> Result<TxOutcome<T>, AppError>
    where
        T: Send,
        F: FnOnce(&TeamRecord) -> Result<TxDecision<T>, AppError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            select_teams!("WHERE id = ?")
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let record = row
            .as_ref()
            .map(team_from_row)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))?;

        let (write, value) = match body(&record)? {
            TxDecision::Abort(value) => {
                tx.rollback().await?;
                return Ok(TxOutcome::Aborted(value));
            }
            TxDecision::Commit(write, value) => (write, value),
        };

        let now = Utc::now().to_rfc3339();
        let new_version = record.version + 1;

        let result = match write {
            DocumentWrite::LeaderAttendance {
                checked_in,
                check_in_time,
            } => {
                sqlx::query(
                    "UPDATE teams SET checked_in = ?, check_in_time = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
                )
                .bind(checked_in as i32)
                .bind(&check_in_time)
                .bind(&now)
                .bind(new_version)
                .bind(id)
                .bind(record.version)
                .execute(&mut *tx)
                .await?
            }
            DocumentWrite::ReplaceMembers(members) => {
                let members_json = serde_json::to_string(&members)?;
                sqlx::query(
                    "UPDATE teams SET members = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
                )
                .bind(&members_json)
                .bind(&now)
                .bind(new_version)
                .bind(id)
                .bind(record.version)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            tracing::warn!(doc = id, version = record.version, "Attendance write lost a race");
            return Err(AppError::TransactionConflict {
                doc_id: id.to_string(),
                version: record.version,
            });
        }

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(TxOutcome::Committed(value))
    }
}

// Helper functions for row conversion

fn team_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TeamRecord, AppError> {
    let checked_in: i32 = row.get("checked_in");
    let members_str: String = row.get("members");
    let members: Vec<MemberRecord> = serde_json::from_str(&members_str).map_err(|e| {
        AppError::Internal(format!("Corrupt members array in team document: {}", e))
    })?;

    Ok(TeamRecord {
        id: row.get("id"),
        name: row.get("name"),
        ticket_id: row.get("ticket_id"),
        email: row.get("email"),
        team: row.get("team"),
        event_name: row.get("event_name"),
        legacy_event: row.get("event"),
        legacy_team: row.get("team_name"),
        checked_in: checked_in != 0,
        check_in_time: row.get("check_in_time"),
        members,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

/// Tickets are stored trimmed; blank becomes absent.
fn trimmed_ticket(ticket: &Option<String>) -> Option<String> {
    ticket
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn candidate_from_row(row: &sqlx::sqlite::SqliteRow) -> CandidateRecord {
    let checked_in: i32 = row.get("checked_in");
    CandidateRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        team_name: row.get("team_name"),
        role: row.get("role"),
        checked_in: checked_in != 0,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
