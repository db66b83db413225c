//! Record normalizer.
//!
//! Flattens the two document shapes into [`Entity`] lists. Pure functions: the
//! same document always yields the same entities in source order (leader first,
//! then members in array order). Sorting is left to the roster projections.

use crate::models::{
    has_text, CandidateRecord, Entity, EntityRole, RecordSource, TeamRecord,
};

pub const DEFAULT_TEAM_NAME: &str = "Individual";
pub const DEFAULT_EVENT_NAME: &str = "Innovate 2026";

/// Placeholder some imports wrote instead of leaving the ticket empty.
const MISSING_TICKET: &str = "N/A";

/// Expand a team document into its leader and named members.
pub fn normalize_team(record: &TeamRecord) -> Vec<Entity> {
    let team = non_blank(&record.team)
        .or_else(|| non_blank(&record.legacy_team))
        .unwrap_or(DEFAULT_TEAM_NAME)
        .to_string();
    let event_name = non_blank(&record.legacy_event)
        .or_else(|| non_blank(&record.event_name))
        .unwrap_or(DEFAULT_EVENT_NAME)
        .to_string();

    let mut entities = Vec::with_capacity(record.members.len() + 1);

    if let Some(name) = non_blank(&record.name) {
        entities.push(Entity {
            unique_id: format!("{}_leader", record.id),
            parent_doc_id: record.id.clone(),
            name: name.to_string(),
            role: EntityRole::Leader,
            member_index: -1,
            checked_in: record.checked_in,
            check_in_time: record.check_in_time.clone(),
            team: team.clone(),
            event_name: event_name.clone(),
            barcode: ticket_code(&record.ticket_id)
                .map(str::to_string)
                .or_else(|| Some(record.id.clone())),
            source: RecordSource::Rsvp,
        });
    }

    for (index, member) in record.members.iter().enumerate() {
        let Some(name) = non_blank(&member.name) else {
            continue;
        };
        entities.push(Entity {
            unique_id: format!("{}_member_{}", record.id, index),
            parent_doc_id: record.id.clone(),
            name: name.to_string(),
            role: EntityRole::Member,
            member_index: index as i64,
            checked_in: member.checked_in,
            check_in_time: member.check_in_time.clone(),
            team: team.clone(),
            event_name: event_name.clone(),
            barcode: ticket_code(&member.ticket_id).map(str::to_string),
            source: RecordSource::Rsvp,
        });
    }

    entities
}

/// Expand every document, preserving document order.
pub fn normalize_all(records: &[TeamRecord]) -> Vec<Entity> {
    records.iter().flat_map(normalize_team).collect()
}

/// A candidate document is always exactly one person.
pub fn normalize_candidate(record: &CandidateRecord) -> Entity {
    let role = match record.role.as_deref() {
        Some(r) if r.to_lowercase().contains("leader") => EntityRole::Leader,
        _ => EntityRole::Member,
    };

    Entity {
        unique_id: format!("{}_candidate", record.id),
        parent_doc_id: record.id.clone(),
        name: record.name.clone(),
        role,
        member_index: -1,
        checked_in: record.checked_in,
        check_in_time: None,
        team: non_blank(&record.team_name)
            .unwrap_or(DEFAULT_TEAM_NAME)
            .to_string(),
        event_name: DEFAULT_EVENT_NAME.to_string(),
        barcode: Some(record.id.clone()),
        source: RecordSource::Unstop,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    if has_text(value) {
        value.as_deref().map(str::trim)
    } else {
        None
    }
}

/// The scannable form of a stored ticket id: trimmed, never blank or the placeholder.
pub fn ticket_code(value: &Option<String>) -> Option<&str> {
    non_blank(value).filter(|t| *t != MISSING_TICKET)
}

/// True for scanned codes no badge can carry.
pub fn is_placeholder_code(code: &str) -> bool {
    code == MISSING_TICKET
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberRecord;

    fn member(name: Option<&str>, ticket: Option<&str>) -> MemberRecord {
        MemberRecord {
            name: name.map(str::to_string),
            ticket_id: ticket.map(str::to_string),
            ..Default::default()
        }
    }

    fn team(name: Option<&str>, members: Vec<MemberRecord>) -> TeamRecord {
        TeamRecord {
            id: "T1".to_string(),
            name: name.map(str::to_string),
            ticket_id: Some("A1".to_string()),
            email: None,
            team: Some("Rustaceans".to_string()),
            event_name: None,
            legacy_event: None,
            legacy_team: None,
            checked_in: false,
            check_in_time: None,
            members,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_leader_then_members_in_order() {
        let record = team(
            Some("Alice"),
            vec![
                member(Some("Zed"), Some("Z1")),
                member(Some("Bob"), Some("B1")),
                member(Some("Cara"), None),
            ],
        );
        let entities = normalize_team(&record);

        assert_eq!(entities.len(), 4);
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Zed", "Bob", "Cara"]);
        assert_eq!(entities[0].role, EntityRole::Leader);
        assert_eq!(entities[0].member_index, -1);
        assert_eq!(entities[2].member_index, 1);
        assert!(entities.iter().all(|e| e.team == "Rustaceans"));
        assert!(entities.iter().all(|e| e.parent_doc_id == "T1"));
    }

    #[test]
    fn test_unnamed_members_are_skipped() {
        let record = team(
            Some("Alice"),
            vec![
                member(None, Some("X1")),
                member(Some("Bob"), Some("B1")),
                member(Some("   "), Some("X2")),
            ],
        );
        let entities = normalize_team(&record);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].name, "Bob");
        // Index still points into the stored array
        assert_eq!(entities[1].member_index, 1);
    }

    #[test]
    fn test_no_leader_name_yields_members_only() {
        let record = team(None, vec![member(Some("Bob"), Some("B1"))]);
        let entities = normalize_team(&record);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].role, EntityRole::Member);
    }

    #[test]
    fn test_defaults_and_barcodes() {
        let mut record = team(Some("Alice"), vec![member(Some("Bob"), Some("N/A"))]);
        record.team = None;
        record.ticket_id = None;
        let entities = normalize_team(&record);

        assert_eq!(entities[0].team, DEFAULT_TEAM_NAME);
        assert_eq!(entities[0].event_name, DEFAULT_EVENT_NAME);
        assert_eq!(entities[0].barcode.as_deref(), Some("T1"));
        assert_eq!(entities[1].barcode, None);
    }

    #[test]
    fn test_legacy_team_and_event_fields() {
        let mut record = team(Some("Alice"), vec![member(Some("Bob"), Some("B1"))]);
        record.team = None;
        record.legacy_team = Some("Old Guard".to_string());
        record.event_name = Some("Innovate".to_string());
        record.legacy_event = Some("Hack Day".to_string());
        let entities = normalize_team(&record);

        assert!(entities.iter().all(|e| e.team == "Old Guard"));
        assert!(entities.iter().all(|e| e.event_name == "Hack Day"));

        record.team = Some("Rustaceans".to_string());
        record.legacy_event = Some("  ".to_string());
        let entities = normalize_team(&record);
        assert_eq!(entities[0].team, "Rustaceans");
        assert_eq!(entities[0].event_name, "Innovate");
    }

    #[test]
    fn test_ticket_code_trims_and_rejects_placeholder() {
        assert_eq!(ticket_code(&Some(" T9 ".to_string())), Some("T9"));
        assert_eq!(ticket_code(&Some("N/A".to_string())), None);
        assert_eq!(ticket_code(&Some(" N/A ".to_string())), None);
        assert_eq!(ticket_code(&Some("".to_string())), None);
        assert_eq!(ticket_code(&None), None);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let record = team(Some("Alice"), vec![member(Some("Bob"), Some("B1"))]);
        assert_eq!(normalize_team(&record), normalize_team(&record));
    }

    #[test]
    fn test_candidate_role_mapping() {
        let candidate = CandidateRecord {
            id: "U7".to_string(),
            name: "Priya".to_string(),
            email: "priya@example.com".to_string(),
            team_name: None,
            role: Some("Team Leader".to_string()),
            checked_in: true,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        };
        let entity = normalize_candidate(&candidate);
        assert_eq!(entity.role, EntityRole::Leader);
        assert_eq!(entity.team, DEFAULT_TEAM_NAME);
        assert_eq!(entity.source, RecordSource::Unstop);
        assert!(entity.checked_in);
    }
}
