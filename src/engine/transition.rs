//! Attendance state transitions.
//!
//! Decides, against the document read inside the transaction, whether a slot
//! moves to the requested state and which write achieves it.

use super::normalize::normalize_team;
use super::store::{DocumentWrite, TxDecision};
use crate::errors::AppError;
use crate::models::{has_text, replace_member, Entity, EntityTarget, TeamRecord};

/// Plan moving `target` to `desired`.
///
/// Returns `Abort` with the current entity when it is already in the desired
/// state, otherwise `Commit` with the write and the entity as it will look
/// afterwards. `at` is stamped on check-in and cleared on check-out.
pub fn plan_transition(
    record: &TeamRecord,
    target: EntityTarget,
    desired: bool,
    at: &str,
) -> Result<TxDecision<Entity>, AppError> {
    let current = entity_at(record, target)?;
    if current.checked_in == desired {
        return Ok(TxDecision::Abort(current));
    }

    let check_in_time = desired.then(|| at.to_string());

    let write = match target {
        EntityTarget::Leader => DocumentWrite::LeaderAttendance {
            checked_in: desired,
            check_in_time: check_in_time.clone(),
        },
        EntityTarget::Member(index) => {
            let mut member = record.members[index].clone();
            member.checked_in = desired;
            member.check_in_time = check_in_time.clone();
            let members = replace_member(&record.members, index, member).ok_or_else(|| {
                AppError::SlotNotFound {
                    doc_id: record.id.clone(),
                    target,
                }
            })?;
            DocumentWrite::ReplaceMembers(members)
        }
    };

    let updated = Entity {
        checked_in: desired,
        check_in_time,
        ..current
    };
    Ok(TxDecision::Commit(write, updated))
}

/// Materialize the entity for one slot of a document.
pub fn entity_at(record: &TeamRecord, target: EntityTarget) -> Result<Entity, AppError> {
    let exists = match target {
        EntityTarget::Leader => has_text(&record.name),
        EntityTarget::Member(index) => record
            .members
            .get(index)
            .is_some_and(|m| has_text(&m.name)),
    };
    if !exists {
        return Err(AppError::SlotNotFound {
            doc_id: record.id.clone(),
            target,
        });
    }

    normalize_team(record)
        .into_iter()
        .find(|e| e.target() == Some(target))
        .ok_or_else(|| AppError::Internal(format!("Attendee {:?} vanished", target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberRecord;

    const AT: &str = "2026-03-14T09:30:00+00:00";

    fn record() -> TeamRecord {
        TeamRecord {
            id: "T1".to_string(),
            name: Some("Alice".to_string()),
            ticket_id: Some("A1".to_string()),
            email: None,
            team: None,
            event_name: None,
            legacy_event: None,
            legacy_team: None,
            checked_in: false,
            check_in_time: None,
            members: vec![
                MemberRecord {
                    name: Some("Bob".to_string()),
                    ticket_id: Some("B1".to_string()),
                    ..Default::default()
                },
                MemberRecord {
                    name: Some("Cara".to_string()),
                    ticket_id: Some("C1".to_string()),
                    checked_in: true,
                    check_in_time: Some("2026-03-14T08:00:00+00:00".to_string()),
                    ..Default::default()
                },
            ],
            updated_at: AT.to_string(),
            version: 3,
        }
    }

    #[test]
    fn test_leader_check_in_is_root_update() {
        let decision = plan_transition(&record(), EntityTarget::Leader, true, AT).unwrap();
        match decision {
            TxDecision::Commit(DocumentWrite::LeaderAttendance { checked_in, check_in_time }, entity) => {
                assert!(checked_in);
                assert_eq!(check_in_time.as_deref(), Some(AT));
                assert_eq!(entity.name, "Alice");
                assert!(entity.checked_in);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_member_check_in_rewrites_whole_array() {
        let original = record();
        let decision = plan_transition(&original, EntityTarget::Member(0), true, AT).unwrap();
        match decision {
            TxDecision::Commit(DocumentWrite::ReplaceMembers(members), entity) => {
                assert_eq!(members.len(), 2);
                assert!(members[0].checked_in);
                assert_eq!(members[0].check_in_time.as_deref(), Some(AT));
                assert_eq!(members[1], original.members[1]);
                assert_eq!(entity.member_index, 0);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_already_checked_in_aborts() {
        let decision = plan_transition(&record(), EntityTarget::Member(1), true, AT).unwrap();
        match decision {
            TxDecision::Abort(entity) => {
                assert_eq!(entity.name, "Cara");
                assert!(entity.checked_in);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_check_out_clears_time() {
        let decision = plan_transition(&record(), EntityTarget::Member(1), false, AT).unwrap();
        match decision {
            TxDecision::Commit(DocumentWrite::ReplaceMembers(members), _) => {
                assert!(!members[1].checked_in);
                assert!(members[1].check_in_time.is_none());
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_missing_slot_is_not_found() {
        let err = plan_transition(&record(), EntityTarget::Member(5), true, AT).unwrap_err();
        assert!(matches!(
            err,
            AppError::SlotNotFound {
                target: EntityTarget::Member(5),
                ..
            }
        ));

        let mut leaderless = record();
        leaderless.name = None;
        let err = plan_transition(&leaderless, EntityTarget::Leader, true, AT).unwrap_err();
        assert!(matches!(err, AppError::SlotNotFound { .. }));
    }
}
