//! Roster projections built from normalized entities.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{AttendanceGroup, Entity, RosterStats, RosterView};

/// Dashboard view: everyone sorted by name, plus counters.
pub fn roster_view(mut entities: Vec<Entity>) -> RosterView {
    entities.sort_by(|a, b| by_name(a, b));
    let stats = stats(&entities);
    RosterView {
        attendees: entities,
        stats,
    }
}

pub fn stats(entities: &[Entity]) -> RosterStats {
    let checked_in = entities.iter().filter(|e| e.checked_in).count();
    RosterStats {
        total: entities.len(),
        checked_in,
        pending: entities.len() - checked_in,
    }
}

/// Public attendance view: teams A–Z, leaders first inside each team, then A–Z.
pub fn group_by_team(entities: Vec<Entity>) -> Vec<AttendanceGroup> {
    let mut groups: BTreeMap<String, Vec<Entity>> = BTreeMap::new();
    for entity in entities {
        groups.entry(entity.team.clone()).or_default().push(entity);
    }

    let mut groups: Vec<AttendanceGroup> = groups
        .into_iter()
        .map(|(team_name, mut members)| {
            members.sort_by(|a, b| match (a.is_leader(), b.is_leader()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => by_name(a, b),
            });
            AttendanceGroup { team_name, members }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.team_name
            .to_lowercase()
            .cmp(&b.team_name.to_lowercase())
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    groups
}

fn by_name(a: &Entity, b: &Entity) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.unique_id.cmp(&b.unique_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityRole, RecordSource};

    fn entity(name: &str, team: &str, role: EntityRole, checked_in: bool) -> Entity {
        Entity {
            unique_id: format!("{}_{}", team, name),
            parent_doc_id: team.to_string(),
            name: name.to_string(),
            role,
            member_index: if role == EntityRole::Leader { -1 } else { 0 },
            checked_in,
            check_in_time: None,
            team: team.to_string(),
            event_name: "Innovate 2026".to_string(),
            barcode: None,
            source: RecordSource::Rsvp,
        }
    }

    #[test]
    fn test_roster_view_sorts_and_counts() {
        let view = roster_view(vec![
            entity("zoe", "A", EntityRole::Member, true),
            entity("Bob", "A", EntityRole::Leader, false),
            entity("alice", "B", EntityRole::Member, true),
        ]);
        let names: Vec<&str> = view.attendees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "Bob", "zoe"]);
        assert_eq!(
            view.stats,
            RosterStats {
                total: 3,
                checked_in: 2,
                pending: 1
            }
        );
    }

    #[test]
    fn test_group_by_team_leader_first() {
        let groups = group_by_team(vec![
            entity("Yan", "Zeta", EntityRole::Member, false),
            entity("Abe", "Alpha", EntityRole::Member, false),
            entity("Zara", "Alpha", EntityRole::Leader, false),
            entity("Ben", "Alpha", EntityRole::Member, true),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].team_name, "Alpha");
        let names: Vec<&str> = groups[0].members.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zara", "Abe", "Ben"]);
        assert_eq!(groups[1].team_name, "Zeta");
    }
}
