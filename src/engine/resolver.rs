//! Identity resolver: maps a scanned code to its owning document and person.
//!
//! Lookup tiers, cheapest first, stopping at the first hit:
//! 1. the code is the document key
//! 2. the code equals a root-level `ticketId`
//! 3. the code equals some member's `ticketId` (full collection scan)
//!
//! Ticket ids are not guaranteed to equal document keys and older imports only
//! carry member tickets inside the embedded array, hence tier 3. It is O(n) in
//! the collection size and only runs after both indexed lookups miss.

use tracing::debug;

use super::normalize::{is_placeholder_code, normalize_team, ticket_code};
use super::store::TeamStore;
use crate::errors::AppError;
use crate::models::{Entity, TeamRecord};

/// Which lookup tier located the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTier {
    DocumentKey,
    RootTicket,
    MemberTicket,
}

#[derive(Debug)]
pub enum Resolution {
    /// Exactly one person carries the scanned code.
    Resolved {
        parent: TeamRecord,
        entity: Entity,
        tier: LookupTier,
    },
    /// Document found, but no single person matches (e.g. a team-level code).
    Ambiguous {
        parent: TeamRecord,
        entities: Vec<Entity>,
        tier: LookupTier,
    },
    NotFound,
}

/// Trim the scan and drop one leading event tag.
pub fn strip_event_prefix<'a>(raw: &'a str, prefix: &str) -> &'a str {
    let code = raw.trim();
    if prefix.is_empty() {
        return code;
    }
    code.strip_prefix(prefix).unwrap_or(code).trim()
}

/// Locate the document and person for an already prefix-stripped code.
pub async fn resolve<S: TeamStore>(store: &S, code: &str) -> Result<Resolution, AppError> {
    if code.is_empty() || is_placeholder_code(code) {
        return Ok(Resolution::NotFound);
    }

    let Some((parent, tier)) = locate(store, code).await? else {
        return Ok(Resolution::NotFound);
    };

    let entities = normalize_team(&parent);
    if entities.is_empty() {
        return Err(AppError::EmptyRecord { doc_id: parent.id });
    }

    let mut targets = entities
        .iter()
        .filter(|e| e.barcode.as_deref() == Some(code));
    match (targets.next(), targets.next()) {
        (Some(entity), None) => {
            let entity = entity.clone();
            debug!(name = %entity.name, "Scan matched a single attendee");
            Ok(Resolution::Resolved {
                parent,
                entity,
                tier,
            })
        }
        _ => {
            debug!(count = entities.len(), "Scan matched no single attendee");
            Ok(Resolution::Ambiguous {
                parent,
                entities,
                tier,
            })
        }
    }
}

async fn locate<S: TeamStore>(
    store: &S,
    code: &str,
) -> Result<Option<(TeamRecord, LookupTier)>, AppError> {
    if let Some(doc) = store.get_team(code).await? {
        return Ok(Some((doc, LookupTier::DocumentKey)));
    }

    // Stored tickets are compared trimmed, in every tier
    if let Some(doc) = store.find_team_by_ticket(code).await? {
        return Ok(Some((doc, LookupTier::RootTicket)));
    }

    let found = store
        .list_teams()
        .await?
        .into_iter()
        .find(|doc| doc.members.iter().any(|m| ticket_code(&m.ticket_id) == Some(code)));
    Ok(found.map(|doc| (doc, LookupTier::MemberTicket)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_event_prefix() {
        assert_eq!(strip_event_prefix("IFI2026-T42", "IFI2026-"), "T42");
        assert_eq!(strip_event_prefix("T42", "IFI2026-"), "T42");
        assert_eq!(strip_event_prefix("  IFI2026-T42\n", "IFI2026-"), "T42");
        assert_eq!(strip_event_prefix("IFI2026-", "IFI2026-"), "");
        assert_eq!(strip_event_prefix("IFI2026-T42", ""), "IFI2026-T42");
    }

    #[test]
    fn test_strip_only_once() {
        assert_eq!(
            strip_event_prefix("IFI2026-IFI2026-T42", "IFI2026-"),
            "IFI2026-T42"
        );
    }
}
