//! Check-in resolution engine.
//!
//! Ties the resolver to the transactional attendance transition and reports a
//! [`ScanResult`] for every attempt. Failures stay local to one scan: nothing
//! here is fatal to the caller's session.

pub mod normalize;
pub mod resolver;
pub mod roster;
pub mod store;
pub mod transition;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::events::{ChangeEvent, ChangeFeed};
use crate::models::{Entity, EntityTarget, ScanResult};
use resolver::{resolve, strip_event_prefix, Resolution};
use store::{TeamStore, TxOutcome};
use transition::plan_transition;

const NOT_FOUND_MESSAGE: &str = "Attendee not found.";
const SELECT_MESSAGE: &str = "Select attendee";

/// Resolves scans and applies attendance transitions against a [`TeamStore`].
pub struct CheckInEngine<S> {
    store: Arc<S>,
    feed: ChangeFeed,
    ticket_prefix: String,
}

impl<S: TeamStore> CheckInEngine<S> {
    pub fn new(store: Arc<S>, feed: ChangeFeed, ticket_prefix: impl Into<String>) -> Self {
        Self {
            store,
            feed,
            ticket_prefix: ticket_prefix.into(),
        }
    }

    /// Handle one decoded QR payload end to end.
    pub async fn scan(&self, raw: &str) -> ScanResult {
        let code = strip_event_prefix(raw, &self.ticket_prefix);

        let result = match resolve(self.store.as_ref(), code).await {
            Ok(Resolution::Resolved {
                parent,
                entity,
                tier,
            }) => match entity.target() {
                Some(target) => {
                    debug!(?tier, doc = %parent.id, "Resolved scan");
                    self.check_in(&parent.id, target).await
                }
                None => ScanResult::Error {
                    message: format!("{} cannot be checked in here", entity.name),
                    entity: Some(entity),
                },
            },
            Ok(Resolution::Ambiguous {
                parent,
                entities,
                tier,
            }) => {
                debug!(?tier, doc = %parent.id, "Scan needs operator selection");
                ScanResult::SelectionRequired {
                    parent_doc_id: parent.id,
                    entities,
                    message: SELECT_MESSAGE.to_string(),
                }
            }
            Ok(Resolution::NotFound) => ScanResult::NotFound {
                code: code.to_string(),
                message: NOT_FOUND_MESSAGE.to_string(),
            },
            Err(e) => {
                warn!(code, "Scan lookup failed: {}", e);
                ScanResult::Error {
                    entity: None,
                    message: e.message(),
                }
            }
        };

        info!(code, status = ?result.status(), message = result.message(), "Scan processed");
        result
    }

    /// Check in one slot of a document (scanner path and manual selection).
    ///
    /// The current status is read inside the transaction, so two racing calls
    /// for the same person cannot both report `Success`.
    pub async fn check_in(&self, parent_doc_id: &str, target: EntityTarget) -> ScanResult {
        match self.transition(parent_doc_id, target, true).await {
            Ok(TxOutcome::Committed(entity)) => ScanResult::Success {
                message: format!("{} Checked In!", entity.name),
                entity,
            },
            Ok(TxOutcome::Aborted(entity)) => ScanResult::Duplicate {
                message: format!("{} already checked in!", entity.name),
                entity,
            },
            Err(e) => {
                warn!(doc = parent_doc_id, ?target, "Check-in failed: {}", e);
                ScanResult::Error {
                    entity: None,
                    message: format!("Error processing check-in: {}", e.message()),
                }
            }
        }
    }

    /// Dashboard toggle: force a slot into `checked_in`, in either direction.
    ///
    /// Goes through the same transaction as scanning; a slot already in the
    /// requested state is returned unchanged.
    pub async fn set_attendance(
        &self,
        parent_doc_id: &str,
        target: EntityTarget,
        checked_in: bool,
    ) -> Result<Entity, AppError> {
        match self.transition(parent_doc_id, target, checked_in).await? {
            TxOutcome::Committed(entity) | TxOutcome::Aborted(entity) => Ok(entity),
        }
    }

    async fn transition(
        &self,
        parent_doc_id: &str,
        target: EntityTarget,
        desired: bool,
    ) -> Result<TxOutcome<Entity>, AppError> {
        let at = Utc::now().to_rfc3339();
        let outcome = self
            .store
            .run_transaction(parent_doc_id, |record| {
                plan_transition(record, target, desired, &at)
            })
            .await?;

        if let TxOutcome::Committed(entity) = &outcome {
            info!(
                doc = parent_doc_id,
                name = %entity.name,
                checked_in = desired,
                "Attendance updated"
            );
            self.feed.publish(ChangeEvent::TeamUpdated {
                parent_doc_id: parent_doc_id.to_string(),
            });
        }
        Ok(outcome)
    }
}
