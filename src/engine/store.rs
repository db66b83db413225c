//! Storage port used by the check-in engine.

use std::future::Future;

use crate::errors::AppError;
use crate::models::{MemberRecord, TeamRecord};

/// A write produced by a transaction body.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentWrite {
    /// Update the leader's root-level attendance fields.
    LeaderAttendance {
        checked_in: bool,
        check_in_time: Option<String>,
    },
    /// Replace the whole `members` array.
    ReplaceMembers(Vec<MemberRecord>),
}

/// What a transaction body decided after looking at the fresh document.
#[derive(Debug)]
pub enum TxDecision<T> {
    Commit(DocumentWrite, T),
    Abort(T),
}

/// Result of a finished transaction.
#[derive(Debug, PartialEq)]
pub enum TxOutcome<T> {
    Committed(T),
    Aborted(T),
}

/// Team document collection with an optimistic-concurrency transaction primitive.
///
/// `run_transaction` reads the document, hands it to `body`, and writes the
/// returned change only if the document version is still the one that was read.
/// Of several concurrent transactions on the same document at most one commits;
/// the others observe the committed state or fail with a conflict.
pub trait TeamStore: Send + Sync {
    fn get_team(&self, id: &str)
        -> impl Future<Output = Result<Option<TeamRecord>, AppError>> + Send;

    /// First document (in key order) whose root `ticketId` equals `ticket`.
    fn find_team_by_ticket(
        &self,
        ticket: &str,
    ) -> impl Future<Output = Result<Option<TeamRecord>, AppError>> + Send;

    /// Every document, in key order.
    fn list_teams(&self) -> impl Future<Output = Result<Vec<TeamRecord>, AppError>> + Send;

    fn run_transaction<T, F>(
        &self,
        id: &str,
        body: F,
    ) -> impl Future<Output = Result<TxOutcome<T>, AppError>> + Send
    where
        T: Send,
        F: FnOnce(&TeamRecord) -> Result<TxDecision<T>, AppError> + Send;
}
