//! Change notifications and live roster subscriptions.
//!
//! Writers publish a [`ChangeEvent`] after every commit. Readers either consume
//! the raw feed or use [`watch_roster`], which rebuilds the normalized roster on
//! each notification and hands it to a callback until the returned handle is
//! cancelled or dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::normalize::normalize_all;
use crate::engine::roster::roster_view;
use crate::engine::store::TeamStore;
use crate::models::RosterView;

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// A committed change to one of the attendee collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeEvent {
    #[serde(rename_all = "camelCase")]
    TeamUpdated { parent_doc_id: String },
    #[serde(rename_all = "camelCase")]
    TeamDeleted { parent_doc_id: String },
    CandidatesUpdated,
}

/// Broadcast fan-out of change notifications.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Receive every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish a notification; having no listeners is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            debug!("Change published with no subscribers");
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Cancellation handle for a roster watch. Dropping it also cancels.
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deliver the current roster now and a fresh one after every change.
///
/// Bursts of notifications collapse into one re-read. A lagged receiver
/// simply re-reads; the roster is always rebuilt from the full collection.
pub fn watch_roster<S, F>(store: Arc<S>, feed: &ChangeFeed, on_change: F) -> WatchHandle
where
    S: TeamStore + 'static,
    F: Fn(RosterView) + Send + 'static,
{
    // Subscribe before the first read so no change can slip between them
    let mut rx = feed.subscribe();

    let task = tokio::spawn(async move {
        loop {
            match store.list_teams().await {
                Ok(records) => on_change(roster_view(normalize_all(&records))),
                Err(e) => warn!("Roster refresh failed: {}", e),
            }

            match rx.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Roster watcher lagged, resyncing");
                }
                Err(RecvError::Closed) => break,
            }

            loop {
                match rx.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => return,
                }
            }
        }
    });

    WatchHandle { task }
}
