//! Server-Sent Events stream of roster snapshots.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::events::watch_roster;
use crate::models::RosterView;
use crate::AppState;

/// GET /api/events - Push the full roster whenever an attendee document changes.
///
/// The first event carries the current roster. Slow clients only ever see the
/// newest snapshot; intermediate ones are skipped.
pub async fn roster_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let (tx, rx) = watch::channel::<Option<RosterView>>(None);
    let watch_handle = watch_roster(state.repo.clone(), &state.feed, move |view| {
        let _ = tx.send(Some(view));
    });

    let stream = WatchStream::new(rx).filter_map(move |snapshot| {
        // The watch task lives exactly as long as this stream
        let _keep_alive = &watch_handle;
        async move {
            let view = snapshot?;
            match serde_json::to_string(&view) {
                Ok(json) => Some(Ok(Event::default().event("roster").data(json))),
                Err(e) => {
                    warn!("Failed to serialize roster: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
