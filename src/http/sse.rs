//! Server-sent events: `GET /sse` and `GET /events`
//!
//! Each connection first receives a `capabilities` event carrying the
//! initialize descriptor, then a `heartbeat` event every five seconds until
//! the client goes away.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use serde_json::json;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt as _};
use tracing::{debug, info};
use ulid::Ulid;

use super::AppState;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Per-connection heartbeat state; dropped with the stream
struct Heartbeats {
    connection: String,
    sequence: u64,
}

impl Heartbeats {
    fn next_event(&mut self) -> Event {
        self.sequence += 1;
        let data = json!({
            "type": "heartbeat",
            "connection": self.connection,
            "sequence": self.sequence,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        debug!(connection = %self.connection, sequence = self.sequence, "SSE heartbeat");
        Event::default().event("heartbeat").data(data.to_string())
    }
}

impl Drop for Heartbeats {
    fn drop(&mut self) {
        info!(
            connection = %self.connection,
            heartbeats = self.sequence,
            "SSE client disconnected"
        );
    }
}

/// GET /sse, GET /events
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connection = Ulid::new().to_string();
    info!(connection = %connection, "SSE client connected");

    let descriptor = match state.call("initialize", json!({})).await {
        Ok(descriptor) => descriptor,
        Err(e) => json!({ "error": e }),
    };
    let greeting = Event::default()
        .event("capabilities")
        .data(descriptor.to_string());

    let mut beats = Heartbeats {
        connection,
        sequence: 0,
    };
    let ticks = IntervalStream::new(interval_at(
        Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    ));
    let heartbeats = ticks.map(move |_| Ok(beats.next_event()));

    Sse::new(tokio_stream::once(Ok(greeting)).chain(heartbeats))
}
