use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;

/// SSE event name carried by every inbox push.
pub const NOTIFICATION_EVENT: &str = "notification";

/// SSE event telling the client that pushes were dropped and it should re-fetch.
pub const RESYNC_EVENT: &str = "resync";

/// A named event with a JSON `data:` line.
pub fn json_event<T>(event_name: &'static str, payload: &T) -> Event
where
    T: Serialize + ?Sized,
{
    Event::default()
        .event(event_name)
        .json_data(payload)
        .unwrap_or_else(|_| {
            // Fallback to a tiny text marker instead of breaking the stream.
            Event::default().event(event_name).data("serialization_error")
        })
}

/// SSE response with periodic keepalive pings to avoid idle timeouts.
pub fn sse_response<S>(stream: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = Event> + Send + 'static,
{
    Sse::new(stream.map(Ok::<_, Infallible>)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
