//! Server-Sent Events log streaming

use crate::api::AuthedUser;
use crate::session::SubscriberGuard;
use crate::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;

/// GET /events
///
/// Streams the caller's session log lines as they are published. The
/// subscriber registers before the first event is sent, so no line published
/// after the request is handled can be missed. Disconnecting drops the
/// stream, which unregisters the subscriber from its session.
pub async fn stream_logs(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.sessions.get_or_create(&identity);
    let (subscriber_id, mut rx) = session.bus.subscribe();
    debug!(identity, subscriber = %subscriber_id, "Log stream opened");

    let stream = async_stream::stream! {
        let _guard = SubscriberGuard::new(session, subscriber_id);

        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        // Ends when the session is discarded (last sender dropped) or the
        // client goes away.
        while let Some(line) = rx.recv().await {
            yield Ok(Event::default().data(line));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
