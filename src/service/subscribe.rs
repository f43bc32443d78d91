//! Subscription handlers streaming notifications as Server-Sent Events.
//!
//! Each connection owns one bus subscription. When the client goes away
//! the response stream is dropped, which closes the subscription and
//! removes it from its topic.

use std::pin::Pin;

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::Stream;

use super::AppState;
use crate::bus::Event;

type SubscribeStream = Pin<Box<dyn Stream<Item = Result<SseEvent, axum::Error>> + Send + 'static>>;

/// Query parameters of the addedKaraoke subscription.
#[derive(Debug, Deserialize)]
pub struct AddedParams {
    pub id: String,
}

/// Wrap bus events as SSE messages named `name` carrying the payload as JSON.
fn sse_stream<S>(name: &'static str, events: S) -> Sse<SubscribeStream>
where
    S: Stream<Item = Event> + Send + 'static,
{
    let stream: SubscribeStream = Box::pin(
        events.map(move |event| SseEvent::default().event(name).json_data(&event.payload)),
    );
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /subscriptions/requested.
pub async fn requested_karaoke(State(state): State<AppState>) -> Sse<SubscribeStream> {
    let subscription = state.karaoke.requested_karaoke();
    tracing::info!(
        subscription_id = %subscription.id(),
        "requestedKaraoke subscription started"
    );
    sse_stream("requestedKaraoke", subscription.into_stream())
}

/// Handle GET /subscriptions/added?id=.
pub async fn added_karaoke(
    State(state): State<AppState>,
    Query(params): Query<AddedParams>,
) -> Sse<SubscribeStream> {
    let subscription = state.karaoke.added_karaoke(params.id);
    tracing::info!(
        subscription_id = %subscription.id(),
        song_id = ?subscription.args().get("id"),
        "addedKaraoke subscription started"
    );
    sse_stream("addedKaraoke", subscription.into_stream())
}
