//! HTTP handlers for Lyricbus.
//!
//! Routes:
//! - `GET /songs/:id` - song lookup
//! - `POST /karaoke/requests` - request karaoke lyrics
//! - `POST /karaoke/additions` - submit found lyrics
//! - `GET /subscriptions/requested` - SSE stream of requests
//! - `GET /subscriptions/added?id=` - SSE stream of lyrics for one song
//! - `GET /topics` - known topics and subscriber counts
//! - `/health`, `/ready`, `/metrics` - observability

pub mod error;
pub mod karaoke;
pub mod songs;
pub mod subscribe;
pub mod topics;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::bus::Bus;
use crate::karaoke::Karaoke;
use crate::observability::prometheus;

/// State shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub karaoke: Karaoke,
}

impl AppState {
    /// Create handler state around a bus.
    pub fn new(bus: Bus) -> Self {
        Self {
            karaoke: Karaoke::new(bus),
        }
    }
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/songs/:id", get(songs::get_song))
        .route("/karaoke/requests", post(karaoke::request_karaoke))
        .route("/karaoke/additions", post(karaoke::add_karaoke))
        .route("/subscriptions/requested", get(subscribe::requested_karaoke))
        .route("/subscriptions/added", get(subscribe::added_karaoke))
        .route("/topics", get(topics::list_topics))
        .merge(prometheus::create_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
