//! Karaoke mutation handlers (requestKaraoke, addKaraoke).
//!
//! Both publish a notification and echo the submitted song back.

use axum::extract::State;
use axum::Json;

use super::{ApiError, AppState};
use crate::karaoke::{KaraokeAddition, KaraokeRequest, Song};

/// Handle POST /karaoke/requests.
pub async fn request_karaoke(
    State(state): State<AppState>,
    Json(request): Json<KaraokeRequest>,
) -> Result<Json<Song>, ApiError> {
    Ok(Json(state.karaoke.request_karaoke(request)?))
}

/// Handle POST /karaoke/additions.
pub async fn add_karaoke(
    State(state): State<AppState>,
    Json(addition): Json<KaraokeAddition>,
) -> Result<Json<Song>, ApiError> {
    Ok(Json(state.karaoke.add_karaoke(addition)?))
}
