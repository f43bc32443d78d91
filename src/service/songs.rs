//! Song lookup (getSong).

use axum::extract::{Path, State};
use axum::Json;

use super::AppState;
use crate::karaoke::Song;

/// Handle GET /songs/:id.
///
/// Songs are not stored, so only the id comes back.
pub async fn get_song(State(state): State<AppState>, Path(id): Path<String>) -> Json<Song> {
    Json(state.karaoke.get_song(&id))
}
