//! Topic listing (`GET /topics`).

use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::bus::TopicInfo;

/// Handle GET /topics, sorted by name.
pub async fn list_topics(State(state): State<AppState>) -> Json<Vec<TopicInfo>> {
    Json(state.karaoke.bus().topics())
}
