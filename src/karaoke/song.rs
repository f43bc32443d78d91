//! Song model and operation inputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::Payload;

/// Error type for karaoke operations.
#[derive(Debug, Error)]
pub enum KaraokeError {
    #[error("Failed to serialize event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A song as returned to clients.
///
/// Songs are not stored: every operation rebuilds one from its arguments.
/// `lyrics` is serialized structured text, conventionally a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Song {
    /// A song known only by its id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Arguments of a karaoke request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaraokeRequest {
    pub name: String,
    pub artists: Vec<String>,
    pub duration: f64,
    pub id: String,
}

impl From<KaraokeRequest> for Song {
    fn from(request: KaraokeRequest) -> Self {
        Self {
            id: request.id,
            name: Some(request.name),
            artists: Some(request.artists),
            duration: Some(request.duration),
            ..Self::default()
        }
    }
}

/// Lyrics found for a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaraokeAddition {
    pub id: String,
    pub lyrics: String,
    pub url: String,
}

impl From<KaraokeAddition> for Song {
    fn from(addition: KaraokeAddition) -> Self {
        Self {
            id: addition.id,
            lyrics: Some(addition.lyrics),
            url: Some(addition.url),
            ..Self::default()
        }
    }
}

/// Serialize a value into an event payload.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Payload, KaraokeError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Err(KaraokeError::NotAnObject("null")),
        serde_json::Value::Bool(_) => Err(KaraokeError::NotAnObject("a boolean")),
        serde_json::Value::Number(_) => Err(KaraokeError::NotAnObject("a number")),
        serde_json::Value::String(_) => Err(KaraokeError::NotAnObject("a string")),
        serde_json::Value::Array(_) => Err(KaraokeError::NotAnObject("an array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_payload_shape() {
        let request = KaraokeRequest {
            name: "Song".into(),
            artists: vec!["A".into(), "B".into()],
            duration: 201.5,
            id: "song-1".into(),
        };
        let payload = to_payload(&request).unwrap();

        assert_eq!(
            serde_json::Value::Object(payload),
            json!({ "name": "Song", "artists": ["A", "B"], "duration": 201.5, "id": "song-1" })
        );
    }

    #[test]
    fn test_addition_payload_shape() {
        let addition = KaraokeAddition {
            id: "song-1".into(),
            lyrics: "[]".into(),
            url: "http://x".into(),
        };
        let payload = to_payload(&addition).unwrap();
        assert_eq!(payload.len(), 3);
        assert_eq!(payload["url"], json!("http://x"));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = to_payload(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, KaraokeError::NotAnObject("an array")));
    }

    #[test]
    fn test_song_omits_missing_fields() {
        let song = Song::with_id("song-1");
        assert_eq!(serde_json::to_value(&song).unwrap(), json!({ "id": "song-1" }));
    }

    #[test]
    fn test_song_from_addition() {
        let song: Song = KaraokeAddition {
            id: "song-1".into(),
            lyrics: "la la".into(),
            url: "http://x".into(),
        }
        .into();
        assert_eq!(song.lyrics.as_deref(), Some("la la"));
        assert!(song.name.is_none());
    }
}
