//! Karaoke operations on top of the notification bus.
//!
//! Two topics carry the notifications:
//! - [`KARAOKE_REQUESTED`]: `{name, artists, duration, id}` when someone asks
//!   for lyrics to be sourced
//! - [`KARAOKE_ADDED`]: `{id, lyrics, url}` when lyrics are submitted,
//!   filtered per subscriber by song id
//!
//! Operations echo their arguments back as a [`Song`]; nothing is stored.

mod song;

pub use song::{to_payload, KaraokeAddition, KaraokeError, KaraokeRequest, Song};

use serde_json::Value;

use crate::bus::{field_equals, Bus, FilteredSubscription, Payload, Subscription};

/// Topic for karaoke requests.
pub const KARAOKE_REQUESTED: &str = "KARAOKE_REQUESTED";

/// Topic for submitted lyrics.
pub const KARAOKE_ADDED: &str = "KARAOKE_ADDED";

/// Karaoke operations bound to a bus.
#[derive(Debug, Clone)]
pub struct Karaoke {
    bus: Bus,
}

impl Karaoke {
    pub fn new(bus: Bus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Look up a song. Only the id is known.
    pub fn get_song(&self, id: &str) -> Song {
        Song::with_id(id)
    }

    /// Ask for lyrics to be sourced and notify `KARAOKE_REQUESTED` subscribers.
    pub fn request_karaoke(&self, request: KaraokeRequest) -> Result<Song, KaraokeError> {
        let payload = to_payload(&request)?;
        let report = self.bus.publish(KARAOKE_REQUESTED, payload);

        tracing::debug!(
            song_id = %request.id,
            delivered = report.delivered,
            "Karaoke requested"
        );
        Ok(request.into())
    }

    /// Submit lyrics and notify `KARAOKE_ADDED` subscribers of this song.
    pub fn add_karaoke(&self, addition: KaraokeAddition) -> Result<Song, KaraokeError> {
        let payload = to_payload(&addition)?;
        let report = self.bus.publish(KARAOKE_ADDED, payload);

        tracing::debug!(
            song_id = %addition.id,
            delivered = report.delivered,
            "Karaoke added"
        );
        Ok(addition.into())
    }

    /// Live stream of every karaoke request.
    pub fn requested_karaoke(&self) -> Subscription {
        self.bus.subscribe(KARAOKE_REQUESTED)
    }

    /// Live stream of lyrics submitted for song `id`.
    pub fn added_karaoke(&self, id: impl Into<String>) -> FilteredSubscription {
        let mut args = Payload::new();
        args.insert("id".to_string(), Value::String(id.into()));
        self.bus
            .subscribe_filtered(KARAOKE_ADDED, args, field_equals("id"))
    }
}
