//! Wire types of the catalog API and the normalized records handed to clients.

use serde::{Deserialize, Serialize};

/// A catalog track (simplified).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct Artist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct Image {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

// ---------------------------------------------------------------------------
// Audio Features (GET /v1/audio-features)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AudioFeatures {
    pub id: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub acousticness: f32,
    #[serde(default)]
    pub danceability: f32,
    #[serde(default)]
    pub energy: f32,
    #[serde(default)]
    pub instrumentalness: f32,
    #[serde(default = "default_key")]
    pub key: i32,
    #[serde(default)]
    pub liveness: f32,
    #[serde(default)]
    pub loudness: f32,
    #[serde(default)]
    pub mode: i32,
    #[serde(default)]
    pub speechiness: f32,
    #[serde(default)]
    pub tempo: f32,
    #[serde(default = "default_time_signature")]
    pub time_signature: i32,
    #[serde(default)]
    pub valence: f32,
}

fn default_key() -> i32 { -1 }
fn default_time_signature() -> i32 { 4 }

// ---------------------------------------------------------------------------
// Playlists (GET /v1/playlists/{id}, search results)
// ---------------------------------------------------------------------------

/// Normalized playlist. `tracks` holds the ordered track ids; it is `None`
/// when the caller asked for the summary without ids (search results, top
/// playlists).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub image_url: Option<String>,
    pub total_tracks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<String>>,
}

impl PlaylistRecord {
    /// Ordered track ids, empty for a summary record.
    pub fn track_ids(&self) -> &[String] {
        self.tracks.as_deref().unwrap_or(&[])
    }
}

#[derive(Deserialize)]
pub(crate) struct RawPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub tracks: PlaylistTracksPage,
}

#[derive(Deserialize)]
pub(crate) struct Owner {
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub next: Option<String>,
}

impl PlaylistTracksPage {
    /// Ids of the page's catalog tracks; local files and removed tracks have none.
    pub fn track_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter_map(|t| t.id.clone())
    }
}

#[derive(Deserialize)]
pub(crate) struct PlaylistItem {
    pub track: Option<PlaylistItemTrack>,
}

#[derive(Deserialize)]
pub(crate) struct PlaylistItemTrack {
    pub id: Option<String>,
}

impl RawPlaylist {
    /// Builds the summary record, without track ids.
    pub fn summary(&self) -> PlaylistRecord {
        PlaylistRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            owner: self.owner.as_ref().and_then(|o| o.display_name.clone()),
            image_url: self.images.as_deref().and_then(widest_image_url),
            total_tracks: self.tracks.total,
            tracks: None,
        }
    }
}

/// Url of the widest image. Unsized entries lose to sized ones; among equals
/// the later entry wins, so an unsized list yields its last image.
fn widest_image_url(images: &[Image]) -> Option<String> {
    images
        .iter()
        .filter(|i| i.url.is_some())
        .max_by_key(|i| i.width.unwrap_or(0))
        .and_then(|i| i.url.clone())
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Deserialize)]
pub(crate) struct TracksResponse {
    pub tracks: Vec<Option<Track>>,
}

#[derive(Deserialize)]
pub(crate) struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Option<Page<Track>>,
    pub playlists: Option<Page<Option<RawPlaylist>>>,
}

#[derive(Deserialize)]
pub(crate) struct Page<T> {
    pub items: Vec<T>,
}

// ---------------------------------------------------------------------------
// Client-facing shapes
// ---------------------------------------------------------------------------

/// Track as shown in result lists.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackSummary {
    pub name: String,
    pub artists: Vec<String>,
    pub image_url: Option<String>,
    pub uri: String,
    pub explicit: bool,
}

impl From<&Track> for TrackSummary {
    fn from(t: &Track) -> Self {
        TrackSummary {
            name: t.name.clone(),
            artists: t.artists.iter().map(|a| a.name.clone()).collect(),
            image_url: widest_image_url(&t.album.images),
            uri: t.uri.clone(),
            explicit: t.explicit,
        }
    }
}
