//! In-memory catalog and recommender used by tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::recommender::Recommender;
use crate::spotify::types::Album;
use crate::spotify::{
    AccessToken, AudioFeatures, CatalogApi, PlaylistRecord, SearchItems, SearchKind, Track,
    UpstreamError,
};

/// Calls seen by [`FakeCatalog`]; bulk endpoints record batch sizes.
#[derive(Clone, Debug, Default)]
pub struct Calls {
    pub token: usize,
    pub tracks: Vec<usize>,
    pub audio_features: Vec<usize>,
    pub playlist: Vec<String>,
    pub search: Vec<(String, SearchKind)>,
}

#[derive(Default)]
pub struct FakeCatalog {
    playlists: HashMap<String, PlaylistRecord>,
    tracks: HashMap<String, Track>,
    features: HashMap<String, AudioFeatures>,
    search_tracks: Vec<Track>,
    no_token: bool,
    fail_tracks: Option<(usize, u16)>,
    fail_features: Option<(usize, u16)>,
    fail_playlist: Mutex<Option<(usize, u16)>>,
    failing_playlists: HashMap<String, u16>,
    playlist_delay: Option<Duration>,
    gate: Option<(String, Notify)>,
    calls: Mutex<Calls>,
}

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("track {id}"),
        uri: format!("spotify:track:{id}"),
        duration_ms: 1000,
        explicit: false,
        artists: vec![],
        album: Album::default(),
        external_urls: Default::default(),
    }
}

pub fn features(id: &str) -> AudioFeatures {
    AudioFeatures {
        id: id.to_string(),
        uri: None,
        duration_ms: 1000,
        acousticness: 0.5,
        danceability: 0.5,
        energy: 0.5,
        instrumentalness: 0.0,
        key: 1,
        liveness: 0.1,
        loudness: -5.0,
        mode: 1,
        speechiness: 0.0,
        tempo: 120.0,
        time_signature: 4,
        valence: 0.5,
    }
}

pub fn playlist(id: &str, track_ids: &[&str]) -> PlaylistRecord {
    PlaylistRecord {
        id: id.to_string(),
        name: format!("playlist {id}"),
        description: None,
        owner: Some("owner".into()),
        image_url: None,
        total_tracks: track_ids.len() as u32,
        tracks: Some(track_ids.iter().map(|s| s.to_string()).collect()),
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(mut self, id: &str, track_ids: &[&str]) -> Self {
        self.playlists.insert(id.to_string(), playlist(id, track_ids));
        self
    }

    /// Registers both a track and its audio features for every id.
    pub fn with_tracks<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        for id in ids {
            let id = id.as_ref();
            self.tracks.insert(id.to_string(), track(id));
            self.features.insert(id.to_string(), features(id));
        }
        self
    }

    pub fn without_features(mut self, id: &str) -> Self {
        self.features.remove(id);
        self
    }

    pub fn with_search_tracks(mut self, ids: &[&str]) -> Self {
        self.search_tracks = ids.iter().map(|id| track(id)).collect();
        self
    }

    pub fn without_token(mut self) -> Self {
        self.no_token = true;
        self
    }

    /// Fails the `n`th (0-based) `tracks` call with `status`.
    pub fn fail_tracks_batch(mut self, n: usize, status: u16) -> Self {
        self.fail_tracks = Some((n, status));
        self
    }

    /// Fails the `n`th (0-based) `audio_features` call with `status`.
    pub fn fail_features_batch(mut self, n: usize, status: u16) -> Self {
        self.fail_features = Some((n, status));
        self
    }

    /// Fails the next `times` playlist fetches with `status`.
    pub fn fail_playlist_times(self, times: usize, status: u16) -> Self {
        *self.fail_playlist.lock().unwrap() = Some((times, status));
        self
    }

    /// Always fails fetches of playlist `id`.
    pub fn failing_playlist(mut self, id: &str, status: u16) -> Self {
        self.failing_playlists.insert(id.to_string(), status);
        self
    }

    pub fn with_playlist_delay(mut self, delay: Duration) -> Self {
        self.playlist_delay = Some(delay);
        self
    }

    /// Holds fetches of playlist `id` until [`FakeCatalog::open_gate`].
    pub fn gate_playlist(mut self, id: &str) -> Self {
        self.gate = Some((id.to_string(), Notify::new()));
        self
    }

    pub fn open_gate(&self) {
        if let Some((_, notify)) = &self.gate {
            notify.notify_one();
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, token: &AccessToken) -> Result<(), UpstreamError> {
        if token.0.is_empty() {
            return Err(UpstreamError::Status(401));
        }
        Ok(())
    }
}

/// Bulk lookups answer in reverse request order, as the catalog does not
/// promise request order.
fn lookup<T: Clone>(map: &HashMap<String, T>, ids: &[String]) -> Vec<T> {
    ids.iter().rev().filter_map(|id| map.get(id).cloned()).collect()
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn access_token(&self) -> Result<AccessToken, UpstreamError> {
        self.calls.lock().unwrap().token += 1;
        if self.no_token {
            return Err(UpstreamError::Status(400));
        }
        Ok(AccessToken("fake-token".into()))
    }

    async fn tracks(&self, token: &AccessToken, ids: &[String]) -> Result<Vec<Track>, UpstreamError> {
        self.check(token)?;
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.tracks.push(ids.len());
            calls.tracks.len() - 1
        };
        if let Some((fail_at, status)) = self.fail_tracks {
            if fail_at == n {
                return Err(UpstreamError::Status(status));
            }
        }
        Ok(lookup(&self.tracks, ids))
    }

    async fn playlist(&self, token: &AccessToken, id: &str) -> Result<PlaylistRecord, UpstreamError> {
        self.check(token)?;
        self.calls.lock().unwrap().playlist.push(id.to_string());

        if let Some(delay) = self.playlist_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((gated, notify)) = &self.gate {
            if gated == id {
                notify.notified().await;
            }
        }
        if let Some(status) = self.failing_playlists.get(id) {
            return Err(UpstreamError::Status(*status));
        }
        {
            let mut fail = self.fail_playlist.lock().unwrap();
            if let Some((times, status)) = *fail {
                *fail = if times > 1 { Some((times - 1, status)) } else { None };
                return Err(UpstreamError::Status(status));
            }
        }
        self.playlists
            .get(id)
            .cloned()
            .ok_or(UpstreamError::Status(404))
    }

    async fn audio_features(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, UpstreamError> {
        self.check(token)?;
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.audio_features.push(ids.len());
            calls.audio_features.len() - 1
        };
        if let Some((fail_at, status)) = self.fail_features {
            if fail_at == n {
                return Err(UpstreamError::Status(status));
            }
        }
        Ok(lookup(&self.features, ids))
    }

    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> Result<SearchItems, UpstreamError> {
        self.check(token)?;
        self.calls.lock().unwrap().search.push((query.to_string(), kind));
        let limit = limit as usize;
        Ok(match kind {
            SearchKind::Track => {
                SearchItems::Tracks(self.search_tracks.iter().take(limit).cloned().collect())
            }
            SearchKind::Playlist => SearchItems::Playlists(
                self.playlists
                    .values()
                    .filter(|p| p.name.contains(query))
                    .take(limit)
                    .map(|p| PlaylistRecord { tracks: None, ..p.clone() })
                    .collect(),
            ),
        })
    }
}

/// Records every seed batch; answers each with a fixed reply or, by default,
/// one prefixed uri per seed.
#[derive(Default)]
pub struct FakeRecommender {
    reply: Option<Vec<String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRecommender {
    pub fn with_reply(reply: Vec<String>) -> Self {
        Self {
            reply: Some(reply),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recommender for FakeRecommender {
    async fn continue_playlist(&self, seeds: &[String]) -> Vec<String> {
        self.calls.lock().unwrap().push(seeds.to_vec());
        match &self.reply {
            Some(reply) => reply.clone(),
            None => seeds.iter().map(|s| format!("spotify:track:r{s}")).collect(),
        }
    }
}
