//! Catalog Web API client.
//!
//! Uses Client Credentials flow for server-to-server authentication. The rest
//! of the service depends only on the [`CatalogApi`] trait.

pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;

pub use types::{AudioFeatures, PlaylistRecord, Track, TrackSummary};
use types::{
    AudioFeaturesResponse, PlaylistTracksPage, RawPlaylist, SearchResponse, TokenResponse,
    TracksResponse,
};

/// Failure of a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Non-success HTTP status, propagated to the client unchanged.
    #[error("upstream returned status {0}")]
    Status(u16),
    /// No usable response (connect, timeout, decode).
    #[error("upstream request failed: {0}")]
    Transport(String),
}

/// Bearer credential for catalog calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKind {
    Track,
    Playlist,
}

impl SearchKind {
    fn as_str(self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Playlist => "playlist",
        }
    }
}

/// Items of a search, one variant per [`SearchKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum SearchItems {
    Tracks(Vec<Track>),
    Playlists(Vec<PlaylistRecord>),
}

/// Upstream catalog operations the aggregation layer relies on.
///
/// Bulk calls drop `null` entries the catalog returns for unknown ids.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, UpstreamError>;

    /// Up to 50 ids per call.
    async fn tracks(&self, token: &AccessToken, ids: &[String]) -> Result<Vec<Track>, UpstreamError>;

    /// Full playlist including every track id, across all pages.
    async fn playlist(&self, token: &AccessToken, id: &str) -> Result<PlaylistRecord, UpstreamError>;

    /// Up to 100 ids per call.
    async fn audio_features(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, UpstreamError>;

    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> Result<SearchItems, UpstreamError>;
}

/// Catalog API client with token caching.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    token_url: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.upstream_timeout).build()?;
        Ok(Self {
            client,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            api_base: config.spotify_api_base.trim_end_matches('/').to_string(),
            token_url: config.spotify_token_url.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Ensures we have a valid access token, refreshing if needed.
    async fn ensure_token(&self) -> Result<String, UpstreamError> {
        {
            let guard = self.token.read().await;
            if let Some(ref t) = *guard {
                if t.expires_at > Instant::now() {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token = self.fetch_token().await?;
        {
            let mut guard = self.token.write().await;
            *guard = Some(token.clone());
        }
        Ok(token.access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, UpstreamError> {
        let params = [("grant_type", "client_credentials")];
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.client_id, self.client_secret).as_bytes(),
        );

        let res = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(format!("token request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "token request rejected");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| UpstreamError::Transport(format!("token parse failed: {}", e)))?;
        let expires_at = Instant::now() + Duration::from_secs(body.expires_in.saturating_sub(60));

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }

    /// GET `url` and decode the JSON body, logging rejected calls.
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        url: &str,
        endpoint: &'static str,
    ) -> Result<T, UpstreamError> {
        let res = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token.0))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(format!("{} request failed: {}", endpoint, e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), %body, "upstream call failed");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        res.json()
            .await
            .map_err(|e| UpstreamError::Transport(format!("{} parse failed: {}", endpoint, e)))
    }

    fn ids_url(&self, path: &str, ids: &[String]) -> String {
        format!("{}/{}?ids={}", self.api_base, path, urlencoding::encode(&ids.join(",")))
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn access_token(&self) -> Result<AccessToken, UpstreamError> {
        self.ensure_token().await.map(AccessToken)
    }

    async fn tracks(&self, token: &AccessToken, ids: &[String]) -> Result<Vec<Track>, UpstreamError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let url = self.ids_url("tracks", ids);
        let body: TracksResponse = self.get_json(token, &url, "tracks").await?;
        Ok(body.tracks.into_iter().flatten().collect())
    }

    async fn playlist(&self, token: &AccessToken, id: &str) -> Result<PlaylistRecord, UpstreamError> {
        let url = format!("{}/playlists/{}", self.api_base, urlencoding::encode(id));
        let raw: RawPlaylist = self.get_json(token, &url, "playlists").await?;

        let mut record = raw.summary();
        let mut ids: Vec<String> = raw.tracks.track_ids().collect();
        let mut next = raw.tracks.next;
        let mut pages = 1;
        while let Some(page_url) = next {
            let page: PlaylistTracksPage = self.get_json(token, &page_url, "playlist-tracks").await?;
            ids.extend(page.track_ids());
            next = page.next;
            pages += 1;
        }
        tracing::debug!(playlist = id, pages, tracks = ids.len(), "fetched playlist");

        record.tracks = Some(ids);
        Ok(record)
    }

    async fn audio_features(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, UpstreamError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let url = self.ids_url("audio-features", ids);
        let body: AudioFeaturesResponse = self.get_json(token, &url, "audio-features").await?;
        Ok(body.audio_features.into_iter().flatten().collect())
    }

    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> Result<SearchItems, UpstreamError> {
        let url = format!(
            "{}/search?q={}&type={}&limit={}",
            self.api_base,
            urlencoding::encode(query),
            kind.as_str(),
            limit.clamp(1, 50),
        );
        let body: SearchResponse = self.get_json(token, &url, "search").await?;

        Ok(match kind {
            SearchKind::Track => {
                SearchItems::Tracks(body.tracks.map(|p| p.items).unwrap_or_default())
            }
            SearchKind::Playlist => SearchItems::Playlists(
                body.playlists
                    .map(|p| p.items)
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .map(|raw| raw.summary())
                    .collect(),
            ),
        })
    }
}

/// Obtains a credential for this request; any failure is reported as 401.
pub async fn authorize(api: &dyn CatalogApi) -> Result<AccessToken, AppError> {
    api.access_token().await.map_err(|e| {
        tracing::warn!(error = %e, "could not obtain access token");
        AppError::Unauthorized
    })
}
