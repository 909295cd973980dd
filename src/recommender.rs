//! Recommendation model client and the budgeted orchestration around it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::segment::{segment, SegmentError};
use crate::spotify::{AccessToken, CatalogApi, TrackSummary};

/// Seeds sent to the model per call.
pub const SEED_BATCH: usize = 10;
/// Hard upper bound on model calls per request.
pub const MAX_CALLS: usize = 100;
/// Ids per catalog `tracks` call when resolving recommendations.
pub const RESOLVE_BATCH: usize = 50;
/// Upper bound on candidates returned per request.
pub const MAX_RESULTS: usize = 1000;

const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Produces candidate track uris continuing a seed batch.
///
/// Implementations must not fail: any internal error yields an empty list.
/// Replies are expected to stay around ten uris; [`recommend`] cuts the
/// combined result at [`MAX_RESULTS`] regardless.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn continue_playlist(&self, seeds: &[String]) -> Vec<String>;
}

/// Used when no model endpoint is configured.
pub struct NullRecommender;

#[async_trait]
impl Recommender for NullRecommender {
    async fn continue_playlist(&self, _seeds: &[String]) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Serialize)]
struct ModelRequest<'a> {
    track_uris: &'a [String],
}

#[derive(Deserialize)]
struct ModelResponse {
    track_uris: Vec<String>,
}

/// Model served over HTTP: `POST {url}` with `{"track_uris": [...]}`.
pub struct HttpRecommender {
    client: Client,
    url: String,
}

impl HttpRecommender {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    async fn call(&self, seeds: &[String]) -> Result<Vec<String>, String> {
        let res = self
            .client
            .post(&self.url)
            .json(&ModelRequest { track_uris: seeds })
            .send()
            .await
            .map_err(|e| format!("model request failed: {}", e))?;

        if !res.status().is_success() {
            return Err(format!("model returned {}", res.status()));
        }

        let body: ModelResponse = res
            .json()
            .await
            .map_err(|e| format!("model response parse failed: {}", e))?;
        Ok(body.track_uris)
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn continue_playlist(&self, seeds: &[String]) -> Vec<String> {
        match self.call(seeds).await {
            Ok(uris) => uris,
            Err(e) => {
                tracing::warn!(seeds = seeds.len(), error = %e, "recommender failed, using no candidates");
                Vec::new()
            }
        }
    }
}

/// Rejected recommendation request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendError {
    #[error("max recommender calls must be in 1..=100, got {0}")]
    CallBudget(usize),
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

fn strip_track_prefix(uri: String) -> String {
    match uri.strip_prefix(TRACK_URI_PREFIX) {
        Some(id) => id.to_string(),
        None => uri,
    }
}

/// Asks the model for candidates continuing `seeds`.
///
/// Seeds are sent in batches of [`SEED_BATCH`]; only the first
/// `max_calls` batches (default [`MAX_CALLS`]) are sent and the rest are
/// dropped. Returned uris lose their track prefix, keep call order and are
/// not deduplicated. At most [`MAX_RESULTS`] uris are returned.
pub async fn recommend(
    recommender: &dyn Recommender,
    seeds: &[String],
    max_calls: Option<usize>,
) -> Result<Vec<String>, RecommendError> {
    let budget = max_calls.unwrap_or(MAX_CALLS);
    if budget == 0 || budget > MAX_CALLS {
        return Err(RecommendError::CallBudget(budget));
    }

    let batches = segment(seeds, SEED_BATCH)?;
    if batches.is_empty() {
        return Ok(Vec::new());
    }

    let calls = batches.len().min(budget);
    if calls < batches.len() {
        tracing::debug!(batches = batches.len(), calls, "dropping seed batches over call budget");
    }

    let mut recommended = Vec::new();
    for batch in batches.iter().take(calls) {
        let uris = recommender.continue_playlist(batch).await;
        recommended.extend(uris.into_iter().map(strip_track_prefix));
    }
    if recommended.len() > MAX_RESULTS {
        tracing::debug!(got = recommended.len(), kept = MAX_RESULTS, "truncating recommendations");
        recommended.truncate(MAX_RESULTS);
    }
    Ok(recommended)
}

/// Looks up `ids` in the catalog, [`RESOLVE_BATCH`] at a time, stopping at
/// the first failed call.
pub async fn resolve_tracks(
    api: &dyn CatalogApi,
    token: &AccessToken,
    ids: &[String],
) -> Result<Vec<TrackSummary>, AppError> {
    let mut tracks = Vec::with_capacity(ids.len());
    for batch in segment(ids, RESOLVE_BATCH)? {
        let found = api.tracks(token, &batch).await?;
        tracks.extend(found.iter().map(TrackSummary::from));
    }
    Ok(tracks)
}

/// Recommends from `seeds` and resolves the candidates into display records.
pub async fn recommend_tracks(
    api: &dyn CatalogApi,
    recommender: &dyn Recommender,
    token: &AccessToken,
    seeds: &[String],
    max_calls: Option<usize>,
) -> Result<Vec<TrackSummary>, AppError> {
    let ids = recommend(recommender, seeds, max_calls).await?;
    tracing::info!(seeds = seeds.len(), recommended = ids.len(), "recommendations ready");
    resolve_tracks(api, token, &ids).await
}
