//! HTTP handlers for the aggregation API.
//!
//! Successful responses carry JSON bodies; failures are an empty list with
//! the status described by [`AppError`].

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::aggregate::{get_playlist_detail, PlaylistDetail};
use crate::cache::PlaylistCache;
use crate::config::split_ids;
use crate::error::AppError;
use crate::recommender::{recommend_tracks, Recommender};
use crate::search;
use crate::spotify::{authorize, AudioFeatures, CatalogApi, PlaylistRecord, Track, TrackSummary};
use crate::top::get_top_playlists;

/// Shared per-process state.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn CatalogApi>,
    pub recommender: Arc<dyn Recommender>,
    pub cache: Arc<PlaylistCache>,
    pub max_recommender_calls: usize,
    pub top_playlist_ids: Arc<Vec<String>>,
}

/// Query parameters for the search endpoints.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free text; empty yields an empty result.
    #[serde(default)]
    pub query: String,
}

/// Body of `POST /recommend-tracks`.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Seed track ids.
    pub data: Vec<String>,
}

/// Comma separated track ids.
#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    #[serde(default)]
    pub ids: String,
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /search-tracks
pub async fn search_tracks(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<TrackSummary>>, AppError> {
    Ok(Json(search::search_tracks(state.api.as_ref(), &params.query).await?))
}

/// GET /search-playlists
pub async fn search_playlists(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<PlaylistRecord>>, AppError> {
    Ok(Json(search::search_playlists(state.api.as_ref(), &params.query).await?))
}

/// POST /recommend-tracks - Recommendations continuing the given seeds.
pub async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendRequest>,
) -> Result<Json<Vec<TrackSummary>>, AppError> {
    tracing::info!(seeds = body.data.len(), "recommend tracks");
    let token = authorize(state.api.as_ref()).await?;
    let tracks = recommend_tracks(
        state.api.as_ref(),
        state.recommender.as_ref(),
        &token,
        &body.data,
        Some(state.max_recommender_calls),
    )
    .await?;
    Ok(Json(tracks))
}

/// GET /playlists/:id/recommendations - Recommendations seeded by a playlist.
pub async fn playlist_recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TrackSummary>>, AppError> {
    let token = authorize(state.api.as_ref()).await?;
    let playlist = state
        .cache
        .get_playlist(state.api.as_ref(), &token, &id)
        .await?;
    let tracks = recommend_tracks(
        state.api.as_ref(),
        state.recommender.as_ref(),
        &token,
        playlist.track_ids(),
        Some(state.max_recommender_calls),
    )
    .await?;
    Ok(Json(tracks))
}

/// GET /playlists/:id - Playlist with merged per-track data.
pub async fn playlist_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaylistDetail>, AppError> {
    let token = authorize(state.api.as_ref()).await?;
    let detail = get_playlist_detail(state.api.as_ref(), &state.cache, &token, &id).await?;
    Ok(Json(detail))
}

/// GET /top-playlists
pub async fn top_playlists(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlaylistRecord>>, AppError> {
    let token = authorize(state.api.as_ref()).await?;
    let playlists = get_top_playlists(
        state.api.as_ref(),
        &state.cache,
        &token,
        &state.top_playlist_ids,
    )
    .await?;
    Ok(Json(playlists))
}

/// GET /audio-features - Single upstream call, at most 100 ids.
pub async fn audio_features(
    State(state): State<AppState>,
    Query(params): Query<IdsQuery>,
) -> Result<Json<Vec<AudioFeatures>>, AppError> {
    let token = authorize(state.api.as_ref()).await?;
    let ids = split_ids(&params.ids);
    Ok(Json(state.api.audio_features(&token, &ids).await?))
}

/// GET /general-info - Single upstream call, at most 50 ids.
pub async fn general_info(
    State(state): State<AppState>,
    Query(params): Query<IdsQuery>,
) -> Result<Json<Vec<Track>>, AppError> {
    let token = authorize(state.api.as_ref()).await?;
    let ids = split_ids(&params.ids);
    Ok(Json(state.api.tracks(&token, &ids).await?))
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/search-tracks", get(search_tracks))
        .route("/search-playlists", get(search_playlists))
        .route("/recommend-tracks", post(recommend))
        .route("/top-playlists", get(top_playlists))
        .route("/playlists/:id", get(playlist_detail))
        .route("/playlists/:id/recommendations", get(playlist_recommendations))
        .route("/audio-features", get(audio_features))
        .route("/general-info", get(general_info))
}
