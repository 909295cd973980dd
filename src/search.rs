//! Catalog search for tracks and playlists.

use crate::error::AppError;
use crate::spotify::{authorize, CatalogApi, PlaylistRecord, SearchItems, SearchKind, TrackSummary};

/// Results per search.
pub const SEARCH_LIMIT: u32 = 10;

async fn run(
    api: &dyn CatalogApi,
    query: &str,
    kind: SearchKind,
) -> Result<Option<SearchItems>, AppError> {
    // blank queries are answered locally
    if query.trim().is_empty() {
        return Ok(None);
    }
    let token = authorize(api).await?;
    tracing::info!(query, ?kind, "searching catalog");
    Ok(Some(api.search(&token, query, kind, SEARCH_LIMIT).await?))
}

pub async fn search_tracks(api: &dyn CatalogApi, query: &str) -> Result<Vec<TrackSummary>, AppError> {
    Ok(match run(api, query, SearchKind::Track).await? {
        Some(SearchItems::Tracks(tracks)) => tracks.iter().map(TrackSummary::from).collect(),
        _ => Vec::new(),
    })
}

pub async fn search_playlists(
    api: &dyn CatalogApi,
    query: &str,
) -> Result<Vec<PlaylistRecord>, AppError> {
    Ok(match run(api, query, SearchKind::Playlist).await? {
        Some(SearchItems::Playlists(playlists)) => playlists,
        _ => Vec::new(),
    })
}
