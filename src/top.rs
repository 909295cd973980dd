//! Curated chart playlists, served through the playlist cache.

use crate::cache::PlaylistCache;
use crate::error::AppError;
use crate::spotify::{AccessToken, CatalogApi, PlaylistRecord};

pub const DEFAULT_TOP_PLAYLIST_IDS: [&str; 8] = [
    "37i9dQZF1DXcBWIGoYBM5M",
    "37i9dQZEVXbMDoHDwVN2tF",
    "37i9dQZF1DX0XUsuxWHRQd",
    "37i9dQZF1DX10zKzsJ2jva",
    "37i9dQZF1DWY7IeIP1cdjF",
    "37i9dQZF1DWXRqgorJj26U",
    "37i9dQZF1DX4o1oenSJRJd",
    "37i9dQZF1DX4UtSsGT1Sbe",
];

/// Summaries of the curated playlists, in configured order.
///
/// Playlists that fail to load are skipped. If none load the request fails
/// with 500, since the charts are never legitimately empty.
pub async fn get_top_playlists(
    api: &dyn CatalogApi,
    cache: &PlaylistCache,
    token: &AccessToken,
    ids: &[String],
) -> Result<Vec<PlaylistRecord>, AppError> {
    let mut playlists = Vec::with_capacity(ids.len());
    for id in ids {
        match cache.get_playlist(api, token, id).await {
            Ok(mut playlist) => {
                playlist.tracks = None;
                playlists.push(playlist);
            }
            Err(e) => tracing::warn!(playlist = %id, error = %e, "skipping top playlist"),
        }
    }

    tracing::debug!(loaded = playlists.len(), cached = cache.len(), "top playlists");
    if playlists.is_empty() {
        return Err(AppError::Internal("no top playlist could be loaded".into()));
    }
    Ok(playlists)
}
