//! Playlist detail: a playlist joined with audio features and general info
//! for every one of its tracks.

use serde::Serialize;

use crate::cache::PlaylistCache;
use crate::error::AppError;
use crate::segment::segment;
use crate::spotify::{AccessToken, AudioFeatures, CatalogApi, PlaylistRecord, Track};

/// Ids per audio-features call.
pub const AUDIO_FEATURES_BATCH: usize = 100;
/// Ids per tracks (general info) call.
pub const GENERAL_INFO_BATCH: usize = 50;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MergedTrackRecord {
    pub audio_features: AudioFeatures,
    pub general_info: Track,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlaylistDetail {
    pub tracks: Vec<MergedTrackRecord>,
    pub playlist: PlaylistRecord,
}

/// The two result sets cannot be paired one to one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("got {features} audio feature records but {info} general info records")]
    LengthMismatch { features: usize, info: usize },
    #[error("ids diverge at position {index}: {feature_id} vs {info_id}")]
    KeyMismatch {
        index: usize,
        feature_id: String,
        info_id: String,
    },
}

/// Sorts both lists by id and pairs them position by position.
///
/// Both lists come from the same id set, so after sorting they must have the
/// same length and the same id at every position.
pub fn merge_by_id(
    mut features: Vec<AudioFeatures>,
    mut info: Vec<Track>,
) -> Result<Vec<MergedTrackRecord>, MergeError> {
    features.sort_by(|a, b| a.id.cmp(&b.id));
    info.sort_by(|a, b| a.id.cmp(&b.id));

    if features.len() != info.len() {
        return Err(MergeError::LengthMismatch {
            features: features.len(),
            info: info.len(),
        });
    }

    features
        .into_iter()
        .zip(info)
        .enumerate()
        .map(|(index, (audio_features, general_info))| {
            if audio_features.id != general_info.id {
                return Err(MergeError::KeyMismatch {
                    index,
                    feature_id: audio_features.id,
                    info_id: general_info.id,
                });
            }
            Ok(MergedTrackRecord {
                audio_features,
                general_info,
            })
        })
        .collect()
}

async fn fetch_audio_features(
    api: &dyn CatalogApi,
    token: &AccessToken,
    ids: &[String],
) -> Result<Vec<AudioFeatures>, AppError> {
    let mut out = Vec::with_capacity(ids.len());
    for batch in segment(ids, AUDIO_FEATURES_BATCH)? {
        out.extend(api.audio_features(token, &batch).await?);
    }
    Ok(out)
}

async fn fetch_general_info(
    api: &dyn CatalogApi,
    token: &AccessToken,
    ids: &[String],
) -> Result<Vec<Track>, AppError> {
    let mut out = Vec::with_capacity(ids.len());
    for batch in segment(ids, GENERAL_INFO_BATCH)? {
        out.extend(api.tracks(token, &batch).await?);
    }
    Ok(out)
}

/// Builds the detail view of playlist `id`.
///
/// The playlist comes from the cache. The two batch streams run concurrently;
/// the first failed call fails the whole request with its status.
pub async fn get_playlist_detail(
    api: &dyn CatalogApi,
    cache: &PlaylistCache,
    token: &AccessToken,
    id: &str,
) -> Result<PlaylistDetail, AppError> {
    let playlist = cache.get_playlist(api, token, id).await?;
    let ids = playlist.track_ids();

    let (features, info) = tokio::try_join!(
        fetch_audio_features(api, token, ids),
        fetch_general_info(api, token, ids),
    )?;

    let tracks = merge_by_id(features, info)?;
    tracing::info!(playlist = id, tracks = tracks.len(), "playlist detail assembled");

    Ok(PlaylistDetail { tracks, playlist })
}
