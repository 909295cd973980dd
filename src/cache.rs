//! Read-through playlist cache.
//!
//! Entries live for the lifetime of the cache object and are never evicted.
//! Callers always get their own clone of a record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::spotify::{AccessToken, CatalogApi, PlaylistRecord, UpstreamError};

type Slot = Arc<OnceCell<PlaylistRecord>>;

/// Playlist records keyed by playlist id.
///
/// Each id owns a slot that is filled at most once. Concurrent lookups of the
/// same id wait on one upstream fetch; the map lock is only held to find the
/// slot, so lookups of different ids never wait on each other. A failed fetch
/// leaves the slot empty and the next lookup retries.
#[derive(Default)]
pub struct PlaylistCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl PlaylistCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id.to_string()).or_default().clone()
    }

    /// Returns a copy of the playlist, fetching it on first use.
    pub async fn get_playlist(
        &self,
        api: &dyn CatalogApi,
        token: &AccessToken,
        id: &str,
    ) -> Result<PlaylistRecord, UpstreamError> {
        let slot = self.slot(id);
        if let Some(record) = slot.get() {
            tracing::debug!(playlist = id, "playlist cache hit");
            return Ok(record.clone());
        }

        let result = slot
            .get_or_try_init(|| async {
                tracing::debug!(playlist = id, "playlist cache miss");
                api.playlist(token, id).await
            })
            .await
            .map(PlaylistRecord::clone);
        if result.is_err() {
            self.release_empty(id, slot);
        }
        result
    }

    /// Drops the slot of `id` after a failed fetch, unless it got filled or
    /// another lookup still holds it.
    fn release_empty(&self, id: &str, slot: Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = slots.get(id).is_some_and(|current| {
            // one reference in the map, one held here
            Arc::ptr_eq(current, &slot) && !slot.initialized() && Arc::strong_count(&slot) == 2
        });
        if unused {
            slots.remove(id);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of cached playlists.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|s| s.initialized()).count()
    }
}
