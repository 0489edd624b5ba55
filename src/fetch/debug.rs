//! Development-only inspection of the fetch layer.
//!
//! Only compiled with the `dev` feature. Register a fetcher with [`expose`]
//! and read its state from anywhere through the free functions below.

use once_cell::sync::Lazy;
use std::sync::Mutex;

use super::DedupFetcher;
use crate::types::CacheStats;

static EXPOSED: Lazy<Mutex<Option<DedupFetcher>>> = Lazy::new(|| Mutex::new(None));

/// Make `fetcher` the one reported by this module, replacing any previous one.
pub fn expose(fetcher: &DedupFetcher) {
    if let Ok(mut slot) = EXPOSED.lock() {
        *slot = Some(fetcher.clone());
        tracing::debug!("fetch cache exposed for debugging");
    }
}

/// Forget the exposed fetcher.
pub fn withdraw() {
    if let Ok(mut slot) = EXPOSED.lock() {
        *slot = None;
    }
}

pub fn cache_stats() -> Option<CacheStats> {
    EXPOSED.lock().ok()?.as_ref().map(DedupFetcher::cache_stats)
}

pub fn pending_keys() -> Vec<String> {
    EXPOSED
        .lock()
        .ok()
        .and_then(|slot| slot.as_ref().map(DedupFetcher::pending_keys))
        .unwrap_or_default()
}
