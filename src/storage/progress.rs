//! Per-film playback progress
//!
//! Offsets are stored in seconds under `PlaybackProgress_<film_id>`.
//! The writer stores whatever it is given; the reader only ever hands back
//! finite, positive offsets.

use serde_json::Value;
use std::sync::Arc;

use super::KeyValueStore;

/// Key prefix for progress entries
pub const PROGRESS_KEY_PREFIX: &str = "PlaybackProgress_";

/// Durable film id -> watched seconds mapping
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(film_id: &str) -> String {
        format!("{}{}", PROGRESS_KEY_PREFIX, film_id)
    }

    /// Last saved offset for a film, if it is a usable positive number
    pub fn get_progress(&self, film_id: &str) -> Option<f64> {
        self.store
            .get_f64(&Self::key(film_id))
            .filter(|s| is_usable(*s))
    }

    /// Save an offset, replacing any previous one
    pub fn save_progress(&self, film_id: &str, seconds: f64) {
        // JSON has no NaN/inf; those land as null and read back as absent
        let value = serde_json::Number::from_f64(seconds)
            .map(Value::Number)
            .unwrap_or(Value::Null);

        if let Err(e) = self.store.set(&Self::key(film_id), value) {
            tracing::warn!(film_id, error = %e, "failed to save playback progress");
        }
    }

    /// Forget a film's offset (called when playback runs to the end)
    pub fn clear_progress(&self, film_id: &str) {
        if let Err(e) = self.store.remove(&Self::key(film_id)) {
            tracing::warn!(film_id, error = %e, "failed to clear playback progress");
        }
    }

    /// All usable entries, sorted by film id
    pub fn entries(&self) -> Vec<(String, f64)> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| {
                let film_id = key.strip_prefix(PROGRESS_KEY_PREFIX)?.to_string();
                let seconds = self.get_progress(&film_id)?;
                Some((film_id, seconds))
            })
            .collect()
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore").finish_non_exhaustive()
    }
}

fn is_usable(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}
