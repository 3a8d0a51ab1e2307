use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use common::Category;
use common::filename::sanitize_for_storage;
use rand::Rng;

/// Produces durable storage paths for committed assets.
///
/// Paths look like `{category}/{unix millis}_{sequence}_{random}_{name}`.
/// The per-process sequence keeps names from the same millisecond apart and
/// the random suffix keeps separate processes apart.
#[derive(Debug, Default)]
pub struct StoredNameGenerator {
    sequence: AtomicU64,
}

impl StoredNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, category: Category, original_name: &str, at: DateTime<Utc>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let suffix: u32 = rand::rng().random();
        format!(
            "{}/{}_{seq}_{suffix:08x}_{}",
            category.partition(),
            at.timestamp_millis(),
            sanitize_for_storage(original_name)
        )
    }
}
