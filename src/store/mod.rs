//! Latest-snapshot store.
//!
//! Holds the most recent validated distribution per source. Refreshes
//! replace the entry wholesale — readers either see the previous
//! complete snapshot or the new one, never a partial update.

use crate::distribution::Distribution;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct StoredSnapshot {
    distribution: Arc<Distribution>,
    stored_at: Instant,
}

#[derive(Clone)]
pub struct SnapshotStore {
    snapshots: Arc<DashMap<String, StoredSnapshot>>,
    /// Maximum age before a snapshot is considered stale.
    max_age: Duration,
}

impl SnapshotStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            snapshots: Arc::new(DashMap::new()),
            max_age,
        }
    }

    /// Replace the snapshot for a source.
    pub fn replace(&self, source: &str, distribution: Distribution) {
        self.snapshots.insert(
            source.to_string(),
            StoredSnapshot {
                distribution: Arc::new(distribution),
                stored_at: Instant::now(),
            },
        );
    }

    /// The latest snapshot for a source, if one exists and is fresh.
    pub fn latest(&self, source: &str) -> Option<Arc<Distribution>> {
        let stored = self.snapshots.get(source)?;
        if stored.stored_at.elapsed() >= self.max_age {
            return None;
        }
        Some(stored.distribution.clone())
    }

    /// True when the source has no snapshot or only a stale one.
    pub fn is_stale(&self, source: &str) -> bool {
        self.latest(source).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::reference_snapshot;

    #[test]
    fn test_replace_and_read_back() {
        let store = SnapshotStore::new(Duration::from_secs(60));
        assert!(store.is_stale("primary"));

        store.replace("primary", reference_snapshot());
        let snapshot = store.latest("primary").expect("snapshot should be fresh");
        assert_eq!(snapshot.total_addresses, 40_000_000);
        assert!(!store.is_stale("primary"));
    }

    #[test]
    fn test_zero_max_age_is_always_stale() {
        let store = SnapshotStore::new(Duration::ZERO);
        store.replace("primary", reference_snapshot());
        assert!(store.latest("primary").is_none());
        assert!(store.is_stale("primary"));
    }

    #[test]
    fn test_replacement_is_wholesale() {
        let store = SnapshotStore::new(Duration::from_secs(60));
        store.replace("primary", reference_snapshot());

        let mut updated = reference_snapshot();
        updated.source = "second fetch".to_string();
        store.replace("primary", updated);

        assert_eq!(store.latest("primary").unwrap().source, "second fetch");
    }
}
