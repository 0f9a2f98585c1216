use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;

use super::decision::{EntityKind, RateLimitDecision};
use super::snapshot::Snapshot;
use super::DEFAULT_RETENTION_DAYS;

/// Holds the most recently published [`Snapshot`].
///
/// Readers take one `Arc` to a snapshot and answer entirely from it, while a publish
/// replaces the whole snapshot in a single atomic store. A query therefore never sees
/// the target map of one snapshot together with the entry map of another.
#[derive(Debug)]
pub struct RateLimitCache {
    snapshot: ArcSwap<Snapshot>,
}

impl Default for RateLimitCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitCache {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn query(&self, entity_id: &str, kind: EntityKind) -> RateLimitDecision {
        let snapshot = self.snapshot.load();

        match snapshot.resolve(entity_id, kind) {
            Some(entry) => entry.operations,
            None => {
                warn!(
                    entity_id,
                    entity_type = %kind,
                    "failed to resolve rate limit information"
                );
                RateLimitDecision::UNKNOWN
            }
        }
    }

    pub fn retention_for(&self, target_id: &str) -> u32 {
        self.snapshot
            .load()
            .resolve(target_id, EntityKind::Target)
            .map(|entry| entry.retention_days)
            .unwrap_or(DEFAULT_RETENTION_DAYS)
    }

    pub fn organization_count(&self) -> usize {
        self.snapshot.load().organization_count()
    }

    pub fn target_count(&self) -> usize {
        self.snapshot.load().target_count()
    }
}
