use std::sync::Arc;

use board::PriceSnapshot;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone)]
pub struct SyncState {
    pub status: SyncStatus,
    pub snapshot: Option<Arc<PriceSnapshot>>,
    pub last_error: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Loading,
            snapshot: None,
            last_error: None,
        }
    }
}

/// Process-wide latest snapshot, observable by any number of surfaces.
///
/// Clones share the same underlying channel.
#[derive(Clone)]
pub struct SnapshotCache {
    tx: Arc<watch::Sender<SyncState>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCache {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SyncState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SyncState {
        self.tx.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<PriceSnapshot>> {
        self.tx.borrow().snapshot.clone()
    }

    pub fn publish(&self, snapshot: Arc<PriceSnapshot>) {
        self.tx.send_modify(|state| {
            state.status = SyncStatus::Ready;
            state.snapshot = Some(snapshot);
            state.last_error = None;
        });
    }

    /// Flags the failure while keeping whatever snapshot was last published.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            state.status = SyncStatus::Error;
            state.last_error = Some(message);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::PricedItem;

    fn snapshot(buy: u64) -> Arc<PriceSnapshot> {
        let updated_at = "2024-05-01T08:00:00Z".parse().expect("timestamp");
        Arc::new(PriceSnapshot::new(
            vec![PricedItem::new(1, "SJC 9999", buy, buy + 1)],
            updated_at,
        ))
    }

    #[test]
    fn starts_loading_without_snapshot() {
        let cache = SnapshotCache::new();
        let state = cache.current();
        assert_eq!(state.status, SyncStatus::Loading);
        assert!(state.snapshot.is_none());
    }

    #[test]
    fn failure_keeps_last_good_snapshot() {
        let cache = SnapshotCache::new();
        cache.publish(snapshot(100));
        cache.fail("connection refused");

        let state = cache.current();
        assert_eq!(state.status, SyncStatus::Error);
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
        assert_eq!(state.snapshot.expect("kept").items[0].buy, 100);

        cache.publish(snapshot(120));
        let state = cache.current();
        assert_eq!(state.status, SyncStatus::Ready);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn clones_share_one_channel() {
        let cache = SnapshotCache::new();
        let other = cache.clone();
        let mut rx = other.subscribe();
        cache.publish(snapshot(7));
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().snapshot.as_ref().map(|s| s.items[0].buy), Some(7));
    }
}
