use std::sync::Arc;
use std::time::Duration;

use board::PriceSnapshot;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{SnapshotCache, SyncState};
use crate::{PriceSource, Result};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(3);

/// Pulls the price list from a [`PriceSource`] into a [`SnapshotCache`].
pub struct SyncClient<S> {
    source: Arc<S>,
    cache: SnapshotCache,
    period: Duration,
}

impl<S> SyncClient<S>
where
    S: PriceSource + 'static,
{
    pub fn new(source: Arc<S>, cache: SnapshotCache) -> Self {
        Self {
            source,
            cache,
            period: DEFAULT_POLL_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// One fetch. A failure flags the cache but keeps its last good snapshot.
    pub async fn poll_once(&self) -> Result<Arc<PriceSnapshot>> {
        match self.source.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                debug!(rows = snapshot.len(), updated_at = %snapshot.updated_at, "poll succeeded");
                self.cache.publish(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "poll failed, keeping last snapshot");
                self.cache.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Starts the loop: an immediate poll, then one per period, plus one per
    /// [`SyncHandle::revalidate`]. Polls run one at a time.
    pub fn spawn(self) -> SyncHandle {
        let focus = Arc::new(Notify::new());
        let cache = self.cache.clone();
        let task = tokio::spawn(self.run(Arc::clone(&focus)));
        SyncHandle { focus, cache, task }
    }

    async fn run(self, focus: Arc<Notify>) {
        info!(period_ms = self.period.as_millis() as u64, "price sync started");
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = focus.notified() => {
                    debug!("revalidating on focus");
                    ticker.reset();
                }
            }
            // Errors are already recorded in the cache; the next tick retries.
            let _ = self.poll_once().await;
        }
    }
}

/// Owner of a running poll loop. Dropping it stops the loop.
pub struct SyncHandle {
    focus: Arc<Notify>,
    cache: SnapshotCache,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Polls right away, e.g. when the display regains focus.
    ///
    /// A trigger that lands during an in-flight poll yields exactly one follow-up poll.
    pub fn revalidate(&self) {
        self.focus.notify_one();
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.cache.subscribe()
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the loop and waits for the task to wind down.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
