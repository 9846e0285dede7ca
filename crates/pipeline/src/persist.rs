//! Periodic persister for the content index.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use warden_core::ContentIndex;

/// Flushes the in-memory content index on a fixed interval.
///
/// Flushes run inline in this loop, so a flush that outlives the interval
/// delays the next tick rather than overlapping it. A final flush runs on
/// shutdown.
pub struct PeriodicPersister {
    index: Arc<ContentIndex>,
    path: PathBuf,
    interval: Duration,
}

impl PeriodicPersister {
    pub fn new(index: Arc<ContentIndex>, path: PathBuf, interval: Duration) -> Self {
        Self {
            index,
            path,
            interval,
        }
    }

    pub async fn run(&self, shutdown: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the index was just loaded.
        ticker.tick().await;

        // Register interest up front so a notification sent while a flush
        // is in progress is not lost.
        let notified = shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush(),
                _ = notified.as_mut() => {
                    self.flush();
                    break;
                }
            }
        }
    }

    fn flush(&self) {
        if let Err(e) = self.index.write_to_disk(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to flush content index");
        }
    }
}
