//! Periodic idle-sweep task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::resident::ResidentManager;

/// Background task that evicts the resident model after the configured
/// idle timeout. Holds the same lock as the manager's acquire path, so its
/// check-then-evict never races a fresh acquisition.
pub struct IdleSweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl IdleSweeper {
    /// Spawn the sweep loop. `period` is how often to check; the idle
    /// threshold itself lives in the manager's config.
    pub fn spawn(manager: Arc<ResidentManager>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it so a fresh start
            // does not sweep before anything could have been used.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if manager.evict_if_idle().await {
                            debug!("Idle sweep evicted the resident model");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("Idle sweeper shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the sweep loop and wait for it to exit. After this returns the
    /// sweeper cannot touch the manager again, so teardown is race-free.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if self.handle.await.is_err() {
            info!("Idle sweeper task aborted");
        }
    }
}
