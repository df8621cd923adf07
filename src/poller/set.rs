use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::fetch::StatusFetcher;
use crate::pool::Pool;

use super::PollWorker;

/// Spawns one worker per pool and drains them on shutdown.
///
/// One cancellation signal is shared by every worker; completion is a
/// per-worker join, so a worker that never reaches its stop check is
/// attributable by name (its join is logged before being awaited and will
/// be the one that hangs).
pub struct WorkerSet {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<(String, JoinHandle<()>)>,
}

impl WorkerSet {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            workers: Vec::new(),
        }
    }

    /// Spawn the polling worker for one pool.
    pub fn spawn(&mut self, pool: Arc<Pool>, fetcher: Box<dyn StatusFetcher>, interval: Duration) {
        let name = pool.name().to_string();
        let worker = PollWorker::new(pool, fetcher, interval, self.shutdown_tx.subscribe());

        debug!(pool = %name, "spawning poll worker");
        self.workers.push((name, tokio::spawn(worker.run())));
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Broadcast the stop signal, then block until every worker has
    /// acknowledged by finishing its task.
    pub async fn shutdown(self) {
        info!(workers = self.workers.len(), "stopping poll workers");

        // Receivers observe this at their next stop check.
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in self.workers {
            debug!(pool = %name, "waiting for worker");
            if let Err(e) = handle.await {
                error!(pool = %name, error = %e, "worker did not stop cleanly");
            }
        }

        info!("all poll workers stopped");
    }
}

impl Default for WorkerSet {
    fn default() -> Self {
        Self::new()
    }
}
