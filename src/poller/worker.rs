use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::fetch::StatusFetcher;
use crate::pool::{Pool, PoolStatus};

/// One polling task for one pool.
///
/// Every cycle fetches, decodes, and replaces the pool snapshot. Fetch and
/// decode failures are recovered locally: the last good snapshot keeps
/// being served and the worker moves on to the next cycle. No failure in
/// one pool's worker affects another pool.
///
/// The stop check happens after the interval sleep, so worst-case shutdown
/// latency is one poll interval plus one fetch attempt.
pub struct PollWorker {
    pool: Arc<Pool>,
    fetcher: Box<dyn StatusFetcher>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PollWorker {
    pub fn new(
        pool: Arc<Pool>,
        fetcher: Box<dyn StatusFetcher>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pool,
            fetcher,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        let pool = self.pool.as_ref();

        loop {
            self.poll_once(pool).await;

            tokio::time::sleep(self.interval).await;

            if *self.shutdown.borrow() {
                debug!(pool = pool.name(), "worker acknowledged stop signal");
                break;
            }
        }
    }

    async fn poll_once(&self, pool: &Pool) {
        let payload = match self.fetcher.fetch().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    pool = pool.name(),
                    error = %e,
                    "status fetch failed, keeping last snapshot"
                );
                return;
            }
        };

        match PoolStatus::from_json(&payload) {
            Ok(status) => {
                pool.cache().replace(status);
                debug!(
                    pool = pool.name(),
                    accepted_conn = status.accepted_conn,
                    active_processes = status.active_processes,
                    "snapshot updated"
                );
            }
            Err(e) => {
                warn!(
                    pool = pool.name(),
                    error = %e,
                    "status payload decode failed, keeping last snapshot"
                );
            }
        }
    }
}
