use parking_lot::RwLock;

use super::status::PoolStatus;

/// Thread-safe holder of the last successfully decoded status snapshot.
///
/// Exclusive-write (the pool's worker), multi-read (scrape handlers). The
/// critical section is an O(1) field copy; no I/O ever happens under the
/// lock.
#[derive(Debug, Default)]
pub struct StatusCache {
    inner: RwLock<PoolStatus>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(PoolStatus::default()),
        }
    }

    /// Install a new snapshot as the current one.
    pub fn replace(&self, status: PoolStatus) {
        *self.inner.write() = status;
    }

    /// Return a full copy of the current snapshot.
    ///
    /// The copy completes before the read lock is released, so a caller can
    /// never observe fields from two different fetch cycles.
    pub fn snapshot(&self) -> PoolStatus {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn uniform(n: i64) -> PoolStatus {
        PoolStatus {
            start_time: n,
            start_since: n,
            accepted_conn: n,
            listen_queue: n,
            max_listen_queue: n,
            listen_queue_len: n,
            idle_processes: n,
            active_processes: n,
            total_processes: n,
            max_active_processes: n,
            max_children_reached: n,
            slow_requests: n,
        }
    }

    fn is_uniform(status: &PoolStatus) -> bool {
        let n = status.start_time;
        [
            status.start_since,
            status.accepted_conn,
            status.listen_queue,
            status.max_listen_queue,
            status.listen_queue_len,
            status.idle_processes,
            status.active_processes,
            status.total_processes,
            status.max_active_processes,
            status.max_children_reached,
            status.slow_requests,
        ]
        .iter()
        .all(|&field| field == n)
    }

    #[test]
    fn starts_all_zero() {
        let cache = StatusCache::new();
        assert_eq!(cache.snapshot(), PoolStatus::default());
    }

    #[test]
    fn replace_then_snapshot_round_trips() {
        let cache = StatusCache::new();
        cache.replace(uniform(7));
        assert_eq!(cache.snapshot(), uniform(7));
    }

    /// One writer cycling through uniform snapshots, many readers. Every read
    /// must observe a snapshot written by a single `replace` call, never a
    /// mix of two cycles.
    #[test]
    fn concurrent_reads_never_tear() {
        let cache = Arc::new(StatusCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for n in 0..5_000 {
                    cache.replace(uniform(n));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        let snapshot = cache.snapshot();
                        assert!(is_uniform(&snapshot), "torn snapshot: {snapshot:?}");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
