//! Mock [`StatusFetcher`] implementation for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::FetchError;
use crate::fetch::StatusFetcher;

/// A fetcher with a scripted queue of results.
///
/// Each call to `fetch()` pops the next result; once the queue is
/// exhausted, every further call reports a protocol error, which a worker
/// treats like any other failed cycle (logged, cache untouched).
pub struct ScriptedFetcher {
    results: Mutex<VecDeque<Result<String, FetchError>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_results(self, results: Vec<Result<String, FetchError>>) -> Self {
        *self.results.lock() = results.into();
        self
    }

    /// Shared counter for asserting how many fetches ran.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Protocol("scripted fetcher exhausted".into())))
    }
}
