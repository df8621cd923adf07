//! Status fetch strategies.
//!
//! One [`StatusFetcher`] is built per pool at startup and never swapped at
//! runtime. Both implementations are stateless per call: they re-resolve and
//! re-dial on every invocation, trading efficiency for correctness at a
//! seconds-scale polling cadence.

pub mod fcgi;
mod helper;

pub use fcgi::FcgiFetcher;
pub use helper::HelperFetcher;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::pool::Pool;

/// Query string selecting JSON output from the FPM status module.
const STATUS_QUERY: &str = "json";

/// Produces one raw status payload (the JSON body, headers stripped).
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Which fetch implementation to use, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// In-process FastCGI client.
    Native,
    /// External cgi-fcgi helper subprocess.
    Helper,
}

impl Default for FetchStrategy {
    fn default() -> Self {
        Self::Native
    }
}

/// Build the configured fetcher for one pool.
pub fn build_fetcher(pool: &Pool, config: &FetcherConfig) -> Box<dyn StatusFetcher> {
    match config.strategy {
        FetchStrategy::Native => Box::new(FcgiFetcher::new(
            pool.endpoint(),
            pool.status_path(),
            Duration::from_millis(config.connect_timeout_ms),
        )),
        FetchStrategy::Helper => Box::new(HelperFetcher::new(
            &config.helper_path,
            pool.endpoint(),
            pool.status_path(),
            Duration::from_secs(config.helper_timeout_secs),
            config.helper_ld_library_path.clone(),
        )),
    }
}
