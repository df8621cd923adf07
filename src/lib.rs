//! phpfpm-exporter - Prometheus exporter for PHP-FPM worker pool status.
//!
//! One background worker per monitored pool polls the FPM status page on a
//! fixed interval and caches the last successfully decoded snapshot; the
//! exposition endpoint renders every pool's cached snapshot on each scrape,
//! so transient fetch failures never produce gaps or torn values.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files with CLI overrides
//! - [`pool`] - Pool identity, discovery from FPM pool files, status cache
//! - [`fetch`] - Status fetch strategies (in-process FastCGI, cgi-fcgi helper)
//! - [`poller`] - Per-pool polling workers and shutdown coordination
//! - [`metrics`] - Prometheus exposition model
//! - [`server`] - HTTP exposition endpoint
//! - [`app`] - Application orchestration
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use phpfpm_exporter::app::Orchestrator;
//! use phpfpm_exporter::config::Config;
//!
//! # async fn run() -> phpfpm_exporter::error::Result<()> {
//! let config = Config::default();
//! Orchestrator::run(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod pool;
pub mod poller;
pub mod server;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
