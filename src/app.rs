//! Application orchestration.
//!
//! Wires discovery, per-pool workers, the exposition server, and the
//! shutdown drain together.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch;
use crate::metrics::{self, Exporter};
use crate::pool;
use crate::poller::WorkerSet;
use crate::server;

pub struct Orchestrator;

impl Orchestrator {
    /// Run until an interrupt or termination signal arrives, then drain.
    pub async fn run(config: Config) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(signal_listener(shutdown_tx));
        Self::run_with_shutdown(config, shutdown_rx).await
    }

    /// Run with an externally controlled shutdown signal.
    ///
    /// Tests drive this directly: flipping the channel to `true` triggers
    /// the same drain path the OS signals do.
    pub async fn run_with_shutdown(
        config: Config,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let pools = pool::discover_pools(&config.pools.config_dir)?;
        if pools.is_empty() {
            warn!(
                dir = %config.pools.config_dir.display(),
                "no pools discovered, serving empty metrics"
            );
        }
        info!(
            pools = pools.len(),
            interval_secs = config.pools.poll_interval_secs,
            strategy = ?config.fetcher.strategy,
            "monitoring pools"
        );

        let exporter = Exporter::new(pools.clone())?;

        if let Some(pid_file) = &config.process.pid_file {
            if let Err(e) =
                metrics::register_master_process_collector(exporter.registry(), pid_file)
            {
                warn!(error = %e, "master process metrics disabled");
            }
        }

        // Bind before spawning anything so a bad listen address is fatal.
        let listener = server::bind(&config.server.listen_address).await?;

        let mut workers = WorkerSet::new();
        for pool in &pools {
            let fetcher = fetch::build_fetcher(pool, &config.fetcher);
            workers.spawn(Arc::clone(pool), fetcher, config.poll_interval());
        }

        let app = server::router(exporter, &config.server.telemetry_path);
        let server_task = tokio::spawn(server::serve(listener, app, shutdown.clone()));

        if shutdown.wait_for(|stop| *stop).await.is_err() {
            warn!("shutdown channel closed without a signal");
        }

        info!("shutdown requested, draining workers");
        workers.shutdown().await;

        match server_task.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "metrics server task did not join cleanly"),
        }

        info!("clean shutdown");
        Ok(())
    }
}

/// Flip the shutdown signal on SIGINT or SIGTERM.
async fn signal_listener(shutdown: watch::Sender<bool>) {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c => info!("interrupt received"),
                _ = terminate.recv() => info!("termination signal received"),
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler, falling back to SIGINT only");
            let _ = ctrl_c.await;
            info!("interrupt received");
        }
    }

    let _ = shutdown.send(true);
}
