//! Handler for the `run` command.

use tracing::info;

use crate::app::Orchestrator;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    config.init_logging();

    info!(
        listen_address = %config.server.listen_address,
        telemetry_path = %config.server.telemetry_path,
        pool_config_dir = %config.pools.config_dir.display(),
        "phpfpm-exporter starting"
    );

    Orchestrator::run(config).await?;

    info!("phpfpm-exporter stopped");
    Ok(())
}

/// Load the configuration file (if any) and apply CLI overrides.
fn load_config(args: &RunArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(ref address) = args.web_listen_address {
        config.server.listen_address = address.clone();
    }
    if let Some(ref path) = args.web_telemetry_path {
        config.server.telemetry_path = path.clone();
    }
    if let Some(ref dir) = args.pool_config_dir {
        config.pools.config_dir = dir.clone();
    }
    if let Some(interval) = args.poll_interval {
        config.pools.poll_interval_secs = interval;
    }
    if let Some(strategy) = args.fetcher {
        config.fetcher.strategy = strategy;
    }
    if let Some(timeout) = args.connect_timeout_ms {
        config.fetcher.connect_timeout_ms = timeout;
    }
    if let Some(ref path) = args.helper_path {
        config.fetcher.helper_path = path.clone();
    }
    if let Some(timeout) = args.helper_timeout {
        config.fetcher.helper_timeout_secs = timeout;
    }
    if let Some(ref path) = args.helper_ld_library_path {
        config.fetcher.helper_ld_library_path = Some(path.clone());
    }
    if let Some(ref path) = args.pid_file {
        config.process.pid_file = Some(path.clone());
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.validate()?;

    Ok(config)
}
