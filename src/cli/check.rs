//! Handler for the `check` command.

use crate::cli::{CheckCommand, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::pool;

/// Execute a diagnostic check.
pub fn execute(command: &CheckCommand) -> Result<()> {
    match command {
        CheckCommand::Config(args) => check_config(args),
    }
}

fn check_config(args: &ConfigArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(ref dir) = args.pool_config_dir {
        config.pools.config_dir = dir.clone();
    }
    config.validate()?;

    let pools = pool::discover_pools(&config.pools.config_dir)?;

    println!("configuration OK");
    println!(
        "monitored pools in {}: {}",
        config.pools.config_dir.display(),
        pools.len()
    );
    for pool in &pools {
        println!(
            "  {} -> {} (status at {})",
            pool.name(),
            pool.endpoint(),
            pool.status_path()
        );
    }

    Ok(())
}
