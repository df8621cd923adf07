//! Command-line interface definitions.

pub mod check;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::fetch::FetchStrategy;

/// phpfpm-exporter - Prometheus exporter for PHP-FPM worker pool status.
#[derive(Parser, Debug)]
#[command(name = "phpfpm-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exporter (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `phpfpm-exporter check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration and report the discovered pool set
    Config(ConfigArgs),
}

/// Shared arguments for commands that only need configuration.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the directory holding pool definition files
    #[arg(long)]
    pub pool_config_dir: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on for web interface and telemetry
    #[arg(long)]
    pub web_listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long)]
    pub web_telemetry_path: Option<String>,

    /// Directory holding PHP-FPM pool definition files
    #[arg(long)]
    pub pool_config_dir: Option<PathBuf>,

    /// Poll interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Status fetch strategy
    #[arg(long, value_enum)]
    pub fetcher: Option<FetchStrategy>,

    /// Native client connect timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// cgi-fcgi program path (helper strategy)
    #[arg(long)]
    pub helper_path: Option<PathBuf>,

    /// Overall helper deadline in seconds
    #[arg(long)]
    pub helper_timeout: Option<u64>,

    /// LD_LIBRARY_PATH value to run the helper with
    #[arg(long)]
    pub helper_ld_library_path: Option<String>,

    /// Path to the FPM master pid file (enables process metrics)
    #[arg(long)]
    pub pid_file: Option<PathBuf>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}
