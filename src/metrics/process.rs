use std::path::Path;

use prometheus::Registry;
use tracing::info;

use crate::error::{ConfigError, Error, Result};

/// Register resource metrics for the FPM master process named by a pid
/// file.
///
/// The pid is read once at startup; an FPM master restarted under a new pid
/// needs an exporter restart to be picked up again.
pub fn register_master_process_collector(registry: &Registry, pid_file: &Path) -> Result<()> {
    let pid = read_pid(pid_file)?;

    #[cfg(target_os = "linux")]
    {
        let collector = prometheus::process_collector::ProcessCollector::new(pid, super::NAMESPACE);
        registry.register(Box::new(collector))?;
        info!(pid, pid_file = %pid_file.display(), "master process metrics enabled");
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (registry, pid);
        tracing::warn!("master process metrics are only available on linux");
    }

    Ok(())
}

fn read_pid(pid_file: &Path) -> Result<libc::pid_t> {
    let content = std::fs::read_to_string(pid_file)?;

    content
        .trim()
        .parse::<libc::pid_t>()
        .map_err(|e| {
            Error::Config(ConfigError::InvalidValue {
                field: "pid_file",
                reason: format!("cannot parse pid from {}: {e}", pid_file.display()),
            })
        })
}
