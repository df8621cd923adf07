use std::path::{Path, PathBuf};
use std::sync::Arc;

use ini::Ini;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

use super::Pool;

/// Keys a pool section must define to be monitored.
const STATUS_PATH_KEY: &str = "pm.status_path";
const LISTEN_KEY: &str = "listen";

/// Scan a directory of PHP-FPM pool definition files and build the pool set.
///
/// A section is monitored iff it defines both `pm.status_path` and `listen`;
/// sections missing either key are silently skipped. Files that cannot be
/// read or parsed are logged and skipped, so one broken file never takes the
/// process down. Only a missing or unreadable directory is an error.
pub fn discover_pools(config_dir: &Path) -> Result<Vec<Arc<Pool>>, ConfigError> {
    let mut files = list_regular_files(config_dir)?;
    files.sort();

    let mut pools: Vec<Arc<Pool>> = Vec::new();

    for file in &files {
        let conf = match Ini::load_from_file(file) {
            Ok(conf) => conf,
            Err(e) => {
                let err = ConfigError::PoolFile {
                    file: file.clone(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "skipping pool file");
                continue;
            }
        };

        for (section, properties) in conf.iter() {
            let Some(name) = section else {
                continue;
            };

            let Some(status_path) = properties.get(STATUS_PATH_KEY) else {
                debug!(pool = name, "section has no status path, not monitored");
                continue;
            };
            let Some(endpoint) = properties.get(LISTEN_KEY) else {
                debug!(pool = name, "section has no listen address, not monitored");
                continue;
            };

            if pools.iter().any(|p| p.name() == name) {
                warn!(
                    pool = name,
                    file = %file.display(),
                    "duplicate pool definition, keeping the first"
                );
                continue;
            }

            info!(pool = name, endpoint, status_path, "discovered pool");
            pools.push(Arc::new(Pool::new(name, endpoint, status_path)));
        }
    }

    Ok(pools)
}

fn list_regular_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }

    Ok(files)
}
