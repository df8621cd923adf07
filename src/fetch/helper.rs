//! External cgi-fcgi helper fetcher.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::FetchError;

use super::{StatusFetcher, STATUS_QUERY};

/// Fetches the status page by shelling out to `cgi-fcgi -bind -connect
/// <endpoint>` with the request described in process environment.
///
/// The whole invocation is bounded by one deadline; a helper that overruns
/// it is killed. Environment overrides are last-wins: every key set here
/// replaces an inherited value of the same name.
pub struct HelperFetcher {
    program: PathBuf,
    endpoint: String,
    deadline: Duration,
    envs: Vec<(String, String)>,
}

impl HelperFetcher {
    pub fn new(
        program: impl AsRef<Path>,
        endpoint: impl Into<String>,
        status_path: impl Into<String>,
        deadline: Duration,
        ld_library_path: Option<String>,
    ) -> Self {
        let status_path = status_path.into();

        let mut envs = vec![
            ("SCRIPT_NAME".into(), status_path.clone()),
            ("SCRIPT_FILENAME".into(), status_path),
            ("QUERY_STRING".into(), STATUS_QUERY.into()),
            ("REQUEST_METHOD".into(), "GET".into()),
        ];
        if let Some(path) = ld_library_path {
            envs.push(("LD_LIBRARY_PATH".into(), path));
        }

        Self {
            program: program.as_ref().to_path_buf(),
            endpoint: endpoint.into(),
            deadline,
            envs,
        }
    }
}

#[async_trait]
impl StatusFetcher for HelperFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-bind")
            .arg("-connect")
            .arg(&self.endpoint)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the output future on deadline kills the child.
            .kill_on_drop(true);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let output = match timeout(self.deadline, cmd.output()).await {
            Err(_) => return Err(FetchError::Timeout(self.deadline)),
            Ok(result) => result?,
        };

        if !output.status.success() {
            return Err(FetchError::Io(std::io::Error::other(format!(
                "cgi-fcgi exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))));
        }

        debug!(
            endpoint = %self.endpoint,
            bytes = output.stdout.len(),
            "helper fetch complete"
        );

        let text = String::from_utf8_lossy(&output.stdout);
        split_helper_output(&text).map(str::to_owned)
    }
}

/// The helper's combined output is request/response framing followed by a
/// blank-line-delimited body; the payload is the second blank-line-split
/// segment. Fewer than two segments means the helper did not produce a
/// response at all.
pub(crate) fn split_helper_output(output: &str) -> Result<&str, FetchError> {
    let Some((_, rest)) = output.split_once("\r\n\r\n") else {
        return Err(FetchError::Protocol("unexpected cgi-fcgi response".into()));
    };
    Ok(rest.split("\r\n\r\n").next().unwrap_or(rest))
}
