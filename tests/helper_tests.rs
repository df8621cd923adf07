//! Tests of the external-helper fetcher against stand-in shell scripts.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use phpfpm_exporter::error::FetchError;
use phpfpm_exporter::fetch::{HelperFetcher, StatusFetcher};

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-cgi-fcgi");
    std::fs::write(&path, body).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();

    path
}

#[tokio::test]
async fn returns_the_body_after_the_framing() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "#!/bin/sh\nprintf 'Content-type: application/json\\r\\n\\r\\n{\"accepted conn\": 9}'\n",
    );

    let fetcher = HelperFetcher::new(
        &script,
        "127.0.0.1:9000",
        "/status",
        Duration::from_secs(5),
        None,
    );

    assert_eq!(fetcher.fetch().await.unwrap(), "{\"accepted conn\": 9}");
}

#[tokio::test]
async fn request_parameters_reach_the_helper_environment() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "#!/bin/sh\nprintf 'H\\r\\n\\r\\n%s %s' \"$SCRIPT_NAME\" \"$QUERY_STRING\"\n",
    );

    let fetcher = HelperFetcher::new(
        &script,
        "127.0.0.1:9000",
        "/fpm-status",
        Duration::from_secs(5),
        None,
    );

    assert_eq!(fetcher.fetch().await.unwrap(), "/fpm-status json");
}

#[tokio::test]
async fn output_without_framing_is_a_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "#!/bin/sh\nprintf 'oops, no framing'\n");

    let fetcher = HelperFetcher::new(
        &script,
        "127.0.0.1:9000",
        "/status",
        Duration::from_secs(5),
        None,
    );

    assert!(matches!(
        fetcher.fetch().await,
        Err(FetchError::Protocol(_))
    ));
}

#[tokio::test]
async fn overrunning_helper_is_killed_at_the_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "#!/bin/sh\nsleep 10\n");

    let deadline = Duration::from_millis(200);
    let fetcher = HelperFetcher::new(&script, "127.0.0.1:9000", "/status", deadline, None);

    let started = Instant::now();
    let err = fetcher.fetch().await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout(d) if d == deadline));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "helper was not killed at the deadline"
    );
}

#[tokio::test]
async fn failing_helper_exit_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "#!/bin/sh\necho 'no such endpoint' >&2\nexit 3\n");

    let fetcher = HelperFetcher::new(
        &script,
        "127.0.0.1:9000",
        "/status",
        Duration::from_secs(5),
        None,
    );

    assert!(matches!(fetcher.fetch().await, Err(FetchError::Io(_))));
}

#[tokio::test]
async fn missing_helper_binary_is_an_io_error() {
    let fetcher = HelperFetcher::new(
        "/nonexistent/cgi-fcgi",
        "127.0.0.1:9000",
        "/status",
        Duration::from_secs(5),
        None,
    );

    assert!(matches!(fetcher.fetch().await, Err(FetchError::Io(_))));
}
