use std::fs;
use std::path::Path;

use phpfpm_exporter::error::ConfigError;
use phpfpm_exporter::pool::discover_pools;

fn write_conf(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write pool file");
}

#[test]
fn section_with_both_keys_is_monitored() {
    let dir = tempfile::tempdir().unwrap();
    write_conf(
        dir.path(),
        "www.conf",
        "[www]\nlisten = /run/php/www.sock\npm.status_path = /status\n",
    );

    let pools = discover_pools(dir.path()).unwrap();

    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].name(), "www");
    assert_eq!(pools[0].endpoint(), "/run/php/www.sock");
    assert_eq!(pools[0].status_path(), "/status");
}

#[test]
fn section_without_status_path_is_never_monitored() {
    let dir = tempfile::tempdir().unwrap();
    write_conf(
        dir.path(),
        "pools.conf",
        "[www]\nlisten = /run/php/www.sock\n\n[api]\nlisten = 127.0.0.1:9000\npm.status_path = /fpm-status\n",
    );

    let pools = discover_pools(dir.path()).unwrap();

    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].name(), "api");
}

#[test]
fn section_without_listen_address_is_never_monitored() {
    let dir = tempfile::tempdir().unwrap();
    write_conf(dir.path(), "www.conf", "[www]\npm.status_path = /status\n");

    assert!(discover_pools(dir.path()).unwrap().is_empty());
}

#[test]
fn unparseable_file_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_conf(dir.path(), "broken.conf", "[unclosed section\nlisten=/x\n");
    write_conf(
        dir.path(),
        "www.conf",
        "[www]\nlisten = /run/php/www.sock\npm.status_path = /status\n",
    );

    let pools = discover_pools(dir.path()).unwrap();

    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].name(), "www");
}

#[test]
fn missing_directory_is_an_error() {
    let err = discover_pools(Path::new("/nonexistent/pool.d")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadDir { .. }));
}

#[test]
fn duplicate_pool_names_keep_the_first_definition() {
    let dir = tempfile::tempdir().unwrap();
    // Files are visited in sorted order.
    write_conf(
        dir.path(),
        "a.conf",
        "[www]\nlisten = /run/php/a.sock\npm.status_path = /status\n",
    );
    write_conf(
        dir.path(),
        "b.conf",
        "[www]\nlisten = /run/php/b.sock\npm.status_path = /status\n",
    );

    let pools = discover_pools(dir.path()).unwrap();

    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].endpoint(), "/run/php/a.sock");
}

#[test]
fn subdirectories_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("disabled")).unwrap();
    write_conf(
        &dir.path().join("disabled"),
        "old.conf",
        "[old]\nlisten = /run/php/old.sock\npm.status_path = /status\n",
    );

    assert!(discover_pools(dir.path()).unwrap().is_empty());
}
