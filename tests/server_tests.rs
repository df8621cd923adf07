//! HTTP exposition endpoint tests over a real listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;

use phpfpm_exporter::metrics::Exporter;
use phpfpm_exporter::pool::{Pool, PoolStatus};
use phpfpm_exporter::server;
use phpfpm_exporter::testkit::status_payload;

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(format!("GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n").as_bytes())
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn metrics_endpoint_serves_the_rendered_exposition() {
    let pool = Arc::new(Pool::new("www", "/run/php/www.sock", "/status"));
    pool.cache()
        .replace(PoolStatus::from_json(&status_payload(42)).unwrap());

    let exporter = Exporter::new(vec![pool]).unwrap();
    let app = server::router(exporter, "/metrics");
    let listener = server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server::serve(listener, app, shutdown_rx));

    let response = get(addr, "/metrics").await;
    assert!(response.contains(" 200 "), "unexpected response:\n{response}");
    assert!(response.contains("phpfpm_accepted_conn{pool_name=\"www\"} 42"));
    assert!(response.contains("phpfpm_idle_processes{pool_name=\"www\"} 2"));

    // Two scrapes with no intervening poll are identical.
    let again = get(addr, "/metrics").await;
    assert_eq!(
        response.lines().filter(|l| l.starts_with("phpfpm_")).count(),
        again.lines().filter(|l| l.starts_with("phpfpm_")).count()
    );

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), server_task)
        .await
        .expect("graceful shutdown before deadline")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn landing_page_links_to_the_telemetry_path() {
    let exporter = Exporter::new(Vec::new()).unwrap();
    let app = server::router(exporter, "/probe/metrics");
    let listener = server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server::serve(listener, app, shutdown_rx));

    let response = get(addr, "/").await;
    assert!(response.contains(" 200 "));
    assert!(response.contains("href='/probe/metrics'"));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), server_task)
        .await
        .expect("graceful shutdown before deadline")
        .unwrap()
        .unwrap();
}
