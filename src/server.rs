//! HTTP exposition server.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::Result;
use crate::metrics::Exporter;

/// Content type of the Prometheus text exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

struct AppState {
    exporter: Exporter,
    telemetry_path: String,
}

/// Build the exposition router: the telemetry path plus a landing page.
pub fn router(exporter: Exporter, telemetry_path: &str) -> Router {
    let state = Arc::new(AppState {
        exporter,
        telemetry_path: telemetry_path.to_string(),
    });

    Router::new()
        .route(telemetry_path, get(metrics_handler))
        .route("/", get(index_handler))
        .with_state(state)
}

/// Bind the listener separately from serving, so a bad listen address is a
/// fatal startup error rather than a background task failure.
pub async fn bind(listen_address: &str) -> Result<TcpListener> {
    Ok(TcpListener::bind(listen_address).await?)
}

/// Serve until the shutdown signal flips.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!(address = %listener.local_addr()?, "metrics listener started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    info!("metrics listener stopped");
    Ok(())
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.exporter.render() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to render metrics",
            )
                .into_response()
        }
    }
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\
         <head><title>PHP-FPM Exporter</title></head>\
         <body>\
         <h1>PHP-FPM Exporter</h1>\
         <p><a href='{}'>Metrics</a></p>\
         </body>\
         </html>",
        state.telemetry_path
    ))
}
