//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");
    let uptime_secs = state.start_time.elapsed().as_secs();
    let metrics_path = &state.config.metrics_path;

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>EMQ Exporter</title>
</head>
<body>
    <h1>EMQ Exporter</h1>
    <p>Version {version} | Uptime {uptime_secs}s</p>
    <p>Scraping node <code>{node}</code> via API {api_version}</p>
    <ul>
        <li><a href="{metrics_path}">{metrics_path}</a> - Prometheus metrics</li>
    </ul>
</body>
</html>"#,
        node = state.config.node,
        api_version = state.config.api_version,
    );

    Html(html)
}
