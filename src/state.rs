//! Shared application state for the HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use prometheus::Registry;

use crate::client::EmqClient;
use crate::config::Config;
use crate::exporter::Exporter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub registry: Registry,
    pub exporter: Exporter<EmqClient>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}
