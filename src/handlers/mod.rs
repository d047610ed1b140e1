//! HTTP endpoint handlers for the exporter.
//!
//! - `/metrics` (configurable path): Prometheus metrics endpoint
//! - `/`: landing page

pub mod metrics;
pub mod root;

pub use metrics::metrics_handler;
pub use root::root_handler;
