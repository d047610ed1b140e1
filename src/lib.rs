//! Prometheus exporter for EMQ/EMQX MQTT broker node statistics.
//!
//! On each scrape of the metrics endpoint the exporter contacts the broker's
//! HTTP management API (v2/v3/v4), validates the response envelopes, flattens
//! the node statistics into gauge samples and serves them in Prometheus text
//! format.

pub mod cli;
pub mod client;
pub mod config;
pub mod creds;
pub mod exporter;
pub mod handlers;
pub mod state;
pub mod value;

// Re-export main types for convenience
pub use client::{EmqClient, Fetch, FetchError};
pub use config::Config;
pub use creds::find_creds;
pub use exporter::Exporter;
