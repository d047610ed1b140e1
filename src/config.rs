//! Immutable runtime configuration.
//!
//! The configuration is assembled once at startup from the CLI arguments and
//! the resolved credentials, and never mutated afterwards.

use std::time::Duration;

use crate::cli::{ApiVersion, Args};

/// Runtime configuration shared by the client and the HTTP surface.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the broker management API, with or without a scheme.
    pub host: String,
    /// Broker node identifier substituted into the endpoint templates.
    pub node: String,
    pub api_version: ApiVersion,
    pub username: String,
    pub password: String,
    /// Overall deadline for a single management API request.
    pub timeout: Duration,
    pub listen_address: String,
    pub metrics_path: String,
}

impl Config {
    pub fn from_args(args: &Args, username: String, password: String) -> Self {
        Self {
            host: args.emq_uri.clone(),
            node: args.node.clone(),
            api_version: args.api_version,
            username,
            password,
            timeout: args.timeout,
            listen_address: args.listen_address.clone(),
            metrics_path: args.metrics_path.clone(),
        }
    }
}

/// Expands the exporter-style shorthand `":9540"` into an address that binds
/// all interfaces.
pub fn normalize_listen_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_owned()
    }
}
