//! CLI arguments for emq-exporter.
//!
//! Flag names follow the Prometheus exporter convention of dotted groups
//! (`web.listen-address`, `emq.uri`, ...).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Supported broker management API versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiVersion {
    V2,
    V3,
    V4,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
            ApiVersion::V4 => "v4",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "emq-exporter",
    about = "Prometheus exporter for EMQ/EMQX MQTT broker node statistics",
    version
)]
pub struct Args {
    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", default_value = ":9540")]
    pub listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    pub metrics_path: String,

    /// HTTP API address of the EMQ node
    #[arg(long = "emq.uri", default_value = "http://127.0.0.1:18083")]
    pub emq_uri: String,

    /// Path to a JSON file holding the API credentials
    #[arg(long = "emq.creds-file", default_value = "./auth.json")]
    pub creds_file: PathBuf,

    /// Node name of the EMQ node to scrape
    #[arg(long = "emq.node", default_value = "emq@127.0.0.1")]
    pub node: String,

    /// Timeout for fetching stats from the EMQ API
    #[arg(long = "emq.timeout", default_value = "5s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// The API version used by EMQ
    #[arg(long = "emq.api-version", value_enum, default_value = "v3")]
    pub api_version: ApiVersion,

    /// Log level
    #[arg(long = "log.level", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
