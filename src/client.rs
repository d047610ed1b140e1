//! HTTP client for the EMQ management API.
//!
//! The client walks a version-specific set of endpoint templates, validates
//! each response envelope and returns a flat `name -> value` mapping of the
//! node statistics. Endpoints are processed sequentially; the first failure
//! aborts the whole scrape so the collector can report clean `up=0`
//! semantics.

use std::collections::HashMap;
use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cli::ApiVersion;
use crate::config::Config;

/// One scrape target of the management API. The path template carries a
/// single `{node}` placeholder for the broker node identifier.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub name: &'static str,
    pub path: &'static str,
}

// The tables are kept sorted by endpoint name so iteration order, logs and
// error messages are deterministic.
const TARGETS_V2: &[Endpoint] = &[
    Endpoint {
        name: "management_nodes",
        path: "/api/v2/management/nodes/{node}",
    },
    Endpoint {
        name: "monitoring_metrics",
        path: "/api/v2/monitoring/metrics/{node}",
    },
    Endpoint {
        name: "monitoring_nodes",
        path: "/api/v2/monitoring/nodes/{node}",
    },
    Endpoint {
        name: "monitoring_stats",
        path: "/api/v2/monitoring/stats/{node}",
    },
];

const TARGETS_V3: &[Endpoint] = &[
    Endpoint {
        name: "nodes",
        path: "/api/v3/nodes/{node}",
    },
    Endpoint {
        name: "nodes_metrics",
        path: "/api/v3/nodes/{node}/metrics/",
    },
    Endpoint {
        name: "nodes_stats",
        path: "/api/v3/nodes/{node}/stats/",
    },
];

const TARGETS_V4: &[Endpoint] = &[
    Endpoint {
        name: "nodes",
        path: "/api/v4/nodes/{node}",
    },
    Endpoint {
        name: "nodes_metrics",
        path: "/api/v4/nodes/{node}/metrics/",
    },
    Endpoint {
        name: "nodes_stats",
        path: "/api/v4/nodes/{node}/stats/",
    },
];

/// The endpoint table for an API version.
pub fn targets(version: ApiVersion) -> &'static [Endpoint] {
    match version {
        ApiVersion::V2 => TARGETS_V2,
        ApiVersion::V3 => TARGETS_V3,
        ApiVersion::V4 => TARGETS_V4,
    }
}

/// Response envelope returned by every management API endpoint. A scrape is
/// successful iff `code == 0`.
#[derive(Debug, Deserialize)]
pub struct EmqResponse {
    #[serde(default)]
    pub code: f64,
    /// Payload key used by the v2 API.
    pub result: Option<HashMap<String, Value>>,
    /// Payload key used by the v3/v4 APIs.
    pub data: Option<HashMap<String, Value>>,
}

impl EmqResponse {
    /// The payload object holding the node statistics: `result` for v2,
    /// `data` otherwise.
    pub fn payload(self, version: ApiVersion) -> Option<HashMap<String, Value>> {
        match version {
            ApiVersion::V2 => self.result,
            ApiVersion::V3 | ApiVersion::V4 => self.data,
        }
    }
}

/// Errors raised while scraping the management API. Each variant maps to one
/// failure class: client construction, request construction, transport,
/// non-200 status, envelope decoding and broker-reported error codes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid target url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("failed to get metrics from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Received status code not ok {url}, got {status}")]
    Status { url: String, status: StatusCode },
    #[error("error decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("received code {code} != 0 from {url}")]
    Code { url: String, code: f64 },
}

/// Seam between the collector and the broker API; lets tests drive the
/// exporter with a stub fetcher.
pub trait Fetch: Send + Sync {
    /// Walks all endpoints for the configured API version and returns the
    /// merged flat `name -> value` mapping.
    fn fetch(&self) -> impl Future<Output = Result<HashMap<String, Value>, FetchError>> + Send;
}

/// Flattens a payload key into its endpoint-scoped metric name. Slashes in
/// the key become underscores.
pub fn flat_name(endpoint: &str, key: &str) -> String {
    format!("{}_{}", endpoint, key.replace('/', "_"))
}

/// Client for the EMQ management API. Stateless apart from configuration;
/// one `reqwest::Client` is reused across scrapes for connection keep-alive.
pub struct EmqClient {
    http: reqwest::Client,
    host: String,
    node: String,
    api_version: ApiVersion,
    username: String,
    password: String,
}

impl EmqClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            host: config.host.clone(),
            node: config.node.clone(),
            api_version: config.api_version,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Substitutes the node into the endpoint template and backfills the
    /// `http://` scheme when the configured host has none.
    fn target_url(&self, endpoint: &Endpoint) -> String {
        let url = format!("{}{}", self.host, endpoint.path.replace("{node}", &self.node));
        if url.contains("://") {
            url
        } else {
            format!("http://{url}")
        }
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<HashMap<String, Value>, FetchError> {
        let url = self.target_url(endpoint);
        debug!(%url, "fetching from broker");

        let parsed = reqwest::Url::parse(&url).map_err(|err| FetchError::Url {
            url: url.clone(),
            reason: err.to_string(),
        })?;

        let res = self
            .http
            .get(parsed)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        if res.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: res.status(),
            });
        }

        let envelope: EmqResponse = res.json().await.map_err(|source| FetchError::Decode {
            url: url.clone(),
            source,
        })?;

        if envelope.code != 0.0 {
            return Err(FetchError::Code {
                url,
                code: envelope.code,
            });
        }

        // An absent payload object on a code-0 envelope counts as an empty
        // result, not a failure.
        Ok(envelope.payload(self.api_version).unwrap_or_default())
    }
}

impl Fetch for EmqClient {
    async fn fetch(&self) -> Result<HashMap<String, Value>, FetchError> {
        let mut data = HashMap::new();

        for endpoint in targets(self.api_version) {
            let payload = self.get(endpoint).await?;
            for (key, value) in payload {
                // Later endpoints win on name collisions.
                data.insert(flat_name(endpoint.name, &key), value);
            }
        }

        Ok(data)
    }
}

/// User-Agent identifying the exporter and its build tag.
fn user_agent() -> String {
    format!(
        "emq-exporter/{} (build {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    )
}
