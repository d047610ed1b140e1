//! emq-exporter
//!
//! Main entry point: resolves credentials, builds the API client and the
//! exporter, and serves the metrics endpoint until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use clap::Parser;
use prometheus::Registry;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn, Level};

use emq_exporter::cli::{ApiVersion, Args, LogLevel};
use emq_exporter::config::{normalize_listen_address, Config};
use emq_exporter::creds::find_creds;
use emq_exporter::handlers::{metrics_handler, root_handler};
use emq_exporter::state::AppState;
use emq_exporter::{EmqClient, Exporter};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    info!(
        "Starting emq-exporter {} (build {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    );

    if args.api_version == ApiVersion::V2 {
        warn!("API version v2 is deprecated, consider upgrading the broker");
    }

    let (username, password) = match find_creds(&args.creds_file) {
        Ok(creds) => creds,
        Err(e) => {
            error!("Failed to resolve credentials: {}", e);
            std::process::exit(1);
        }
    };

    let config = Config::from_args(&args, username, password);
    info!(
        "Scraping node {} at {} via API {}",
        config.node, config.host, config.api_version
    );

    let registry = Registry::new();
    let client = EmqClient::new(&config)?;
    let exporter = Exporter::new(client)?;
    registry.register(Box::new(exporter.clone()))?;

    let state = Arc::new(AppState {
        registry,
        exporter,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route(&config.metrics_path, get(metrics_handler))
        .with_state(state);

    let addr = normalize_listen_address(&config.listen_address);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("emq-exporter listening on http://{}", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("emq-exporter stopped gracefully");
    Ok(())
}
