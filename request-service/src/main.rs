//! `servicedesk-request-service` entry point.
//!
//! Loads configuration, wires the HTTP classifier into an in-memory request
//! desk and serves the API until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use servicedesk_core::RequestDesk;
use servicedesk_core::classifier::HttpClassifier;
use servicedesk_request_service::AppState;
use servicedesk_request_service::ConfigLoader;
use servicedesk_request_service::auth::ApiKey;

#[derive(Debug, Parser)]
#[command(version, about = "Service request intake and lifecycle API")]
struct Cli {
    /// TOML config file. Defaults to $SERVICEDESK_HOME/request-service.toml.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Base URL of the classifier service.
    #[arg(long, value_name = "URL")]
    classifier_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(url) = cli.classifier_url {
        config.classifier.endpoint = url;
    }
    config.validate()?;

    tracing::info!(
        "servicedesk-request-service v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    if config.api_key == servicedesk_request_service::config::DEV_API_KEY {
        tracing::warn!("using the built-in development API key; set SERVICEDESK_API_KEY");
    }
    tracing::info!(
        endpoint = %config.classifier.endpoint,
        timeout_ms = config.classifier.timeout.as_millis() as u64,
        "classifier configured"
    );

    let classifier =
        HttpClassifier::new(&config.classifier).context("failed to build classifier client")?;
    let desk = Arc::new(RequestDesk::in_memory(Arc::new(classifier)));
    let state = AppState::new(desk, ApiKey::new(config.api_key.as_str()));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    servicedesk_request_service::serve(listener, state, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("servicedesk-request-service exiting cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("signal received, shutting down");
}
