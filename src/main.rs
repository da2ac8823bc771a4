//! bulkupload -- single-writer, idempotent upload coordinator.
//!
//! Stateless by construction: all upload state lives in the object store,
//! so a restart needs no recovery step. SIGTERM/SIGINT stop accepting
//! connections and wait for in-flight requests before exiting.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bulkupload::config::{non_empty, Config, LoggingConfig};
use bulkupload::meta::s3::S3MetaService;
use bulkupload::storage::store::ObjectStore;
use bulkupload::uploader::DefaultUploader;

/// Command-line arguments for the bulkupload server.
#[derive(Parser, Debug)]
#[command(
    name = "bulkupload",
    version,
    about = "Single-writer, idempotent upload coordinator"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "bulkupload.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bulkupload::config::load_config(&cli.config)?;
    init_tracing(&config.logging);
    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .clone()
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        bulkupload::metrics::init_metrics()?;
        bulkupload::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let store = build_store(&config).await?;

    let service = S3MetaService::new(store, config.uploader.domain.as_str());
    let uploader = DefaultUploader::new(service, config.uploader.bucket.clone());

    if config.uploader.create_bucket {
        uploader.prepare_bucket().await?;
        info!("Bucket {} ready", uploader.bucket());
    }

    let state = Arc::new(bulkupload::AppState {
        config: config.clone(),
        uploader: Arc::new(uploader),
    });

    let app = bulkupload::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("bulkupload listening on {}", bind_addr);

    // Graceful drain is bounded: once a signal arrives, in-flight requests
    // get `shutdown_timeout` to finish.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!("Shutdown timeout of {:?} elapsed, exiting", shutdown_timeout);
        }
    }

    info!("bulkupload shut down");

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Build the object store adapter selected by `storage.backend`.
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.storage.backend.as_str() {
        "aws" => {
            let aws = config.storage.aws.as_ref().ok_or_else(|| {
                anyhow::anyhow!("storage.backend is 'aws' but storage.aws config section is missing")
            })?;
            let store = bulkupload::storage::aws::AwsObjectStore::new(
                aws.region.clone(),
                non_empty(&aws.endpoint_url),
                aws.use_path_style,
                non_empty(&aws.access_key_id),
                non_empty(&aws.secret_access_key),
            )
            .await?;
            info!("AWS object store selected: region={}", aws.region);
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("In-memory object store selected");
            Ok(Arc::new(
                bulkupload::storage::memory::MemoryObjectStore::new(),
            ))
        }
        other => anyhow::bail!("unknown storage.backend '{other}' (expected 'memory' or 'aws')"),
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
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
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
