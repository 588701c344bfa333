//! sigdrop server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use sigdrop_core::config::AppConfig;
use sigdrop_server::{AppState, create_router};
use sigdrop_signer::{SignerRegistry, SshKeygenVerifier};
use sigdrop_storage::Publisher;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sigdrop - signed file upload server
#[derive(Parser, Debug)]
#[command(name = "sigdropd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SIGDROP_CONFIG",
        default_value = "config/sigdrop.toml"
    )]
    config: String,
}

/// Unprefixed variables from earlier deployments and the config keys they set.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("SIGNERS_FILE", "signing.allowed_signers"),
    ("MULTER_TEMP", "storage.temp_dir"),
    ("UPLOAD_PATH", "storage.upload_path"),
    ("EXPRESS_PORT", "server.port"),
];

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(legacy, _)| key.as_str().eq_ignore_ascii_case(legacy))
            .map(|(_, path)| (*path).into())
    })
}

async fn load_signers(path: &Path) -> Result<SignerRegistry> {
    SignerRegistry::load(path)
        .await
        .with_context(|| format!("failed to load signers file: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("sigdrop v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: file, then legacy variables, then SIGDROP_ variables
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let mut config: AppConfig = figment
        .merge(legacy_env())
        .merge(Env::prefixed("SIGDROP_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // The signer registry is the trust anchor; nothing can be served without it.
    let registry = load_signers(&config.signing.allowed_signers).await?;

    for dir in [&config.storage.temp_dir, &config.storage.upload_path] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    // Absolute paths give the upload root a parent and aliases absolute targets.
    config.storage.temp_dir = tokio::fs::canonicalize(&config.storage.temp_dir)
        .await
        .context("failed to resolve storage.temp_dir")?;
    config.storage.upload_path = tokio::fs::canonicalize(&config.storage.upload_path)
        .await
        .context("failed to resolve storage.upload_path")?;

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    // Register Prometheus metrics
    sigdrop_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let publisher = Publisher::new(&config.storage.upload_path)
        .await
        .context("failed to initialize publisher")?;
    publisher
        .sweep_stale_staging()
        .await
        .context("failed to sweep stale staging directories")?;
    tracing::info!(
        upload_path = %config.storage.upload_path.display(),
        temp_dir = %config.storage.temp_dir.display(),
        "Storage initialized"
    );

    let verifier = Arc::new(SshKeygenVerifier::new(
        config.signing.program.clone(),
        registry,
    ));

    let addr = config.server.bind_addr();
    let state = AppState::new(config, verifier, publisher);
    let app = create_router(state);

    tracing::info!(addr = %addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
