//! museum-guide - Campus museum building recognition service
//!
//! Visitors photograph a campus building; the service identifies it against
//! the catalog and returns a localized description with narration.

use anyhow::Result;
use clap::Parser;
use museum_common::config::{load_toml_config, resolve_config_path};
use museum_guide::config::GuideSettings;
use museum_guide::{build_orchestrator, build_router, AppState, BuildingCatalog};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "museum-guide", version, about = "Campus museum building recognition service")]
struct Args {
    /// Config file (TOML)
    #[arg(long, env = "MUSEUM_GUIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `bind_address` from the config
    #[arg(long)]
    bind: Option<String>,

    /// Serve demo fallback results when vision is unavailable
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before the subscriber exists; its own log lines are lost
    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = load_toml_config(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting museum-guide (building recognition) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: compiled defaults"),
    }

    let settings = GuideSettings::resolve(&toml_config, args.demo);
    info!(
        app_name = %settings.app_name,
        demo_mode = settings.recognition.demo_mode,
        canonical_language = %settings.recognition.canonical_language,
        "Settings resolved"
    );

    let catalog = match &settings.catalog_path {
        Some(path) => BuildingCatalog::from_json_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load catalog {}: {}", path.display(), e))?,
        None => BuildingCatalog::builtin(),
    };
    info!("Catalog: {} buildings", catalog.len());

    let orchestrator = build_orchestrator(&settings, catalog)
        .map_err(|e| anyhow::anyhow!("Failed to initialize capabilities: {}", e))?;
    if !settings.trusted_proxies.is_empty() {
        info!(proxies = ?settings.trusted_proxies, "Trusting X-Forwarded-For from proxies");
    }
    let state = AppState::new(orchestrator, settings.app_name.clone())
        .with_trusted_proxies(settings.trusted_proxies.clone());
    let app = build_router(state);

    let bind_address = args.bind.unwrap_or(settings.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
