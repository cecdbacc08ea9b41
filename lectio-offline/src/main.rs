//! lectio-offline - offline Bible sync and lookup service
//!
//! Serves chapters, keyword search and verse-reference lookup for the
//! reader, answering from the local SQLite mirror of the primary edition
//! when it has been synchronized and from the remote Bible API otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use lectio_common::config::{self, TomlConfig};
use lectio_common::events::EventBus;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lectio_offline::services::BibleApiClient;
use lectio_offline::AppState;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "lectio-offline")]
#[command(about = "Offline Bible sync and hybrid lookup service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "LECTIO_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database (overrides env and config file)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "LECTIO_PORT")]
    port: Option<u16>,

    /// Bearer token for the Bible API (overrides config file)
    #[arg(long, env = "LECTIO_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let mut toml_config = match &config_path {
        Some(path) => config::load_toml_config(path)?,
        None => TomlConfig::default(),
    };
    if let Some(port) = args.port {
        toml_config.port = port;
    }
    if args.api_token.is_some() {
        toml_config.api_token = args.api_token.clone();
    }

    init_tracing(&toml_config)?;

    info!("Starting lectio-offline");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    // Root folder: CLI > env > config file > OS default
    let root_folder = config::resolve_root_folder(
        args.root_folder.as_deref(),
        config::ROOT_FOLDER_ENV,
        &toml_config,
    );
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let db_pool = lectio_offline::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let remote = BibleApiClient::from_config(&toml_config)?;
    info!("Bible API: {}", toml_config.api_base_url);

    let event_bus = EventBus::new(lectio_offline::EVENT_BUS_CAPACITY);

    let state = AppState::new(db_pool, Arc::new(remote), event_bus);
    let app = lectio_offline::build_router(state);

    let bind_addr = format!("127.0.0.1:{}", toml_config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
