//! Scorekeep - HTTP server and maintenance CLI.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use scorekeep::api::{self, Backend};
use scorekeep::{ScoreBoard, ScoreService, ScoreStore, ServerConfig, ServerMode};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
            legacy,
        } => {
            let mut config = load_config(config, db_path)?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if legacy {
                config = config.with_mode(ServerMode::Legacy);
            }
            run_http_server(config).await
        }
        Command::Migrate { config, db_path } => {
            let config = load_config(config, db_path)?;
            let store = open_store(&config)?;
            let applied = store.run_migrations()?;
            info!(applied, db_path = %store.db_path(), "Database is up to date");
            Ok(())
        }
    }
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scorekeep=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Builds configuration from file, environment and the database flag.
#[instrument]
fn load_config(path: Option<PathBuf>, db_path: Option<String>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    };
    let config = config.apply_env(|key| std::env::var(key).ok())?;
    Ok(match db_path {
        Some(db_path) => config.with_db_path(db_path),
        None => config,
    })
}

fn open_store(config: &ServerConfig) -> Result<ScoreStore> {
    Ok(ScoreStore::with_busy_timeout(
        config.db_path().clone(),
        *config.busy_timeout_ms(),
    )?)
}

/// Run the HTTP server until Ctrl+C.
#[instrument(skip(config), fields(mode = %config.mode()))]
async fn run_http_server(config: ServerConfig) -> Result<()> {
    let backend = match config.mode() {
        ServerMode::Persistent => {
            let store = open_store(&config)?;
            let applied = store.run_migrations()?;
            info!(applied, db_path = %store.db_path(), "Database ready");
            Backend::Persistent(ScoreService::new(store))
        }
        ServerMode::Legacy => {
            info!("Serving in-memory scores; nothing will persist");
            Backend::Legacy(ScoreBoard::new())
        }
    };

    let app = api::router(backend);
    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
