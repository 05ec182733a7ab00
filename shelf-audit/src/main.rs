//! shelf-audit - collection completeness audit service
//!
//! `serve` (default) answers audit requests against an existing database
//! opened read-only. `init-db` creates the database and its schema.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelf_audit::{build_router, db, AppState};
use shelf_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for shelf-audit
#[derive(Parser, Debug)]
#[command(name = "shelf-audit")]
#[command(about = "Collection completeness audit service")]
#[command(version)]
struct Args {
    /// Folder holding shelf.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long, value_name = "FILE", env = "SHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SHELF_AUDIT_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Create the database and schema, then exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let defaults = CompiledDefaults::for_current_platform();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level(&defaults).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting shelf-audit v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("shelf-audit")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    match args.command.unwrap_or(Command::Serve) {
        Command::InitDb => {
            let pool = shelf_common::db::init_database(&db_path)
                .await
                .context("Failed to initialize database")?;
            pool.close().await;
            info!("Database ready");
            Ok(())
        }
        Command::Serve => serve(&args, &config, &defaults, &db_path).await,
    }
}

async fn serve(
    args: &Args,
    config: &TomlConfig,
    defaults: &CompiledDefaults,
    db_path: &std::path::Path,
) -> Result<()> {
    let pool = match db::connect_readonly(db_path).await {
        Ok(pool) => {
            info!("Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    let book_page_size = config.book_page_size(defaults);
    let lookup_chunk_size = config.lookup_chunk_size(defaults);
    info!(book_page_size, lookup_chunk_size, "Store limits");

    let state = AppState::new(pool, book_page_size, lookup_chunk_size);
    let app = build_router(state);

    let host = args.host.clone().unwrap_or_else(|| config.host(defaults));
    let port = args.port.unwrap_or_else(|| config.port(defaults));
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("shelf-audit listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
