//! Vetrina CMS server.
//!
//! Usage:
//!   vetrina serve
//!   vetrina seed --dir seed_data

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vetrina_kernel::app::build_router;
use vetrina_kernel::config::Config;
use vetrina_kernel::middleware::spawn_sweeper;
use vetrina_kernel::seed::seed_dir;
use vetrina_kernel::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Load JSON documents from a directory into the content store.
    Seed {
        /// Directory of `*.json` files; each file stem becomes a key.
        #[arg(long, default_value = "seed_data")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Seed { dir } => {
            let state = AppState::new(&config)
                .await
                .context("failed to initialize application state")?;
            let count = seed_dir(state.content(), &dir).await?;
            info!(count, dir = %dir.display(), "seed complete");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Vetrina CMS kernel");
    info!(port = config.port, "Configuration loaded");

    if config.uses_default_secrets() {
        warn!("ADMIN_PASSWORD or JWT_SECRET is still at its default; set both before exposing this server");
    }

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    if let Some(dir) = &config.seed_dir {
        match seed_dir(state.content(), dir).await {
            Ok(count) => info!(count, "startup seed applied"),
            Err(e) => warn!(error = %format!("{e:#}"), "startup seed failed"),
        }
    }

    spawn_sweeper(state.rate_limiter().clone());

    let app = build_router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    // Connect info feeds the rate limiter's fallback client identity.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
