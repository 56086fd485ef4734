//! genwiki-locator - GOV → Wikidata location resolution
//!
//! Command-line front end and HTTP service for the resolution engine.
//! Every command prints JSON to stdout; logs go to stderr.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tracing::info;

use genwiki_common::config::{default_config_path, write_toml_config};
use genwiki_locator::config::{AmbiguityPolicy, LocatorConfig, MODULE_NAME};
use genwiki_locator::{build_router, AppState, Collaborators, Locator, Materialize};

/// Command-line arguments for genwiki-locator
#[derive(Parser, Debug)]
#[command(name = "genwiki-locator")]
#[command(about = "Resolve GOV gazetteer ids to Wikidata items and location paths")]
#[command(version)]
struct Args {
    /// Configuration file (default: ~/.config/genwiki/locator.toml)
    #[arg(short, long, global = true, env = "GENWIKI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive; overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Record ambiguous reference lookups as null instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evidence map for a GOV id
    Locate {
        gov_id: String,
        /// Skip validation and ranking
        #[arg(long)]
        raw: bool,
    },
    /// Hierarchy path of a Wikidata item
    Path { item: String },
    /// Coordinates of Wikidata items
    Coords {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// `has part` relations of Wikidata items
    Parts {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Locate a GOV id and derive its path
    Resolve { gov_id: String },
    /// Resolve a GOV id and write location pages for its hierarchy
    Materialize {
        gov_id: String,
        /// Rewrite existing pages
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value = "5780", env = "GENWIKI_LOCATOR_PORT")]
        port: u16,
        /// Listen on all interfaces instead of localhost
        #[arg(long)]
        public: bool,
    },
    /// Write a configuration file with default values
    InitConfig {
        /// Target file (default: ~/.config/genwiki/locator.toml)
        path: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = LocatorConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.lenient {
        config.locator.ambiguity = AmbiguityPolicy::Lenient;
    }

    genwiki_common::logging::init(&config.logging).context("Failed to initialize logging")?;

    if let Command::InitConfig { path } = &args.command {
        let path = match path {
            Some(path) => path.clone(),
            None => default_config_path(MODULE_NAME)
                .context("Cannot determine config directory")?,
        };
        write_toml_config(&LocatorConfig::default(), &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Configuration written");
        return Ok(());
    }

    let collaborators =
        Collaborators::from_config(&config).context("Failed to initialize service clients")?;
    let knowledge_base = collaborators.knowledge_base.clone();
    let locator = Locator::new(collaborators, &config.locator);

    match args.command {
        Command::Locate { gov_id, raw } => {
            let evidence = if raw {
                locator.locate_unranked(&gov_id).await?
            } else {
                locator.locate(&gov_id).await?
            };
            print_json(&evidence)?;
        }
        Command::Path { item } => {
            let path = locator.resolver().path_for(&item).await?;
            print_json(&path)?;
        }
        Command::Coords { items } => {
            let coordinates = knowledge_base.coordinates(&items).await?;
            // stable output order
            let coordinates: std::collections::BTreeMap<_, _> = coordinates.into_iter().collect();
            print_json(&coordinates)?;
        }
        Command::Parts { items } => {
            let parts = locator.resolver().parts_of(&items).await?;
            print_json(&parts)?;
        }
        Command::Resolve { gov_id } => {
            let resolution = locator.resolve(&gov_id, Materialize::None).await?;
            print_json(&resolution)?;
        }
        Command::Materialize { gov_id, force } => {
            let mode = if force {
                Materialize::Force
            } else {
                Materialize::Missing
            };
            let resolution = locator.resolve(&gov_id, mode).await?;
            print_json(&resolution)?;
        }
        Command::Serve { port, public } => {
            serve(locator, port, public).await?;
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

async fn serve(locator: Locator, port: u16, public: bool) -> Result<()> {
    let state = AppState::new(Arc::new(locator));
    let app = build_router(state);

    let host = if public { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
    let addr = SocketAddr::from((host, port));

    info!("Starting genwiki-locator {}", env!("CARGO_PKG_VERSION"));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
