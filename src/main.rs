//! uma-skill API server and CLI.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uma_skill::cli::{self, Cli, Commands};
use uma_skill::config::AppConfig;
use uma_skill::routes::{self, AppState};
use uma_skill::skills::SkillCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, catalog } => run_server(Some(host), Some(port), catalog).await,
        Commands::Scrape { url, render, output } => {
            init_tracing("uma_skill=info");
            cli::run_scrape(url, render, output).await
        }
        Commands::Chain {
            catalog,
            skill_id,
            levels,
            format,
        } => cli::run_chain(catalog, skill_id, levels, format),
        Commands::Rank {
            catalog,
            levels,
            limit,
            format,
        } => cli::run_rank(catalog, levels, limit, format),
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run the API server.
async fn run_server(
    host: Option<String>,
    port: Option<u16>,
    catalog_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    init_tracing("uma_skill=debug,tower_http=debug");

    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Discount table: {:?}", config.discount);

    let catalog = match catalog_path {
        Some(path) => {
            let catalog = cli::load_catalog(&path)?;
            tracing::info!(
                "Catalog loaded from {}: {} skills in {} groups",
                path.display(),
                catalog.len(),
                catalog.group_count()
            );
            catalog
        }
        None => {
            tracing::info!("Starting with an empty catalog; POST /api/fetch to load one");
            SkillCatalog::default()
        }
    };

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = Arc::new(AppState::new(config, catalog));
    let app = routes::router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
