// Main entry point
use clap::Parser;
use colored::Colorize;
use product_reviews::infrastructure::config::{self, load_config};
use product_reviews::infrastructure::logging::init_logging;
use product_reviews::infrastructure::storage::db::{count_reviews, init_database};
use product_reviews::interfaces::cli::Cli;
use product_reviews::interfaces::http::create_router;
use product_reviews::state::AppState;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        let path = config::generate_config_sample(cli.config.as_deref())?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    // Setup database path (from config or default)
    let db_path = config::get_database_path(&config);
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize AppState
    let db_conn = init_database(&db_path).await?;
    let state = AppState::new(db_conn, config.clone()).await?;

    if cli.status {
        let config_path = config::resolve_config_path(cli.config.as_deref());
        print_status(&state, &db_path, config_path.as_deref()).await?;
        return Ok(());
    }

    let addr: SocketAddr = config.server.listen.parse()?;
    let app = create_router(state);

    info!(db = %db_path.display(), "Reviews listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutdown signal received, draining connections...");
}

async fn print_status(
    state: &AppState,
    db_path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    println!("{}", "product-reviews Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let count = count_reviews(&state.db).await?;
    println!("Database: {} ({} reviews)", db_path.display(), count);

    let cache = state.reviews.cache();
    if cache.is_populated() {
        println!("Memory Cache: {} entries", cache.len());
    } else if state.config.cache.enabled {
        println!("Memory Cache: {}", "cold".yellow());
    } else {
        println!("Memory Cache: {}", "disabled".yellow());
    }

    match config_path {
        Some(path) if path.exists() => println!("Config: {}", path.display()),
        Some(path) => println!("Config: {} ({})", path.display(), "not found, defaults".yellow()),
        None => println!("Config: {}", "Not found".yellow()),
    }
    println!("Listen: {}", state.config.server.listen);

    Ok(())
}
