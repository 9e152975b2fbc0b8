//! Tabula Server Daemon
//!
//! The `tabulad` binary serves the SQL playground API:
//! - Opens the query service over the configured table source
//! - Optionally loads every table up front
//! - Serves HTTP until SIGTERM/SIGINT
//!
//! # Usage
//!
//! ```bash
//! # Serve the Northwind tables from GitHub on port 3000
//! tabulad
//!
//! # Serve CSV files from a local directory
//! tabulad --data-dir ./northwind
//!
//! # Use configuration file
//! tabulad --config /etc/tabula/tabulad.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tabula_server::config::{DataSourceConfig, ServerConfig};
use tabula_server::database::{Database, LoadStrategy};
use tabula_server::http::HttpServer;

/// Tabula Server Daemon
#[derive(Parser, Debug)]
#[command(
    name = "tabulad",
    author = "Tabula Team",
    version,
    about = "Tabula SQL playground server",
    long_about = "Tabula runs SQL queries against CSV tables held in memory.\n\n\
                  This daemon serves the query API over HTTP."
)]
struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, env = "TABULA_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long, env = "TABULA_PORT")]
    port: Option<u16>,

    /// Read tables from CSV files in this directory
    #[arg(short = 'd', long, value_name = "DIR", env = "TABULA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Fetch tables from `<URL>/<table>.csv`
    #[arg(long, value_name = "URL", env = "TABULA_BASE_URL", conflicts_with = "data_dir")]
    base_url: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", env = "TABULA_CONFIG")]
    config: Option<PathBuf>,

    /// Load every table before accepting queries
    #[arg(long)]
    preload: bool,

    /// Load every table on the first query instead of only those it names
    #[arg(long)]
    load_all: bool,

    /// Log every query
    #[arg(long, env = "TABULA_QUERY_LOG")]
    query_log: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "TABULA_LOG_LEVEL")]
    log_level: String,

    /// Print configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    // Load configuration
    let config = load_config(&args)?;

    // Print config and exit if requested
    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    print_banner();

    run_server(config).await
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let filter = EnvFilter::try_new(format!("tabula_server={level},tabula_sql={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    // Start with defaults
    let mut config = if let Some(path) = &args.config {
        ServerConfig::from_file(path).context("Failed to load config file")?
    } else {
        ServerConfig::default()
    };

    // Override with command-line arguments
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if let Some(dir) = &args.data_dir {
        config.data_source = DataSourceConfig::Directory { path: dir.clone() };
        if args.config.is_none() {
            config.tables.clear();
        }
    }
    if let Some(url) = &args.base_url {
        config.data_source = DataSourceConfig::Http {
            base_url: url.clone(),
        };
    }

    if args.preload {
        config.preload = true;
    }
    if args.load_all {
        config.load_strategy = LoadStrategy::All;
    }
    if args.query_log {
        config.query_logging = true;
    }

    Ok(config)
}

fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("╔═══════════════════════════════════════════════════════╗");
    info!("║                                                       ║");
    info!("║   ████████╗ █████╗ ██████╗ ██╗   ██╗██╗      █████╗   ║");
    info!("║   ╚══██╔══╝██╔══██╗██╔══██╗██║   ██║██║     ██╔══██╗  ║");
    info!("║      ██║   ███████║██████╔╝██║   ██║██║     ███████║  ║");
    info!("║      ██║   ██╔══██║██╔══██╗██║   ██║██║     ██╔══██║  ║");
    info!("║      ██║   ██║  ██║██████╔╝╚██████╔╝███████╗██║  ██║  ║");
    info!("║      ╚═╝   ╚═╝  ╚═╝╚═════╝  ╚═════╝ ╚══════╝╚═╝  ╚═╝  ║");
    info!("║                                                       ║");
    info!("║          Tabula v{:<10} - SQL Playground          ║", version);
    info!("║                                                       ║");
    info!("╚═══════════════════════════════════════════════════════╝");
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let db = Database::open(&config).context("Failed to open database")?;
    let db = Arc::new(db);

    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .context("Invalid server address")?;

    info!("Server configuration:");
    info!("  Listen address: {}", addr);
    match &config.data_source {
        DataSourceConfig::Http { base_url } => info!("  Data source: {}", base_url),
        DataSourceConfig::Directory { path } => info!("  Data source: {}", path.display()),
    }
    info!("  Load strategy: {:?}", config.load_strategy);

    if config.preload {
        let preload_db = Arc::clone(&db);
        let preloaded = tokio::task::spawn_blocking(move || preload_db.preload())
            .await
            .context("Preload task failed")?;
        if let Err(e) = preloaded {
            // Not fatal: failed tables are retried by the queries that need them.
            warn!("Preload incomplete: {}", e);
        }
    }

    let server = HttpServer::new(Arc::clone(&db), addr);
    info!("Press Ctrl+C to shutdown");
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let stats = db.stats();
    info!(
        "Served {} queries ({} failed), {} tables loaded",
        stats.queries_executed + stats.queries_failed,
        stats.queries_failed,
        stats.tables_loaded
    );
    info!("Server stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, shutting down gracefully...");
}
