//! Tabula Command-Line Interface
//!
//! Runs SQL against the playground tables from a terminal, without a
//! server.
//!
//! # Usage
//!
//! ```bash
//! # Start interactive REPL over the Northwind tables
//! tabula
//!
//! # Execute a single query
//! tabula -c "SELECT * FROM products"
//!
//! # Execute queries from a file, against local CSV files
//! tabula -d ./northwind -f queries.sql
//!
//! # Output as JSON
//! tabula -o json -c "SELECT * FROM shippers"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabula_server::database::Database;

mod commands;
mod config;
mod formatter;
mod history;
mod repl;
mod script;
mod session;

use config::CliConfig;
use formatter::OutputFormat;
use history::QueryHistory;
use repl::{execute_and_print, Repl};
use script::split_statements;
use session::Session;

/// Tabula command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "tabula",
    author = "Tabula Team",
    version,
    about = "Command-line interface for the Tabula SQL playground",
    long_about = "Runs SQL against CSV tables held in memory.\n\n\
                  Use this tool for interactive SQL sessions or for executing queries\n\
                  from the command line and from files."
)]
struct Args {
    /// Read tables from CSV files in this directory
    #[arg(short = 'd', long, value_name = "DIR", env = "TABULA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Fetch tables from `<URL>/<table>.csv`
    #[arg(long, value_name = "URL", env = "TABULA_BASE_URL", conflicts_with = "data_dir")]
    base_url: Option<String>,

    /// Execute a single SQL statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute SQL statements from file and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Show query timing
    #[arg(short = 't', long)]
    timing: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress banner (for scripting)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective configuration to the configuration file and exit
    #[arg(long)]
    save_config: bool,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
    /// Display raw values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns false if any statement failed.
fn run() -> Result<bool> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;

    if args.save_config {
        let path = args
            .config
            .clone()
            .or_else(CliConfig::default_config_path)
            .context("No configuration directory")?;
        config.save(&path)?;
        println!("Configuration written to {}", path.display());
        return Ok(true);
    }

    let format = match args.output {
        Some(arg) => arg.into(),
        None => OutputFormat::parse(&config.output_format).with_context(|| {
            format!("Unknown output format '{}' in configuration", config.output_format)
        })?,
    };

    let db = Database::open(&config.server_config()).context("Failed to open database")?;

    if let Some(command) = &args.command {
        let mut session = Session::new(db, format, QueryHistory::in_memory());
        session.set_timing(config.timing);
        Ok(execute_script(&mut session, command))
    } else if let Some(file) = &args.file {
        let mut session = Session::new(db, format, QueryHistory::in_memory());
        session.set_timing(config.timing);
        execute_file(&mut session, file)
    } else {
        let history = match config.history_path() {
            Some(path) => QueryHistory::open(path),
            None => QueryHistory::in_memory(),
        };
        let mut session = Session::new(db, format, history);
        session.set_timing(config.timing);
        run_repl(session, &config, args.quiet)?;
        Ok(true)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tabula_cli=debug,tabula_server=debug,tabula_sql=debug")
    } else {
        EnvFilter::new("tabula_cli=warn,tabula_server=warn,tabula_sql=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        CliConfig::load_default()?
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
        config.base_url = None;
    }
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
        config.data_dir = None;
    }
    if args.timing {
        config.timing = true;
    }

    Ok(config)
}

/// Runs every statement in `content`. Returns false if any failed.
fn execute_script(session: &mut Session, content: &str) -> bool {
    let mut ok = true;
    for statement in split_statements(content) {
        ok &= execute_and_print(session, statement);
    }
    ok
}

fn execute_file(session: &mut Session, path: &Path) -> Result<bool> {
    info!("Executing file: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(execute_script(session, &content))
}

fn run_repl(session: Session, config: &CliConfig, quiet: bool) -> Result<()> {
    let mut repl = Repl::new(session, config.line_history_size)?;

    if !quiet {
        repl.print_banner();
    }

    repl.run()
}
