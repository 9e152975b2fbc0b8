//! Special backslash commands for the REPL.
//!
//! Provides commands like `\dt`, `\d`, `\history`, `\q`, etc.

use anyhow::{bail, Result};
use chrono::Local;
use tabula_server::samples::{sample_queries, sample_query};
use tabula_sql::executor::Value;

use crate::formatter::{self, OutputFormat};
use crate::session::Session;

/// Longest query text shown in `\history` before it is cut.
const HISTORY_PREVIEW_CHARS: usize = 60;

/// Result of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output a message.
    Output(String),
    /// Run a SQL statement as if it had been typed.
    Execute(String),
}

/// A parsed command.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Quit the REPL.
    Quit,
    /// Show help.
    Help,
    /// List tables.
    ListTables,
    /// Describe a table.
    Describe(Option<String>),
    /// List sample queries.
    Examples,
    /// Run a sample query.
    Example(Option<String>),
    /// Show query history.
    History,
    /// Clear query history.
    ClearHistory,
    /// Toggle or set timing.
    Timing(Option<String>),
    /// Set output format.
    Format(Option<String>),
    /// Show database status.
    Status,
    /// Unknown command.
    Unknown(String),
}

impl Command {
    /// Parses a command string.
    pub fn parse(input: &str) -> Self {
        let input = input.trim().trim_end_matches(';');
        let cmd = input.strip_prefix('\\').unwrap_or(input);

        let mut parts = cmd.splitn(2, char::is_whitespace);
        let cmd_name = parts.next().unwrap_or_default().to_lowercase();
        let args = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        match cmd_name.as_str() {
            "q" | "quit" | "exit" => Command::Quit,
            "?" | "h" | "help" => Command::Help,
            "dt" | "tables" => Command::ListTables,
            "d" => Command::Describe(args),
            "examples" => Command::Examples,
            "example" => Command::Example(args),
            "history" => match args.as_deref() {
                Some(arg) if arg.eq_ignore_ascii_case("clear") => Command::ClearHistory,
                _ => Command::History,
            },
            "timing" | "t" => Command::Timing(args),
            "format" | "f" => Command::Format(args),
            "status" | "s" => Command::Status,
            _ => Command::Unknown(cmd_name),
        }
    }

    /// Executes the command.
    pub fn execute(&self, session: &mut Session) -> Result<CommandResult> {
        match self {
            Command::Quit => Ok(CommandResult::Exit),

            Command::Help => Ok(CommandResult::Output(Self::help_text())),

            Command::ListTables => Ok(CommandResult::Output(list_tables(session))),

            Command::Describe(Some(name)) => {
                describe_table(session, name).map(CommandResult::Output)
            }
            Command::Describe(None) => Ok(CommandResult::Output(
                "Usage: \\d <table>. Use \\dt to list tables.".to_string(),
            )),

            Command::Examples => Ok(CommandResult::Output(list_examples(session.format()))),

            Command::Example(arg) => {
                let Some(id) = arg.as_deref().and_then(|a| a.parse::<u32>().ok()) else {
                    return Ok(CommandResult::Output("Usage: \\example <id>".to_string()));
                };
                match sample_query(id) {
                    Some(sample) => Ok(CommandResult::Execute(sample.query.to_string())),
                    None => Ok(CommandResult::Output(format!(
                        "No example with id {}. Use \\examples to list them.",
                        id
                    ))),
                }
            }

            Command::History => Ok(CommandResult::Output(list_history(session))),

            Command::ClearHistory => {
                session.history_mut().clear();
                Ok(CommandResult::Output("Query history cleared.".to_string()))
            }

            Command::Timing(arg) => {
                let enabled = match arg.as_deref().map(str::to_ascii_lowercase).as_deref() {
                    None => !session.timing(),
                    Some("on") => true,
                    Some("off") => false,
                    Some(other) => bail!("Unknown timing setting '{}'. Use on or off.", other),
                };
                session.set_timing(enabled);
                Ok(CommandResult::Output(
                    if enabled { "Timing is on." } else { "Timing is off." }.to_string(),
                ))
            }

            Command::Format(None) => Ok(CommandResult::Output(format!(
                "Output format is {:?}.",
                session.format()
            ))),
            Command::Format(Some(name)) => match OutputFormat::parse(name) {
                Some(format) => {
                    session.set_format(format);
                    Ok(CommandResult::Output(format!("Output format set to {:?}.", format)))
                }
                None => Ok(CommandResult::Output(format!(
                    "Unknown format '{}'. Available: table, json, csv, raw",
                    name
                ))),
            },

            Command::Status => Ok(CommandResult::Output(status(session))),

            Command::Unknown(cmd) => Ok(CommandResult::Output(format!(
                "Unknown command '\\{}'. Type \\? for help.",
                cmd
            ))),
        }
    }

    /// Returns help text.
    fn help_text() -> String {
        r#"Tabula CLI Commands
===================

General:
  \q, \quit         Exit the CLI
  \?, \help         Show this help
  \s, \status       Show database status

Schema:
  \dt, \tables      List tables
  \d TABLE          Show a table's columns and row count

Samples:
  \examples         List sample queries
  \example ID       Run a sample query

History:
  \history          Show recent queries
  \history clear    Forget recent queries

Display:
  \t, \timing [on|off]  Toggle timing display
  \f FORMAT             Set output format (table, json, csv, raw)

Type SQL statements followed by a semicolon to execute them.
"#
        .to_string()
    }
}

fn list_tables(session: &Session) -> String {
    let catalog = session.db().catalog();
    let rows: Vec<Vec<Value>> = catalog
        .table_names()
        .into_iter()
        .map(|name| match catalog.get(&name) {
            Some(table) => vec![
                Value::text(name),
                Value::text("loaded"),
                Value::Integer(table.len() as i64),
            ],
            None => vec![Value::text(name), Value::text("not loaded"), Value::Null],
        })
        .collect();
    if rows.is_empty() {
        return "No tables.".to_string();
    }

    let columns = ["table", "status", "rows"].map(String::from);
    formatter::format_rows(&columns, &rows, session.format())
}

fn describe_table(session: &Session, name: &str) -> Result<String> {
    let catalog = session.db().catalog();
    let key = name.to_ascii_lowercase();
    if !catalog.table_names().contains(&key) {
        bail!("No such table: {}", name);
    }
    let table = catalog.load_table(&key)?;

    let rows: Vec<Vec<Value>> = table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| vec![Value::Integer(i as i64 + 1), Value::text(column.as_str())])
        .collect();
    let columns = ["#", "column"].map(String::from);
    Ok(format!(
        "Table \"{}\"\n{}\n({} rows)",
        table.name(),
        formatter::format_rows(&columns, &rows, session.format()).trim_end(),
        table.len()
    ))
}

fn list_examples(format: OutputFormat) -> String {
    let rows: Vec<Vec<Value>> = sample_queries()
        .iter()
        .map(|sample| {
            vec![
                Value::Integer(i64::from(sample.id)),
                Value::text(sample.name),
                Value::text(sample.description),
            ]
        })
        .collect();
    let columns = ["id", "name", "description"].map(String::from);
    formatter::format_rows(&columns, &rows, format)
}

fn list_history(session: &Session) -> String {
    let history = session.history();
    if history.is_empty() {
        return "No query history yet. Execute a query to see it here.".to_string();
    }

    let rows: Vec<Vec<Value>> = history
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            vec![
                Value::Integer(i as i64 + 1),
                Value::text(
                    entry
                        .timestamp
                        .with_timezone(&Local)
                        .format("%H:%M:%S")
                        .to_string(),
                ),
                entry
                    .execution_time
                    .map_or(Value::Null, |ms| Value::text(format!("{}ms", ms))),
                entry
                    .row_count
                    .map_or(Value::Null, |n| Value::Integer(n as i64)),
                Value::text(preview(&entry.query)),
            ]
        })
        .collect();
    let columns = ["#", "time", "duration", "rows", "query"].map(String::from);
    formatter::format_rows(&columns, &rows, session.format())
}

/// The query on one line, cut to [`HISTORY_PREVIEW_CHARS`] characters.
fn preview(query: &str) -> String {
    let flat = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > HISTORY_PREVIEW_CHARS {
        let cut: String = flat.chars().take(HISTORY_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn status(session: &Session) -> String {
    let db = session.db();
    let status = db.status();
    let stats = db.stats();
    format!(
        "Status: {}\n\
         Tables loaded: {}/{}\n\
         Queries: {} executed, {} failed\n\
         Uptime: {}s",
        status.message.as_deref().unwrap_or("Ready"),
        stats.tables_loaded,
        stats.tables_available,
        stats.queries_executed,
        stats.queries_failed,
        stats.uptime.as_secs()
    )
}
