//! Interactive REPL (Read-Eval-Print-Loop) for Tabula.
//!
//! Provides an interactive SQL shell with line history, line editing,
//! multi-line input and keyword completion.

use std::path::PathBuf;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use tracing::{debug, error};

use crate::commands::{Command, CommandResult};
use crate::script::{is_complete, split_statements};
use crate::session::Session;

/// The REPL prompt shown when waiting for input.
const PROMPT: &str = "tabula> ";

/// Words offered by tab completion, besides table names.
const KEYWORDS: &[&str] = &[
    "SELECT", "DISTINCT", "FROM", "WHERE", "JOIN", "INNER", "CROSS", "ON", "AS", "AND", "OR",
    "NOT", "NULL", "IS", "IN", "LIKE", "BETWEEN", "TRUE", "FALSE", "GROUP", "BY", "HAVING",
    "ORDER", "ASC", "DESC", "LIMIT", "OFFSET", "COUNT", "SUM", "AVG", "MIN", "MAX", "UPPER",
    "LOWER", "LENGTH", "ABS", "ROUND", "COALESCE", "SUBSTR",
];

/// REPL helper for rustyline.
struct ReplHelper {
    /// Completion candidates, keywords first.
    words: Vec<String>,
}

impl ReplHelper {
    fn new(tables: Vec<String>) -> Self {
        let mut words: Vec<String> = KEYWORDS.iter().map(|k| k.to_string()).collect();
        words.extend(tables);
        Self { words }
    }

    /// Candidates for the word that ends at `pos`.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word = &line[start..pos];
        if word.is_empty() {
            return (start, Vec::new());
        }
        let lowercase = word.chars().all(|c| !c.is_ascii_uppercase());

        let matches = self
            .words
            .iter()
            .filter(|w| w.len() >= word.len() && w[..word.len()].eq_ignore_ascii_case(word))
            .map(|w| {
                let replacement = if lowercase {
                    w.to_ascii_lowercase()
                } else {
                    w.clone()
                };
                Pair {
                    display: w.clone(),
                    replacement,
                }
            })
            .collect();

        (start, matches)
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let trimmed = ctx.input().trim();

        if trimmed.is_empty() || trimmed.starts_with('\\') || is_complete(trimmed) {
            return Ok(ValidationResult::Valid(None));
        }

        Ok(ValidationResult::Incomplete)
    }
}

impl Helper for ReplHelper {}

/// Interactive REPL for Tabula.
pub struct Repl {
    /// Session state shared with one-shot runs.
    session: Session,
    /// The rustyline editor.
    editor: Editor<ReplHelper, DefaultHistory>,
    /// Line history file path.
    line_history_file: Option<PathBuf>,
}

impl Repl {
    /// Creates a new REPL instance.
    pub fn new(session: Session, line_history_size: usize) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(line_history_size)?
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper::new(session.db().catalog().table_names())));

        let line_history_file = line_history_file();
        if let Some(ref path) = line_history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    debug!("Failed to load line history: {}", e);
                }
            }
        }

        Ok(Self {
            session,
            editor,
            line_history_file,
        })
    }

    /// Prints the welcome banner.
    pub fn print_banner(&self) {
        println!("Tabula CLI v{}", env!("CARGO_PKG_VERSION"));
        let tables = self.session.db().catalog().table_names();
        if !tables.is_empty() {
            println!("Tables: {}", tables.join(", "));
        }
        println!("Type \\? for help, \\examples for sample queries, \\q to quit.\n");
    }

    /// Runs the main REPL loop.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if let Err(e) = self.editor.add_history_entry(line) {
                        debug!("Failed to add history entry: {}", e);
                    }

                    match self.process_line(line) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\\q");
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    break;
                }
            }
        }

        self.save_line_history();

        println!("Goodbye!");
        Ok(())
    }

    /// Processes one line of input. Returns true when the REPL should exit.
    fn process_line(&mut self, line: &str) -> Result<bool> {
        if line.starts_with('\\') {
            return self.process_command(line);
        }

        for statement in split_statements(line) {
            execute_and_print(&mut self.session, statement);
        }
        Ok(false)
    }

    /// Processes a backslash command.
    fn process_command(&mut self, line: &str) -> Result<bool> {
        match Command::parse(line).execute(&mut self.session)? {
            CommandResult::Exit => Ok(true),
            CommandResult::Output(msg) => {
                println!("{}", msg);
                Ok(false)
            }
            CommandResult::Execute(sql) => {
                println!("{}\n", sql);
                execute_and_print(&mut self.session, &sql);
                Ok(false)
            }
        }
    }

    fn save_line_history(&mut self) {
        if let Some(ref path) = self.line_history_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    debug!("Failed to create history directory: {}", e);
                    return;
                }
            }
            if let Err(e) = self.editor.save_history(path) {
                debug!("Failed to save line history: {}", e);
            }
        }
    }
}

/// Executes SQL in a session and prints the result or the error. Returns
/// true on success.
pub fn execute_and_print(session: &mut Session, sql: &str) -> bool {
    match session.execute(sql) {
        Ok(output) => {
            println!("{}", output);
            true
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            false
        }
    }
}

/// Gets the line editing history path.
fn line_history_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("tabula").join("line_history"))
}
