//! A client session over an embedded database.
//!
//! Holds everything a REPL or a script run needs between statements: the
//! database, the output format, the timing switch and the query history.

use std::time::Instant;

use tabula_server::database::{Database, DatabaseResult};
use tracing::debug;

use crate::formatter::{self, OutputFormat};
use crate::history::QueryHistory;

/// Client session state.
pub struct Session {
    db: Database,
    format: OutputFormat,
    timing: bool,
    history: QueryHistory,
}

impl Session {
    /// Creates a session.
    pub fn new(db: Database, format: OutputFormat, history: QueryHistory) -> Self {
        Self {
            db,
            format,
            timing: false,
            history,
        }
    }

    /// Runs one statement and renders its result for printing.
    ///
    /// Successful statements are added to the query history.
    pub fn execute(&mut self, sql: &str) -> DatabaseResult<String> {
        let start = Instant::now();
        let response = self.db.run_query(sql)?;
        let wall = start.elapsed();
        debug!(rows = response.row_count(), "Statement finished");

        self.history.record(sql, response.execution_time, response.row_count());

        let mut output = formatter::format_result(&response, self.format)
            .trim_end_matches('\n')
            .to_string();
        if self.format == OutputFormat::Table {
            let count = response.row_count();
            output.push_str(&format!(
                "\n({} row{})",
                count,
                if count == 1 { "" } else { "s" }
            ));
        }
        if self.timing {
            output.push_str(&format!(
                "\nTime: {}ms (total {:.3}ms)",
                response.execution_time,
                wall.as_secs_f64() * 1000.0
            ));
        }
        Ok(output)
    }

    /// Returns the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Returns the current output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Sets the output format.
    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// Returns true if timing is shown.
    pub fn timing(&self) -> bool {
        self.timing
    }

    /// Shows or hides timing.
    pub fn set_timing(&mut self, enabled: bool) {
        self.timing = enabled;
    }

    /// Returns the query history.
    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    /// Returns the query history for modification.
    pub fn history_mut(&mut self) -> &mut QueryHistory {
        &mut self.history
    }
}
