//! Decoding delimited text into tables.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{LoadError, LoadResult};
use super::source::TableSource;
use super::table::{Schema, Table};
use crate::executor::{Row, Value};

/// Fetches table text from a [`TableSource`] and decodes it.
#[derive(Debug, Clone)]
pub struct TableLoader {
    source: Arc<dyn TableSource>,
}

impl TableLoader {
    /// Creates a loader over a source.
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self { source }
    }

    /// The underlying source.
    pub fn source(&self) -> &Arc<dyn TableSource> {
        &self.source
    }

    /// Fetches and decodes one table.
    pub fn load(&self, name: &str) -> LoadResult<Table> {
        let text = self.source.fetch(name)?;
        parse_table(name, &text)
    }
}

/// Decodes comma-separated text with a header row into a table.
///
/// Header names are trimmed. Quoted fields may contain commas, quotes
/// (doubled) and line breaks. Empty fields become NULL and every other
/// field is kept as text. Blank lines are skipped; a record whose field
/// count differs from the header's is an error.
pub fn parse_table(name: &str, text: &str) -> LoadResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| malformed(name, &e))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(LoadError::MalformedRecord {
            table: name.to_string(),
            line: 1,
            reason: "missing header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(name, &e))?;
        let values = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::text(field)
                }
            })
            .collect();
        rows.push(Row::new(values));
    }

    if rows.is_empty() {
        warn!(table = %name, "Table has a header but no rows");
    }
    debug!(table = %name, columns = headers.len(), rows = rows.len(), "Decoded table");

    Ok(Table::new(name, Schema::new(headers), rows))
}

fn malformed(table: &str, error: &csv::Error) -> LoadError {
    match error.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => LoadError::MalformedRecord {
            table: table.to_string(),
            line: pos.as_ref().map_or(0, |p| p.line()),
            reason: format!("expected {} fields, found {}", expected_len, len),
        },
        _ => LoadError::MalformedRecord {
            table: table.to_string(),
            line: error.position().map_or(0, |p| p.line()),
            reason: error.to_string(),
        },
    }
}
