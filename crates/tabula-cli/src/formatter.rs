//! Output formatting for query results.
//!
//! Supports table, JSON, CSV, and raw output formats.

use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::Value as JsonValue;
use tabula_server::database::QueryResponse;
use tabula_sql::executor::Value;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output, one object per row.
    Json,
    /// CSV output.
    Csv,
    /// Raw output (values separated by tabs).
    Raw,
}

impl OutputFormat {
    /// Parses a format name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            "raw" => Some(OutputFormat::Raw),
            _ => None,
        }
    }
}

/// Formats a query response according to the specified format.
pub fn format_result(result: &QueryResponse, format: OutputFormat) -> String {
    format_rows(&result.columns, &result.rows, format)
}

/// Formats a column header and rows according to the specified format.
pub fn format_rows(columns: &[String], rows: &[Vec<Value>], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_table(columns, rows),
        OutputFormat::Json => format_json(columns, rows),
        OutputFormat::Csv => format_csv(columns, rows),
        OutputFormat::Raw => format_raw(columns, rows),
    }
}

fn format_table(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if !columns.is_empty() {
        table.set_header(columns.iter().map(Cell::new));
    }

    for row in rows {
        table.add_row(row.iter().map(|v| Cell::new(v.to_string())));
    }

    table.to_string()
}

fn format_json(columns: &[String], rows: &[Vec<Value>]) -> String {
    let rows: Vec<JsonValue> = rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (i, value) in row.iter().enumerate() {
                let name = columns
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", i));
                obj.insert(name, serde_json::to_value(value).unwrap_or(JsonValue::Null));
            }
            JsonValue::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// Missing values are written as empty fields.
fn format_csv(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut write = || -> csv::Result<()> {
        if !columns.is_empty() {
            writer.write_record(columns)?;
        }
        for row in rows {
            writer.write_record(row.iter().map(|v| match v {
                Value::Null => String::new(),
                other => other.to_string(),
            }))?;
        }
        writer.flush()?;
        Ok(())
    };
    if let Err(e) = write() {
        return format!("CSV error: {}", e);
    }

    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("CSV error: {}", e.error()),
    }
}

fn format_raw(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut output = String::new();

    if !columns.is_empty() {
        output.push_str(&columns.join("\t"));
        output.push('\n');
    }

    for row in rows {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        output.push_str(&values.join("\t"));
        output.push('\n');
    }

    output
}
