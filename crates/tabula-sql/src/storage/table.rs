//! In-memory tables.

use crate::executor::{Row, Value};

/// Ordered column names of a table. Lookups ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Creates a schema from column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the first column with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }
}

/// A named, immutable table: a schema and its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    /// Creates a table. Every row must have one value per column.
    pub fn new(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == schema.len()));
        Self {
            name: name.into(),
            schema,
            rows,
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All rows in source order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value of a named column in a given row.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.schema.index_of(column)?;
        self.rows.get(row)?.get(index)
    }

    /// A row as `(column, value)` pairs.
    pub fn record(&self, row: usize) -> Option<impl Iterator<Item = (&str, &Value)>> {
        let row = self.rows.get(row)?;
        Some(
            self.schema
                .columns()
                .iter()
                .map(String::as_str)
                .zip(row.iter()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            "shippers",
            Schema::new(vec!["shipper_id".into(), "company_name".into()]),
            vec![
                Row::new(vec![Value::text("1"), Value::text("Speedy Express")]),
                Row::new(vec![Value::text("2"), Value::Null]),
            ],
        )
    }

    #[test]
    fn test_lookup_ignores_case() {
        let table = sample();
        assert_eq!(table.schema().index_of("COMPANY_NAME"), Some(1));
        assert_eq!(table.value(0, "Company_Name"), Some(&Value::text("Speedy Express")));
        assert_eq!(table.value(1, "company_name"), Some(&Value::Null));
        assert_eq!(table.value(0, "phone"), None);
    }

    #[test]
    fn test_record() {
        let table = sample();
        let record: Vec<_> = table.record(0).unwrap().collect();
        assert_eq!(record[0], ("shipper_id", &Value::text("1")));
        assert!(table.record(5).is_none());
    }
}
