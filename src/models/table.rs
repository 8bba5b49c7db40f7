//! In-memory tabular result type.

use std::io::Write;

use serde_json::Value as JsonValue;

use crate::error::AppError;

/// A materialized table: named columns over rows of JSON cells.
///
/// Missing values are `JsonValue::Null`. Every row has exactly one cell per
/// column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<JsonValue>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows. Short rows are padded with
    /// nulls, long rows truncated.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Appends a row, normalised to the column count.
    pub fn push_row(&mut self, mut row: Vec<JsonValue>) {
        row.resize(self.columns.len(), JsonValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<JsonValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&JsonValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterates the cells of one column.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a JsonValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Keeps only the columns for which `keep` returns true.
    pub fn retain_columns<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let kept: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| keep(name))
            .map(|(i, _)| i)
            .collect();

        if kept.len() == self.columns.len() {
            return self;
        }

        let columns = kept.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                kept.iter()
                    .map(|&i| std::mem::take(&mut row[i]))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Sets a column from one value per row, replacing an existing column of
    /// the same name.
    pub fn set_column(&mut self, name: &str, mut values: Vec<JsonValue>) {
        values.resize(self.rows.len(), JsonValue::Null);
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Fraction of null cells in a column; 0.0 for an empty table.
    pub fn null_fraction(&self, idx: usize) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let nulls = self.rows.iter().filter(|r| r[idx].is_null()).count();
        nulls as f64 / self.rows.len() as f64
    }

    /// Writes the table as CSV with a header row.
    ///
    /// Strings are written as-is, nulls as empty fields, everything else
    /// (numbers, lists) as JSON.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), AppError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;
        for row in &self.rows {
            csv.write_record(row.iter().map(cell_text))?;
        }
        csv.flush()?;
        Ok(())
    }
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
