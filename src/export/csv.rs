//! CSV export.
//!
//! Every cell, header labels included, is wrapped in double quotes with embedded
//! quotes doubled, so commas and newlines inside values never break a row.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::{Column, cell_text, columns_or_first_row, to_objects};
use crate::errors::ExportError;

/// Formats the raw value of a date column
pub type DateFormatter = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Render ISO timestamps and dates as `YYYY-MM-DD`; anything else is kept as is
pub fn format_iso_date(value: &str) -> String {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return timestamp.format("%Y-%m-%d").to_string();
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return timestamp.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_string()
}

/// `{name}_{YYYY-MM-DD}.csv`
pub fn csv_file_name(name: &str, date: NaiveDate) -> String {
    format!("{name}_{}.csv", date.format("%Y-%m-%d"))
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

pub struct CsvExporter {
    columns: Vec<Column>,
    date_fields: Vec<String>,
    date_formatter: DateFormatter,
}

impl std::fmt::Debug for CsvExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvExporter")
            .field("columns", &self.columns)
            .field("date_fields", &self.date_fields)
            .finish()
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    /// Exporter deriving its columns from the first row
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            date_fields: Vec::new(),
            date_formatter: Box::new(format_iso_date),
        }
    }

    /// Export only these columns, under these labels
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Pass the values of these fields through the date formatter
    pub fn with_date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_formatter(mut self, formatter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.date_formatter = Box::new(formatter);
        self
    }

    /// Render `rows` (serialized to JSON objects) as CSV text
    pub fn export<T: Serialize>(&self, rows: &[T]) -> Result<String, ExportError> {
        let rows = to_objects(rows)?;
        let columns = columns_or_first_row(&self.columns, &rows);

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(
            columns
                .iter()
                .map(|column| quote(&column.label))
                .collect::<Vec<_>>()
                .join(","),
        );
        for row in &rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| {
                    let text = cell_text(row.get(&column.key));
                    if !text.is_empty() && self.date_fields.contains(&column.key) {
                        quote(&(self.date_formatter)(&text))
                    } else {
                        quote(&text)
                    }
                })
                .collect();
            lines.push(cells.join(","));
        }
        Ok(lines.join("\n"))
    }

    /// Write `rows` to `{dir}/{name}_{today}.csv`, returning the file path
    pub fn write_to_dir<T: Serialize>(&self, dir: &Path, name: &str, rows: &[T]) -> Result<PathBuf, ExportError> {
        let contents = self.export(rows)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(csv_file_name(name, Local::now().date_naive()));
        std::fs::write(&path, contents)?;
        crate::debug_log!("📄 [EXPORT] Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}
