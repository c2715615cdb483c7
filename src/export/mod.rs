//! Table export: CSV downloads and the print view

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ExportError;

pub mod csv;
pub mod print;

pub use csv::{CsvExporter, csv_file_name};
pub use print::PrintDocument;

/// A column: the row field it reads and the label shown in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Serialize rows into JSON objects
pub(crate) fn to_objects<T: Serialize>(rows: &[T]) -> Result<Vec<Map<String, Value>>, ExportError> {
    rows.iter()
        .map(|row| match serde_json::to_value(row) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ExportError::InvalidRow(other.to_string())),
            Err(err) => Err(ExportError::InvalidRow(err.to_string())),
        })
        .collect()
}

/// Columns of the first row when none are configured; labels equal keys
pub(crate) fn columns_or_first_row(columns: &[Column], rows: &[Map<String, Value>]) -> Vec<Column> {
    if !columns.is_empty() {
        return columns.to_vec();
    }
    rows.first()
        .map(|row| row.keys().map(|key| Column::new(key, key)).collect())
        .unwrap_or_default()
}

/// Display text of a cell
pub(crate) fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
