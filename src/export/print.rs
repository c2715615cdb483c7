//! Print view: a standalone HTML page that opens the platform print dialog on load

use std::path::Path;

use serde::Serialize;

use super::{Column, cell_text, columns_or_first_row, to_objects};
use crate::errors::ExportError;

const PRINT_STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 24px; color: #111; }
h1 { font-size: 20px; margin-bottom: 4px; }
.meta { color: #666; font-size: 12px; margin-bottom: 16px; }
table { width: 100%; border-collapse: collapse; font-size: 12px; }
th, td { border: 1px solid #ccc; padding: 6px 8px; text-align: left; }
th { background: #f3f4f6; }
tr:nth-child(even) td { background: #fafafa; }
@media print { body { margin: 0; } }";

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// A table rendered for printing
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    pub title: String,
    pub columns: Vec<Column>,
    /// Line under the title, e.g. the generation date
    pub subtitle: Option<String>,
}

impl PrintDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: Vec::new(),
            subtitle: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn render<T: Serialize>(&self, rows: &[T]) -> Result<String, ExportError> {
        let rows = to_objects(rows)?;
        let columns = columns_or_first_row(&self.columns, &rows);
        let title = escape_html(&self.title);

        let head: String = columns
            .iter()
            .map(|column| format!("<th>{}</th>", escape_html(&column.label)))
            .collect();
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = columns
                    .iter()
                    .map(|column| format!("<td>{}</td>", escape_html(&cell_text(row.get(&column.key)))))
                    .collect();
                format!("<tr>{cells}</tr>\n")
            })
            .collect();
        let subtitle = self
            .subtitle
            .as_deref()
            .map(|subtitle| format!("<div class=\"meta\">{}</div>\n", escape_html(subtitle)))
            .unwrap_or_default();

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <style>\n{PRINT_STYLE}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n{subtitle}\
             <table>\n<thead><tr>{head}</tr></thead>\n<tbody>\n{body}</tbody>\n</table>\n\
             <script>window.onload = function () {{ window.print(); }};</script>\n</body>\n</html>\n"
        ))
    }

    /// Render to `path` for the platform to open and print
    pub fn write_to<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<(), ExportError> {
        let html = self.render(rows)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, html)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_are_escaped_and_print_is_invoked() {
        let html = PrintDocument::new("Orders <Q1>")
            .with_columns(vec![Column::new("customer", "Customer")])
            .render(&[json!({ "customer": "<script>alert(1)</script>" })])
            .unwrap();
        assert!(html.contains("<title>Orders &lt;Q1&gt;</title>"));
        assert!(html.contains("<td>&lt;script&gt;alert(1)&lt;/script&gt;</td>"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("<th>Customer</th>"));
    }

    #[test]
    fn writes_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print/orders.html");
        PrintDocument::new("Orders")
            .write_to(&path, &[json!({ "id": 1 })])
            .unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("<td>1</td>"));
    }
}
