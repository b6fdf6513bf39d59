//! Delimited text rendering of heterogeneous report rows.
//!
//! Rows are ordered key/value mappings that need not share a key set. The
//! header is the union of all keys in first-seen order; a row lacking a
//! column renders an empty cell.

use std::fmt;

/// Default column delimiter.
pub const TAB: &str = "\t";

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(n) => write!(f, "{n}"),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Cell::Number(value as f64), Cell::Integer)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// ---------------------------------------------------------------------------
// ReportRow
// ---------------------------------------------------------------------------

/// Ordered mapping of column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    cells: Vec<(String, Cell)>,
}

impl ReportRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`. An existing column keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Cell>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Builder form of [`ReportRow::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Union of all row keys in order of first appearance.
pub fn header_columns(rows: &[ReportRow]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}

/// Render rows as a header line followed by one line per row.
///
/// Lines are joined with `\n` without a trailing newline. Text containing
/// the delimiter or a line break has those characters replaced by a space.
/// Output depends only on the input, so re-rendering is byte-identical.
pub fn render_spreadsheet(rows: &[ReportRow], delimiter: &str) -> String {
    let columns = header_columns(rows);

    let header: Vec<String> = columns.iter().map(|c| sanitize(c, delimiter)).collect();
    let mut lines = vec![header.join(delimiter)];

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|cell| sanitize(&cell.to_string(), delimiter))
                    .unwrap_or_default()
            })
            .collect();
        lines.push(values.join(delimiter));
    }

    if rows.is_empty() {
        lines.push(String::new());
    }

    lines.join("\n")
}

fn sanitize(value: &str, delimiter: &str) -> String {
    let mut out = if delimiter.is_empty() {
        value.to_string()
    } else {
        value.replace(delimiter, " ")
    };
    if out.contains(['\r', '\n']) {
        out = out.replace("\r\n", " ").replace(['\r', '\n'], " ");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
