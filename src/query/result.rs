// Query results
// Materialized rows plus the column names from the result descriptor

use std::fmt;

/// A single cell as the simple-query protocol delivers it
///
/// PostgreSQL renders every type in its text form there, so numbers, dates
/// and arrays all arrive as `Text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s),
        }
    }

    /// Parse the cell as an integer (counts, ids)
    pub fn as_i64(&self) -> Option<i64> {
        self.as_str().and_then(|s| s.parse().ok())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<Option<&str>> for Value {
    fn from(cell: Option<&str>) -> Self {
        match cell {
            Some(s) => Value::Text(s.to_string()),
            None => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of a result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Outcome of a successful execution
///
/// A query that matched nothing still carries its column names. Statements
/// without a result descriptor (INSERT, CREATE ...) have no columns and
/// report `rows_affected` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            columns,
            rows,
            rows_affected,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the statement produced a result descriptor at all
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Format the result as a box-drawn table for display
    pub fn format(&self) -> String {
        if !self.has_columns() {
            return format!("{} row(s) affected", self.rows_affected);
        }

        let header: Vec<String> = self.columns.iter().map(|c| escape(c)).collect();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.values.iter().map(|v| escape(&v.to_string())).collect())
            .collect();

        // Calculate column widths
        let mut widths: Vec<usize> = header.iter().map(|c| c.chars().count()).collect();
        for row in &rendered {
            for (i, value) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(value.chars().count());
                }
            }
        }

        let mut result = String::new();

        result.push_str(&border('┌', '┬', '┐', &widths));
        result.push_str(&line(header.iter().map(String::as_str), &widths));
        result.push_str(&border('├', '┼', '┤', &widths));
        for row in &rendered {
            result.push_str(&line(row.iter().map(String::as_str), &widths));
        }
        result.push_str(&border('└', '┴', '┘', &widths));

        result.push_str(&format!("\n{} row(s) returned", self.rows.len()));

        result
    }
}

/// Keep every cell on one line of the table
fn escape(cell: &str) -> String {
    cell.replace('\r', "\\r").replace('\n', "\\n")
}

fn border(left: char, middle: char, right: char, widths: &[usize]) -> String {
    let mut out = String::new();
    out.push(left);
    for (i, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if i < widths.len() - 1 {
            out.push(middle);
        }
    }
    out.push(right);
    out.push('\n');
    out
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut out = String::from("│");
    for (cell, width) in cells.zip(widths) {
        // pad by chars, not bytes
        let pad = width - cell.chars().count();
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad + 1));
        out.push('│');
    }
    out.push('\n');
    out
}
