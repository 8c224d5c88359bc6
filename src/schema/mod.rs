// Schema module - describes the live database for the prompt
// The description is read fresh from the catalog on every request

pub mod reader;

use std::fmt;

/// A single (table, column, type) triple from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub table: String,
    pub name: String,
    pub data_type: String,
}

impl Column {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.table, self.name, self.data_type)
    }
}

/// Every column of every table in one namespace, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescription {
    pub columns: Vec<Column>,
}

impl SchemaDescription {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Distinct table names, in first-seen order
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for column in &self.columns {
            if !tables.contains(&column.table.as_str()) {
                tables.push(&column.table);
            }
        }
        tables
    }

    /// Flat text form used in the prompt: one `table.column (type)` per line
    pub fn render(&self) -> String {
        let mut text = String::new();
        for column in &self.columns {
            text.push_str(&column.to_string());
            text.push('\n');
        }
        text
    }
}
