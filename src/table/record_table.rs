//! Ordered, uniform-schema tables of scalar values

use super::{ColumnType, Value};
use std::collections::HashSet;

/// One row of a [`RecordTable`], ordered like the table's columns
pub type Row = Vec<Value>;

/// Errors raised when a table's rows don't fit its header
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// An ordered sequence of rows sharing one column set and order
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RecordTable {
    /// Create a table, checking column names are unique and every row
    /// has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != columns.len())
        {
            return Err(TableError::RowWidth {
                row,
                found,
                expected: columns.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from parts already known to be consistent
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.width())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Look up a single cell by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Iterate over the values of one column
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[index]))
    }

    /// The type of each column, judged from its non-null values
    ///
    /// Text wins over numbers and Float wins over Integer. A column of
    /// nulls is Text.
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.width())
            .map(|index| {
                self.rows
                    .iter()
                    .filter_map(|r| r[index].column_type())
                    .fold(None, |acc, kind| {
                        Some(match (acc, kind) {
                            (Some(ColumnType::Text), _) | (_, ColumnType::Text) => ColumnType::Text,
                            (Some(ColumnType::Float), _) | (_, ColumnType::Float) => {
                                ColumnType::Float
                            }
                            _ => ColumnType::Integer,
                        })
                    })
                    .unwrap_or(ColumnType::Text)
            })
            .collect()
    }

    /// Give every column a single value type
    ///
    /// Integers mixed with floats become floats; numbers mixed with text
    /// become text. Nulls stay null.
    pub fn harmonize(mut self) -> Self {
        let types = self.column_types();
        for row in &mut self.rows {
            for (value, target) in row.iter_mut().zip(&types) {
                let current = std::mem::replace(value, Value::Null);
                *value = current.coerce(*target);
            }
        }
        self
    }
}
