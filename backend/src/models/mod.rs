//! Domain models for the Metaboflow workflow.
//!
//! This module contains the core data structures used throughout the workflow:
//!
//! - [`Cell`] - A single scalar spreadsheet value
//! - [`Table`] - Ordered named columns of equal length
//! - [`Stage`] - Which transform produced a stored file
//! - [`columns`] - Column names read and written by the transforms

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TableError, TableResult};

/// Column names consumed and produced by the transforms.
pub mod columns {
    /// Compound identifier, suffixed with the lipid class.
    pub const COMPOUND_ID: &str = "Accepted Compound ID";
    /// Measured retention time in minutes.
    pub const RETENTION_TIME: &str = "Retention time (min)";
    /// Mass-to-charge ratio.
    pub const MZ: &str = "m/z";
    /// Rounded retention time added by the rounding step.
    pub const RETENTION_ROUNDOFF: &str = "Retention Time Roundoff (min)";
}

// =============================================================================
// Cell
// =============================================================================

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric view of the cell. Text is never coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => n.is_nan(),
            _ => false,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

// =============================================================================
// Table
// =============================================================================

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    cells: Vec<Cell>,
}

/// In-memory tabular data: named columns, ordered rows.
///
/// All columns always hold the same number of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table from `(name, cells)` pairs, in column order.
    pub fn new(columns: Vec<(String, Vec<Cell>)>) -> TableResult<Self> {
        let rows = columns.first().map(|(_, cells)| cells.len()).unwrap_or(0);
        let mut table = Self {
            columns: Vec::with_capacity(columns.len()),
            rows,
        };
        for (name, cells) in columns {
            table.push_column(name, cells)?;
        }
        Ok(table)
    }

    /// Build a table from a header row and data rows.
    ///
    /// Short rows are padded with [`Cell::Empty`], long rows truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> TableResult<Self> {
        let width = headers.len();
        let mut cells: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); width];
        for row in rows {
            let mut values = row.into_iter();
            for column in cells.iter_mut() {
                column.push(values.next().unwrap_or_default());
            }
        }
        let mut table = Self::new(headers.into_iter().zip(cells).collect())?;
        if width == 0 {
            table.rows = 0;
        }
        Ok(table)
    }

    /// Column names, in order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cells of row `index`, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    /// Iterate over `(name, cells)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.cells.as_slice()))
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) -> TableResult<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = cells.len();
        }
        if cells.len() != self.rows {
            return Err(TableError::RaggedColumns {
                column: name,
                expected: self.rows,
                found: cells.len(),
            });
        }
        self.columns.push(Column { name, cells });
        Ok(())
    }

    /// Replace the named column in place, or append it if absent.
    pub fn set_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) -> TableResult<()> {
        let name = name.into();
        match self.columns.iter().position(|c| c.name == name) {
            Some(index) if cells.len() == self.rows => {
                self.columns[index].cells = cells;
                Ok(())
            }
            Some(_) => Err(TableError::RaggedColumns {
                column: name,
                expected: self.rows,
                found: cells.len(),
            }),
            None => self.push_column(name, cells),
        }
    }

    /// New table holding only the given rows, in the given order.
    ///
    /// Out-of-range indices are ignored.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let kept: Vec<usize> = indices.iter().copied().filter(|&i| i < self.rows).collect();
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: kept.iter().map(|&i| c.cells[i].clone()).collect(),
                })
                .collect(),
            rows: kept.len(),
        }
    }

    /// New table without the named columns. Unknown names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
            rows: self.rows,
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> Value {
        let records = (0..self.rows)
            .map(|i| {
                let mut obj = Map::new();
                for column in &self.columns {
                    let value = serde_json::to_value(&column.cells[i]).unwrap_or(Value::Null);
                    obj.insert(column.name.clone(), value);
                }
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Which transform produced a stored file.
///
/// The prefix namespaces a transform's output from the original upload
/// and from the outputs of the other transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Pc,
    Lpc,
    Plasmalogen,
    RoundoffRetention,
    MeanDataFrame,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Pc,
        Stage::Lpc,
        Stage::Plasmalogen,
        Stage::RoundoffRetention,
        Stage::MeanDataFrame,
    ];

    /// File name prefix for this stage.
    pub fn prefix(&self) -> &'static str {
        match self {
            Stage::Pc => "PC_",
            Stage::Lpc => "LPC_",
            Stage::Plasmalogen => "plasmalogen_",
            Stage::RoundoffRetention => "Roundoff_Retention_",
            Stage::MeanDataFrame => "mean_dataFrame_",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
