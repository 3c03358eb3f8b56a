//! Average metabolite columns per rounded retention time.
//!
//! # Example
//!
//! ```text
//! Roundoff  Sample A  Sample B            Roundoff  Sample A  Sample B
//! 2         10        1          →        2         20        1.5
//! 5         40        8                   5         40        8
//! 2         30        2
//! ```
//!
//! Groups appear in the order their roundoff value is first seen.

use std::collections::HashMap;

use crate::error::TransformResult;
use crate::models::columns::{COMPOUND_ID, MZ, RETENTION_ROUNDOFF, RETENTION_TIME};
use crate::models::{Cell, Table};
use crate::validation::require_column;

/// Columns that describe a feature rather than measure it.
const DESCRIPTOR_COLUMNS: [&str; 3] = [MZ, RETENTION_TIME, COMPOUND_ID];

/// One output row per distinct `Retention Time Roundoff (min)` value.
///
/// `m/z`, `Retention time (min)` and `Accepted Compound ID` are dropped
/// when present. Every remaining column, the roundoff column included, is
/// averaged over the rows of each group. Cells that are not numbers are
/// skipped; a group with no numeric cell in a column gets an empty cell.
/// Rows with an empty roundoff value belong to no group.
pub fn grouped_mean(table: &Table) -> TransformResult<Table> {
    require_column(table, RETENTION_ROUNDOFF)?;

    let metabolites = table.drop_columns(&DESCRIPTOR_COLUMNS);
    let groups = group_rows(metabolites.column(RETENTION_ROUNDOFF).unwrap_or_default());

    let columns = metabolites
        .iter_columns()
        .map(|(name, cells)| {
            let means = groups
                .iter()
                .map(|rows| mean(rows.iter().map(|&i| &cells[i])))
                .collect();
            (name.to_string(), means)
        })
        .collect();

    Ok(Table::new(columns)?)
}

/// Hashable identity of a grouping cell.
#[derive(Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    Number(u64),
    Text(String),
    Bool(bool),
}

impl GroupKey {
    fn of(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => None,
            // -0.0 and 0.0 are the same group
            Cell::Int(_) | Cell::Number(_) => cell
                .as_f64()
                .map(|v| GroupKey::Number(if v == 0.0 { 0u64 } else { v.to_bits() })),
            Cell::Text(s) => Some(GroupKey::Text(s.clone())),
            Cell::Bool(b) => Some(GroupKey::Bool(*b)),
        }
    }
}

/// Row indices per distinct key, in first-encountered order.
fn group_rows(keys: &[Cell]) -> Vec<Vec<usize>> {
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (row, cell) in keys.iter().enumerate() {
        if let Some(key) = GroupKey::of(cell) {
            let index = *positions.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(row);
        }
    }

    groups
}

/// Arithmetic mean of the numeric cells, or empty when there are none.
/// Booleans count as 1 and 0.
fn mean<'a>(cells: impl Iterator<Item = &'a Cell>) -> Cell {
    let (sum, count) = cells
        .filter_map(|cell| match cell {
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        })
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        Cell::Empty
    } else {
        Cell::Number(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    fn rounded() -> Table {
        Table::new(vec![
            (
                COMPOUND_ID.into(),
                vec!["a_PC".into(), "b_PC".into(), "c_LPC".into(), "d".into()],
            ),
            (
                MZ.into(),
                vec![Cell::Number(100.0), Cell::Number(200.0), Cell::Number(300.0), Cell::Number(400.0)],
            ),
            (
                RETENTION_TIME.into(),
                vec![Cell::Number(5.2), Cell::Number(1.9), Cell::Number(4.8), Cell::Number(2.1)],
            ),
            (
                "Sample A".into(),
                vec![Cell::Number(10.0), Cell::Number(1.0), Cell::Number(30.0), Cell::Number(3.0)],
            ),
            (
                "Sample B".into(),
                vec![Cell::Number(2.0), Cell::Empty, Cell::from("n/a"), Cell::Number(7.0)],
            ),
            (
                RETENTION_ROUNDOFF.into(),
                vec![Cell::Int(5), Cell::Int(2), Cell::Int(5), Cell::Number(2.0)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_means_per_group_in_first_seen_order() {
        let result = grouped_mean(&rounded()).unwrap();

        assert_eq!(result.headers(), vec!["Sample A", "Sample B", RETENTION_ROUNDOFF]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(
            result.column(RETENTION_ROUNDOFF).unwrap(),
            &[Cell::Number(5.0), Cell::Number(2.0)]
        );
        assert_eq!(
            result.column("Sample A").unwrap(),
            &[Cell::Number(20.0), Cell::Number(2.0)]
        );
    }

    #[test]
    fn test_non_numeric_cells_skipped() {
        let result = grouped_mean(&rounded()).unwrap();
        // group 5: [2.0, "n/a"] -> 2.0; group 2: [empty, 7.0] -> 7.0
        assert_eq!(
            result.column("Sample B").unwrap(),
            &[Cell::Number(2.0), Cell::Number(7.0)]
        );
    }

    #[test]
    fn test_all_missing_column_stays_empty() {
        let table = Table::new(vec![
            ("Notes".into(), vec![Cell::from("x"), Cell::Empty]),
            (RETENTION_ROUNDOFF.into(), vec![Cell::Int(3), Cell::Int(3)]),
        ])
        .unwrap();
        let result = grouped_mean(&table).unwrap();
        assert_eq!(result.column("Notes").unwrap(), &[Cell::Empty]);
    }

    #[test]
    fn test_booleans_average_as_ones_and_zeros() {
        let table = Table::new(vec![
            (
                "Detected".into(),
                vec![Cell::Bool(true), Cell::Bool(false), Cell::Bool(true), Cell::Bool(true)],
            ),
            (
                RETENTION_ROUNDOFF.into(),
                vec![Cell::Int(2), Cell::Int(2), Cell::Int(4), Cell::Int(4)],
            ),
        ])
        .unwrap();
        let result = grouped_mean(&table).unwrap();
        assert_eq!(
            result.column("Detected").unwrap(),
            &[Cell::Number(0.5), Cell::Number(1.0)]
        );
    }

    #[test]
    fn test_descriptor_columns_optional() {
        let table = Table::new(vec![
            ("Sample".into(), vec![Cell::Number(1.0), Cell::Number(3.0)]),
            (RETENTION_ROUNDOFF.into(), vec![Cell::Int(1), Cell::Int(1)]),
        ])
        .unwrap();
        let result = grouped_mean(&table).unwrap();
        assert_eq!(result.column("Sample").unwrap(), &[Cell::Number(2.0)]);
    }

    #[test]
    fn test_empty_roundoff_rows_ignored() {
        let table = Table::new(vec![
            ("Sample".into(), vec![Cell::Number(1.0), Cell::Number(100.0)]),
            (RETENTION_ROUNDOFF.into(), vec![Cell::Int(1), Cell::Empty]),
        ])
        .unwrap();
        let result = grouped_mean(&table).unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.column("Sample").unwrap(), &[Cell::Number(1.0)]);
    }

    #[test]
    fn test_requires_roundoff_column() {
        let table = Table::new(vec![(RETENTION_TIME.into(), vec![Cell::Number(1.0)])]).unwrap();
        assert_eq!(
            grouped_mean(&table),
            Err(TransformError::MissingColumn(RETENTION_ROUNDOFF.into()))
        );
    }
}
