//! Retention-time rounding.

use crate::error::{TransformError, TransformResult};
use crate::models::columns::{RETENTION_ROUNDOFF, RETENTION_TIME};
use crate::models::{Cell, Table};
use crate::validation::require_column;

/// Round a retention time to a whole minute.
///
/// Values below 0.5 (including zero and negatives) become 1. Everything
/// else is rounded to the nearest integer, ties to even.
///
/// ```ignore
/// assert_eq!(round_to_nearest(0.3), 1);
/// assert_eq!(round_to_nearest(1.5), 2);
/// assert_eq!(round_to_nearest(2.5), 2);
/// ```
pub fn round_to_nearest(value: f64) -> i64 {
    if value < 0.5 {
        1
    } else {
        value.round_ties_even() as i64
    }
}

/// Append `Retention Time Roundoff (min)` computed from `Retention time (min)`.
///
/// Row count and order are unchanged. If the roundoff column already
/// exists it is recomputed in place.
pub fn round_retention(table: &Table) -> TransformResult<Table> {
    require_column(table, RETENTION_TIME)?;
    let source = table.column(RETENTION_TIME).unwrap_or_default();

    let rounded = source
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.as_f64()
                .map(|v| Cell::Int(round_to_nearest(v)))
                .ok_or_else(|| TransformError::NonNumeric {
                    column: RETENTION_TIME.to_string(),
                    row,
                })
        })
        .collect::<TransformResult<Vec<Cell>>>()?;

    let mut result = table.clone();
    result.set_column(RETENTION_ROUNDOFF, rounded)?;
    Ok(result)
}
