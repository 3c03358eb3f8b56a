//! Input checks performed before any transformation runs.
//!
//! Only two things are checked: that an upload carries an accepted
//! extension, and that a table has the columns a transform reads.
//! Cell contents are not validated here.

use crate::error::TransformError;
use crate::models::Table;

/// Extensions accepted for upload (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 1] = ["xlsx"];

/// Whether the last dot-separated segment of `filename` is an allowed extension.
///
/// # Example
/// ```ignore
/// assert!(is_allowed_extension("batch_07.XLSX"));
/// assert!(!is_allowed_extension("batch_07.csv"));
/// ```
pub fn is_allowed_extension(filename: &str) -> bool {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// Fail with [`TransformError::MissingColumn`] if `column` is absent.
pub fn require_column(table: &Table, column: &str) -> Result<(), TransformError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(TransformError::MissingColumn(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    #[test]
    fn test_allowed_extension() {
        assert!(is_allowed_extension("lipids.xlsx"));
        assert!(is_allowed_extension("LIPIDS.XLSX"));
        assert!(is_allowed_extension("run.2024.xlsx"));
    }

    #[test]
    fn test_rejected_extension() {
        assert!(!is_allowed_extension("lipids.csv"));
        assert!(!is_allowed_extension("lipids.xls"));
        assert!(!is_allowed_extension("xlsx.csv"));
        // Without a dot the whole name is the "extension"
        assert!(is_allowed_extension("xlsx"));
        assert!(!is_allowed_extension("lipids"));
    }

    #[test]
    fn test_require_column() {
        let table = Table::new(vec![("m/z".into(), vec![Cell::Number(1.0)])]).unwrap();
        assert!(require_column(&table, "m/z").is_ok());
        assert_eq!(
            require_column(&table, "Accepted Compound ID"),
            Err(TransformError::MissingColumn("Accepted Compound ID".into()))
        );
    }
}
