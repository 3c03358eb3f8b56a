//! Spreadsheet store: xlsx files to and from [`Table`].
//!
//! Only the first worksheet is read. Its first row holds the column names,
//! every following row is data. Writing produces a single-sheet workbook
//! with a header row and no row index.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use uuid::Uuid;

use crate::error::{SheetError, SheetResult};
use crate::models::{Cell, Table};

/// Load the first worksheet of an xlsx file.
///
/// # Example
/// ```ignore
/// let table = metaboflow::sheet::load("uploads/7_alice_lipids.xlsx")?;
/// println!("{} rows, columns: {:?}", table.row_count(), table.headers());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> SheetResult<Table> {
    let bytes = fs::read(path.as_ref())?;
    load_bytes(&bytes)
}

/// Load the first worksheet of an in-memory xlsx workbook.
pub fn load_bytes(bytes: &[u8]) -> SheetResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::Parse("Workbook has no worksheet".to_string()))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row),
        None => return Ok(Table::default()),
    };

    let records: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(to_cell).collect()).collect();

    Ok(Table::from_rows(headers, records)?)
}

/// Save a table as a single-sheet xlsx file, replacing any existing file.
pub fn save<P: AsRef<Path>>(table: &Table, path: P) -> SheetResult<()> {
    let bytes = to_bytes(table)?;
    write_atomic(path.as_ref(), &bytes)?;
    Ok(())
}

/// Serialize a table to xlsx bytes.
pub fn to_bytes(table: &Table) -> SheetResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, (name, cells)) in table.iter_columns().enumerate() {
        let col = u16::try_from(col)
            .map_err(|_| SheetError::Write(format!("Too many columns ({})", table.column_count())))?;
        worksheet.write_string(0, col, name)?;

        for (row, cell) in cells.iter().enumerate() {
            let row = u32::try_from(row + 1)
                .map_err(|_| SheetError::Write(format!("Too many rows ({})", table.row_count())))?;
            match cell {
                Cell::Empty => {}
                Cell::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Cell::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(row, col, *n)?;
                }
                // NaN and infinities are written as blank cells
                Cell::Number(_) => {}
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write bytes to `path` through a temporary sibling file and a rename,
/// so readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));

    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Column names from the header row.
///
/// Blank names become `Unnamed: <index>` and repeated names get a `.N`
/// suffix, so every column stays addressable.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(row.len());

    for (i, data) in row.iter().enumerate() {
        let raw = match data {
            Data::Empty => String::new(),
            other => other.to_string().trim().to_string(),
        };
        let base = if raw.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw
        };

        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        names.push(name);
    }

    names
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Int(*i),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
