//! Spreadsheet writer: [`Table`] → in-memory `.xlsx` bytes.
//!
//! One worksheet, header row in bold, then one row per record. Cell types
//! follow the JSON leaf: strings are text, numbers are numeric, booleans are
//! booleans, and null or missing values leave the cell empty. Nothing
//! touches the filesystem.

use crate::error::DocSheetError;
use crate::pipeline::table::Table;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use tracing::debug;

/// MIME type of the produced workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// File name offered for download.
pub const DEFAULT_OUTPUT_NAME: &str = "output.xlsx";

/// Serialise `table` into a single-sheet workbook named `sheet_name`.
pub fn write_spreadsheet(table: &Table, sheet_name: &str) -> Result<Vec<u8>, DocSheetError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, name, &header)?;
    }

    for (r, record) in table.rows.iter().enumerate() {
        let row = row_index(r + 1)?;
        for (col, name) in table.columns.iter().enumerate() {
            if let Some(value) = record.get(name) {
                write_cell(worksheet, row, column_index(col)?, value)?;
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Wrote '{}': {} rows × {} columns, {} bytes",
        sheet_name,
        table.row_count(),
        table.column_count(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), DocSheetError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                ws.write_number(row, col, f)?;
            }
            None => {
                ws.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            ws.write_string(row, col, s)?;
        }
        // Flattened records only hold scalars; render anything else as JSON text.
        other => {
            ws.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn row_index(row: usize) -> Result<u32, DocSheetError> {
    u32::try_from(row).map_err(|_| DocSheetError::SpreadsheetFailed {
        detail: format!("row {row} exceeds the worksheet limit"),
    })
}

fn column_index(col: usize) -> Result<u16, DocSheetError> {
    u16::try_from(col).map_err(|_| DocSheetError::SpreadsheetFailed {
        detail: format!("column {col} exceeds the worksheet limit"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::flatten::FlatRecord;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn produces_zip_container() {
        let table = Table::from_rows(vec![record(&[("a", json!(1)), ("b", json!("x"))])]);
        let bytes = write_spreadsheet(&table, "Main Data").unwrap();
        assert!(bytes.starts_with(b"PK"), "xlsx is a zip archive");
    }

    #[test]
    fn empty_table_still_writes_workbook() {
        let bytes = write_spreadsheet(&Table::default(), "Main Data").unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn too_many_columns_is_conversion_error() {
        let wide: FlatRecord = (0..20_000).map(|i| (format!("k{i}"), json!(i))).collect();
        let err = write_spreadsheet(&Table::from_rows(vec![wide]), "Main Data").unwrap_err();
        assert!(matches!(err, DocSheetError::SpreadsheetFailed { .. }), "got {err:?}");
    }

    #[test]
    fn invalid_sheet_name_is_conversion_error() {
        let err = write_spreadsheet(&Table::default(), "bad/name").unwrap_err();
        assert!(matches!(err, DocSheetError::SpreadsheetFailed { .. }));
    }
}
