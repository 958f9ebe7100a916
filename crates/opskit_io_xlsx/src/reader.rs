//! Workbook loading/saving and worksheet-to-table conversion.
//!
//! Existing workbooks are handled with `umya-spreadsheet` so styles survive a
//! read-edit-write cycle untouched.

use std::io::Cursor;

use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::XlsxIoError;
use crate::spec::{SpecSheetTable, SpecTableReadOptions};
use crate::util::is_blank_text;

////////////////////////////////////////////////////////////////////////////////
// #region WorkbookIO

/// Parse XLSX bytes into an editable workbook (all sheets deserialized).
pub fn read_workbook_bytes(v_bytes: &[u8]) -> Result<Spreadsheet, XlsxIoError> {
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(v_bytes), true)
        .map_err(|err| XlsxIoError::Read(err.to_string()))?;
    debug!(
        n_bytes = v_bytes.len(),
        sheets = ?list_sheet_names(&book),
        "workbook loaded"
    );
    Ok(book)
}

/// Serialize a workbook back to XLSX bytes.
pub fn write_workbook_bytes(book: &Spreadsheet) -> Result<Vec<u8>, XlsxIoError> {
    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut cursor)
        .map_err(|err| XlsxIoError::Write(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Sheet names in workbook order.
pub fn list_sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .collect()
}

/// Borrow a sheet by exact name.
pub fn get_sheet<'a>(book: &'a Spreadsheet, sheet_name: &str) -> Result<&'a Worksheet, XlsxIoError> {
    book.get_sheet_by_name(sheet_name)
        .ok_or_else(|| derive_missing_sheet_error(book, sheet_name))
}

/// Mutably borrow a sheet by exact name.
pub fn get_sheet_mut<'a>(
    book: &'a mut Spreadsheet,
    sheet_name: &str,
) -> Result<&'a mut Worksheet, XlsxIoError> {
    if book.get_sheet_by_name(sheet_name).is_none() {
        return Err(derive_missing_sheet_error(book, sheet_name));
    }
    book.get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| XlsxIoError::MissingSheet {
            sheet: sheet_name.to_string(),
            available: String::new(),
        })
}

fn derive_missing_sheet_error(book: &Spreadsheet, sheet_name: &str) -> XlsxIoError {
    XlsxIoError::MissingSheet {
        sheet: sheet_name.to_string(),
        available: list_sheet_names(book).join(", "),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableConversion

/// Read one worksheet into a header + rows text table.
///
/// Values are the raw cell texts (dates stay Excel serial numbers).
pub fn read_sheet_table(ws: &Worksheet, options: &SpecTableReadOptions) -> SpecSheetTable {
    let n_row_max = ws.get_highest_row();
    let n_col_max = ws.get_highest_column();
    let n_row_header = options.n_row_header.max(1);

    let mut table = SpecSheetTable {
        sheet_name: ws.get_name().to_string(),
        ..Default::default()
    };
    if n_row_max < n_row_header || n_col_max == 0 {
        return table;
    }

    table.columns = (1..=n_col_max)
        .map(|n_col| {
            let c_value = ws.get_value((n_col, n_row_header));
            if options.if_trim_header {
                c_value.trim().to_string()
            } else {
                c_value
            }
        })
        .collect();

    let mut n_rows_blank = 0usize;
    for n_row in (n_row_header + 1)..=n_row_max {
        let l_row: Vec<String> = (1..=n_col_max)
            .map(|n_col| ws.get_value((n_col, n_row)))
            .collect();
        if options.if_skip_blank_rows && l_row.iter().all(|c_value| is_blank_text(c_value)) {
            n_rows_blank += 1;
            continue;
        }
        table.rows.push(l_row);
    }

    debug!(
        sheet = %table.sheet_name,
        width = table.width(),
        height = table.height(),
        rows_blank = n_rows_blank,
        "sheet table read"
    );
    table
}

/// Read the named sheet of a workbook into a text table.
pub fn read_named_table(
    book: &Spreadsheet,
    sheet_name: &str,
    options: &SpecTableReadOptions,
) -> Result<SpecSheetTable, XlsxIoError> {
    Ok(read_sheet_table(get_sheet(book, sheet_name)?, options))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn create_book() -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let ws = book.new_sheet("Dados").expect("new sheet");
        ws.get_cell_mut((1, 1)).set_value(" Número ");
        ws.get_cell_mut((2, 1)).set_value("Status");
        ws.get_cell_mut((1, 2)).set_value("CHG001");
        ws.get_cell_mut((2, 2)).set_value("Novo");
        ws.get_cell_mut((1, 4)).set_value("CHG002");
        book
    }

    #[test]
    fn test_read_sheet_table_trims_header_and_skips_blank_rows() {
        let book = create_book();
        let table = read_named_table(&book, "Dados", &SpecTableReadOptions::default())
            .expect("read table");

        assert_eq!(table.columns, vec!["Número".to_string(), "Status".to_string()]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.value(0, 1), "Novo");
        assert_eq!(table.value(1, 0), "CHG002");
        assert_eq!(table.value(1, 1), "");
    }

    #[test]
    fn test_missing_sheet_lists_available_names() {
        let book = create_book();
        let err = get_sheet(&book, "B2C").expect_err("must fail");
        let c_msg = err.to_string();
        assert!(c_msg.contains("B2C"));
        assert!(c_msg.contains("Dados"));
    }

    #[test]
    fn test_workbook_bytes_roundtrip_keeps_sheets_and_values() {
        let book = create_book();
        let v_bytes = write_workbook_bytes(&book).expect("write");
        let book_back = read_workbook_bytes(&v_bytes).expect("read");

        assert_eq!(list_sheet_names(&book_back), vec!["Dados".to_string()]);
        let ws = get_sheet(&book_back, "Dados").expect("sheet");
        assert_eq!(ws.get_value((1, 2)), "CHG001");
    }

    #[test]
    fn test_read_workbook_bytes_rejects_garbage() {
        let err = read_workbook_bytes(b"not a zip").expect_err("must fail");
        assert!(matches!(err, XlsxIoError::Read(_)));
    }
}
