//! In-place edits on hand-formatted template sheets.
//!
//! Row/column indices are 1-based, matching worksheet coordinates.

use tracing::debug;
use umya_spreadsheet::Worksheet;

use crate::error::XlsxIoError;
use crate::spec::{EnumCellValue, SpecRowFormatPropagation};
use crate::util::{convert_text_to_cell_value, is_blank_text};

////////////////////////////////////////////////////////////////////////////////
// #region RowLookup

/// Highest row whose first column is non-blank, scanning upward from the
/// sheet's reported last row. `0` when column 1 is blank everywhere.
pub fn find_last_populated_row(ws: &Worksheet) -> u32 {
    let mut n_row = ws.get_highest_row();
    while n_row > 0 && is_blank_text(&ws.get_value((1, n_row))) {
        n_row -= 1;
    }
    n_row
}

/// Header cells of row `n_row_header`, untrimmed, one per used column.
pub fn read_header_row(ws: &Worksheet, n_row_header: u32) -> Vec<String> {
    (1..=ws.get_highest_column())
        .map(|n_col| ws.get_value((n_col, n_row_header)))
        .collect()
}

/// Texts of one row across `n_cols` columns.
pub fn read_row_values(ws: &Worksheet, n_row: u32, n_cols: u32) -> Vec<String> {
    (1..=n_cols).map(|n_col| ws.get_value((n_col, n_row))).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatPropagation

/// Extend the template's style below its last formatted row.
///
/// Each row in `row_template_last + 1 ..= row_target_last` receives the font,
/// borders, fill and number format of the row directly above it, so the style
/// of `row_template_last` is carried down the whole range. Rows at or above
/// `row_template_last` are never touched.
pub fn propagate_row_formats(
    ws: &mut Worksheet,
    row_template_last: u32,
    row_target_last: u32,
    n_cols: u32,
) -> SpecRowFormatPropagation {
    let mut report = SpecRowFormatPropagation::default();
    if row_template_last == 0 || row_target_last <= row_template_last || n_cols == 0 {
        return report;
    }

    for n_row in (row_template_last + 1)..=row_target_last {
        for n_col in 1..=n_cols {
            copy_cell_format(ws, (n_col, n_row - 1), (n_col, n_row));
            report.cnt_cells += 1;
        }
        report.row_first.get_or_insert(n_row);
        report.row_last = Some(n_row);
    }

    debug!(
        row_template_last,
        row_target_last,
        cells = report.cnt_cells,
        "row formats propagated"
    );
    report
}

/// Copy font/borders/fill/number format from `src` to `dst`; other style parts of `dst` stay.
pub fn copy_cell_format(ws: &mut Worksheet, src: (u32, u32), dst: (u32, u32)) {
    let style_src = ws.get_style(src).clone();
    let style_dst = ws.get_style_mut(dst);

    if let Some(font) = style_src.get_font() {
        style_dst.set_font(font.clone());
    }
    if let Some(borders) = style_src.get_borders() {
        style_dst.set_borders(borders.clone());
    }
    if let Some(fill) = style_src.get_fill() {
        style_dst.set_fill(fill.clone());
    }
    if let Some(number_format) = style_src.get_number_format() {
        style_dst.set_number_format(number_format.clone());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueWrites

/// Write `values` into row `n_row` from column 1. Blank values leave the cell untouched.
///
/// With `if_infer_numeric`, numeric-looking text is stored as a number so the
/// template's number format (dates, durations) applies to it.
/// Returns the number of non-blank cells written.
pub fn write_row_values(
    ws: &mut Worksheet,
    n_row: u32,
    values: &[String],
    if_infer_numeric: bool,
) -> Result<u64, XlsxIoError> {
    let mut cnt_written = 0u64;
    for (n_idx_col, c_value) in values.iter().enumerate() {
        let n_col = cast_col_num(n_idx_col + 1)?;
        match convert_text_to_cell_value(c_value, if_infer_numeric) {
            EnumCellValue::None => continue,
            EnumCellValue::Number(n_value) => {
                ws.get_cell_mut((n_col, n_row)).set_value_number(n_value);
            }
            EnumCellValue::String(c_text) => {
                ws.get_cell_mut((n_col, n_row)).set_value(c_text);
            }
        }
        cnt_written += 1;
    }
    Ok(cnt_written)
}

/// Blank every existing cell value in `row_first..=row_last`, keeping cell styles.
pub fn clear_row_values(ws: &mut Worksheet, row_first: u32, row_last: u32, n_cols: u32) -> u64 {
    let mut cnt_cleared = 0u64;
    if row_first == 0 || row_last < row_first {
        return cnt_cleared;
    }
    for n_row in row_first..=row_last {
        for n_col in 1..=n_cols {
            if ws.get_cell((n_col, n_row)).is_none() {
                continue;
            }
            ws.get_cell_mut((n_col, n_row)).set_value("");
            cnt_cleared += 1;
        }
    }
    cnt_cleared
}

/// Solid background fill with an ARGB color (e.g. `FFC6EFCE`).
pub fn set_cell_fill(ws: &mut Worksheet, cell: (u32, u32), argb: &str) {
    ws.get_style_mut(cell).set_background_color(argb);
}

/// ARGB of a cell's solid background, if any.
pub fn read_cell_fill_argb(ws: &Worksheet, cell: (u32, u32)) -> Option<String> {
    ws.get_style(cell)
        .get_background_color()
        .map(|color| color.get_argb().to_string())
}

fn cast_col_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .ok()
        .filter(|n_col| (*n_col as usize) <= crate::conf::N_NCOLS_EXCEL_MAX)
        .ok_or_else(|| XlsxIoError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use umya_spreadsheet::Spreadsheet;

    fn create_template() -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let ws = book.new_sheet("B2C").expect("new sheet");
        for (n_col, c_name) in ["Data", "Frente", "Status"].iter().enumerate() {
            ws.get_cell_mut((n_col as u32 + 1, 1)).set_value(*c_name);
        }
        for n_row in 2..=3u32 {
            ws.get_cell_mut((1, n_row)).set_value(format!("0{n_row}/05/2024"));
            ws.get_cell_mut((3, n_row)).set_value("Passed");
            for n_col in 1..=3u32 {
                let style = ws.get_style_mut((n_col, n_row));
                style.get_font_mut().set_bold(true);
                style.get_number_format_mut().set_format_code("@");
            }
        }
        ws.get_style_mut((2, 3)).set_background_color("FFDDEBF7");
        book
    }

    fn derive_format_fingerprint(ws: &Worksheet, cell: (u32, u32)) -> String {
        let style = ws.get_style(cell);
        format!(
            "{:?}|{:?}|{:?}|{:?}",
            style.get_font(),
            style.get_borders(),
            style.get_fill(),
            style.get_number_format()
        )
    }

    #[test]
    fn test_find_last_populated_row_ignores_trailing_blank_rows() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");
        ws.get_cell_mut((2, 7)).set_value("stray");
        ws.get_cell_mut((1, 6)).set_value("   ");

        assert_eq!(find_last_populated_row(ws), 3);
    }

    #[test]
    fn test_find_last_populated_row_empty_sheet_is_zero() {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let ws = book.new_sheet("Vazia").expect("new sheet");
        assert_eq!(find_last_populated_row(ws), 0);
    }

    #[test]
    fn test_propagate_row_formats_copies_last_template_row() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");

        let report = propagate_row_formats(ws, 3, 6, 3);
        assert_eq!(report.row_first, Some(4));
        assert_eq!(report.row_last, Some(6));
        assert_eq!(report.cnt_cells, 9);

        for n_row in 4..=6u32 {
            for n_col in 1..=3u32 {
                assert_eq!(
                    derive_format_fingerprint(ws, (n_col, n_row)),
                    derive_format_fingerprint(ws, (n_col, 3)),
                    "row {n_row} col {n_col}"
                );
            }
        }
        assert_eq!(
            read_cell_fill_argb(ws, (2, 6)).as_deref(),
            Some("FFDDEBF7")
        );
        assert_eq!(ws.get_value((1, 4)), "");
    }

    #[test]
    fn test_propagate_row_formats_noop_within_template() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");
        let report = propagate_row_formats(ws, 3, 3, 3);
        assert_eq!(report, SpecRowFormatPropagation::default());
    }

    #[test]
    fn test_write_and_clear_row_values() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");

        let values = vec!["10/05/2024".to_string(), String::new(), "Failed".to_string()];
        let cnt = write_row_values(ws, 4, &values, false).expect("write row");
        assert_eq!(cnt, 2);
        assert_eq!(read_row_values(ws, 4, 3), values);

        let fingerprint_before = derive_format_fingerprint(ws, (1, 2));
        let cnt_cleared = clear_row_values(ws, 2, 4, 3);
        assert!(cnt_cleared >= 6);
        assert_eq!(find_last_populated_row(ws), 1);
        assert_eq!(derive_format_fingerprint(ws, (1, 2)), fingerprint_before);
    }

    #[test]
    fn test_write_row_values_infers_numbers() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");

        let values = vec!["45432.5".to_string(), "INC123".to_string()];
        write_row_values(ws, 5, &values, true).expect("write row");
        assert_eq!(ws.get_value((1, 5)), "45432.5");
        assert_eq!(ws.get_value((2, 5)), "INC123");
    }

    #[test]
    fn test_set_cell_fill_overrides_background() {
        let mut book = create_template();
        let ws = book.get_sheet_by_name_mut("B2C").expect("sheet");
        set_cell_fill(ws, (3, 2), "FFFFC7CE");
        assert_eq!(read_cell_fill_argb(ws, (3, 2)).as_deref(), Some("FFFFC7CE"));
        assert_eq!(read_header_row(ws, 1), vec!["Data", "Frente", "Status"]);
    }
}
