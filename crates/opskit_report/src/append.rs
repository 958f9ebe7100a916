//! Row appender: canonical rows -> destination template sheet.

use opskit_io_xlsx::{
    Worksheet, clear_row_values, find_last_populated_row, propagate_row_formats, set_cell_fill,
    write_row_values,
};
use tracing::{debug, info};

use crate::error::ReportError;
use crate::spec::{SpecAppendReport, SpecCanonicalRow, SpecStatusColors};

/// Append `rows` below the last populated row of `ws`.
///
/// Values follow the order of `header`. Every header cell of a new row is
/// overwritten, so unmapped or blank fields leave the cell empty even when
/// stray content sat below the last populated row. When the rows run past the formatted part of the template, the last
/// formatted row's style is carried down first. The cell under the header named
/// `col_status` then gets the fill of its label.
pub fn append_canonical_rows(
    ws: &mut Worksheet,
    header: &[String],
    rows: &[SpecCanonicalRow],
    col_status: &str,
    colors: &SpecStatusColors,
) -> Result<SpecAppendReport, ReportError> {
    let row_last_before = find_last_populated_row(ws);
    let mut report = SpecAppendReport {
        row_last_before,
        ..Default::default()
    };
    if rows.is_empty() {
        return Ok(report);
    }

    let n_cols = u32::try_from(header.len()).unwrap_or(u32::MAX);
    let n_rows_new = u32::try_from(rows.len()).unwrap_or(u32::MAX);
    let row_target_last = row_last_before.saturating_add(n_rows_new);
    let row_template_last = ws.get_highest_row().max(row_last_before);
    report.propagation = propagate_row_formats(ws, row_template_last, row_target_last, n_cols);
    clear_row_values(ws, row_last_before + 1, row_target_last, n_cols);

    let idx_status = header.iter().position(|c_name| c_name.trim() == col_status);
    for (n_offset, row) in (1u32..).zip(rows.iter()) {
        let n_row = row_last_before + n_offset;
        let l_values: Vec<String> = header
            .iter()
            .map(|c_name| row.value(c_name.trim()).to_string())
            .collect();
        report.cnt_cells += write_row_values(ws, n_row, &l_values, false)?;

        if let Some(n_idx) = idx_status
            && let Some(c_argb) = colors.argb_for(row.status)
        {
            let n_col = u32::try_from(n_idx + 1).unwrap_or(u32::MAX);
            set_cell_fill(ws, (n_col, n_row), c_argb);
            report.cnt_fills += 1;
        }
        report.row_first.get_or_insert(n_row);
        report.row_last = Some(n_row);
    }

    if idx_status.is_none() {
        debug!(column = col_status, "destination header has no status column; fills skipped");
    }
    info!(
        row_last_before,
        rows = rows.len(),
        cells = report.cnt_cells,
        fills = report.cnt_fills,
        propagated = report.propagation.cnt_cells,
        "rows appended"
    );
    Ok(report)
}
