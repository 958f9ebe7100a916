//! Occurrences workbook refresh from the daily incident extractions.

use opskit_io_xlsx::{
    Spreadsheet, SpecTableReadOptions, Worksheet, clear_row_values, get_sheet, get_sheet_mut,
    list_sheet_names, propagate_row_formats, read_sheet_table, read_workbook_bytes,
    write_row_values, write_workbook_bytes,
};
use tracing::info;

use crate::error::ReportError;
use crate::spec::{SpecOccurrencesConfig, SpecOccurrencesOutput, SpecOccurrencesPair, SpecSheetRefresh};
use crate::util::join_texts;

/// Replace the data rows of the base workbook's incident tabs with the extractions.
///
/// The functional tab is fed from `v_functional`, the critical tab from
/// `v_critical`. Template formatting is kept; rows beyond the formatted part
/// inherit the last formatted row's style.
pub fn update_occurrences(
    v_base: &[u8],
    v_functional: &[u8],
    v_critical: &[u8],
    cfg: &SpecOccurrencesConfig,
) -> Result<SpecOccurrencesOutput, ReportError> {
    let mut book_base = read_workbook_bytes(v_base)?;
    let book_functional = read_workbook_bytes(v_functional)?;
    let book_critical = read_workbook_bytes(v_critical)?;

    let functional = refresh_pair(&mut book_base, &book_functional, &cfg.functional, cfg.if_infer_numeric)?;
    let critical = refresh_pair(&mut book_base, &book_critical, &cfg.critical, cfg.if_infer_numeric)?;

    let bytes = write_workbook_bytes(&book_base)?;
    let n_records = functional.n_records + critical.n_records;
    info!(
        functional = functional.n_records,
        critical = critical.n_records,
        "occurrences refreshed"
    );
    Ok(SpecOccurrencesOutput {
        bytes,
        n_records,
        functional,
        critical,
    })
}

fn refresh_pair(
    book_base: &mut Spreadsheet,
    book_extraction: &Spreadsheet,
    pair: &SpecOccurrencesPair,
    if_infer_numeric: bool,
) -> Result<SpecSheetRefresh, ReportError> {
    let c_extraction = resolve_extraction_sheet(book_extraction, &pair.sheets_extraction)?;
    let options = SpecTableReadOptions {
        if_skip_blank_rows: false,
        ..Default::default()
    };
    let table = read_sheet_table(get_sheet(book_extraction, &c_extraction)?, &options);

    let ws_base = get_sheet_mut(book_base, &pair.sheet_base)?;
    let mut refresh = refresh_sheet(ws_base, &table.rows, if_infer_numeric)?;
    refresh.sheet_base = pair.sheet_base.clone();
    refresh.sheet_extraction = c_extraction;
    info!(
        sheet = %refresh.sheet_base,
        extraction = %refresh.sheet_extraction,
        rows = refresh.n_records,
        "sheet refreshed"
    );
    Ok(refresh)
}

/// First candidate present in the extraction workbook.
fn resolve_extraction_sheet(book: &Spreadsheet, candidates: &[String]) -> Result<String, ReportError> {
    candidates
        .iter()
        .find(|c_name| book.get_sheet_by_name(c_name).is_some())
        .cloned()
        .ok_or_else(|| ReportError::MissingSheet {
            sheet: join_texts(candidates),
            available: join_texts(&list_sheet_names(book)),
        })
}

/// Clear rows `2..` of a template sheet and write `rows` from row 2.
pub fn refresh_sheet(
    ws: &mut Worksheet,
    rows: &[Vec<String>],
    if_infer_numeric: bool,
) -> Result<SpecSheetRefresh, ReportError> {
    let row_template_last = ws.get_highest_row();
    let n_cols_template = ws.get_highest_column();
    let n_cols_data = rows.iter().map(Vec::len).max().unwrap_or(0);
    let n_cols = n_cols_template.max(u32::try_from(n_cols_data).unwrap_or(u32::MAX));

    let mut refresh = SpecSheetRefresh {
        row_template_last,
        n_records: rows.len(),
        ..Default::default()
    };
    refresh.cnt_cells_cleared = clear_row_values(ws, 2, row_template_last, n_cols_template);

    let row_target_last = u32::try_from(rows.len())
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    refresh.propagation = propagate_row_formats(ws, row_template_last, row_target_last, n_cols);

    for (n_row, row) in (2u32..).zip(rows.iter()) {
        write_row_values(ws, n_row, row, if_infer_numeric)?;
    }
    Ok(refresh)
}
