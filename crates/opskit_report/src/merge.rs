//! Test-result merge: notebook sheets -> daily tracking `B2C` sheet.

use std::collections::{BTreeMap, BTreeSet};

use opskit_io_xlsx::{
    Spreadsheet, SpecTableReadOptions, get_sheet_mut, list_sheet_names, read_header_row, read_sheet_table,
    read_workbook_bytes, write_workbook_bytes,
};
use tracing::{error, info, warn};

use crate::append::append_canonical_rows;
use crate::columns::{project_row, reconcile_columns};
use crate::error::ReportError;
use crate::spec::{
    EnumSheetRead, EnumStatusLabel, EnumStatusOutcome, SpecCanonicalRow, SpecMergeConfig,
    SpecMergeOutput, SpecMergeReport, SpecSheetMergeStat,
};
use crate::status::{is_excluded_status, normalize_status};
use crate::util::{derive_today_local, format_date, join_texts, parse_date_ddmmyyyy};

////////////////////////////////////////////////////////////////////////////////
// #region Orchestrator

/// Merge the notebook's test rows into the daily tracking workbook.
///
/// `date` (`DD/MM/YYYY`) is stamped on every appended row; `None` stamps today
/// in `America/Sao_Paulo`. Any failure aborts the whole merge and no bytes are
/// returned.
pub fn process_tests(
    v_notebook: &[u8],
    v_daily: &[u8],
    date: Option<&str>,
    cfg: &SpecMergeConfig,
) -> Result<SpecMergeOutput, ReportError> {
    let c_date = derive_stamp_date(date)?;
    info!(date = %c_date, sheets = ?cfg.sheets_source, "test merge started");

    let book_notebook = read_workbook_bytes(v_notebook)?;
    let mut report = SpecMergeReport {
        date: c_date.clone(),
        ..Default::default()
    };

    // Read + reconcile
    let mut set_used: BTreeSet<String> = BTreeSet::new();
    let mut n_sheets_read = 0usize;
    let mut n_sheets_with_status = 0usize;
    let mut l_pending: Vec<(usize, String, BTreeMap<String, String>)> = Vec::new();

    for c_requested in &cfg.sheets_source {
        let mut stat = SpecSheetMergeStat {
            sheet_requested: c_requested.clone(),
            ..Default::default()
        };
        let table = match read_source_sheet(&book_notebook, c_requested, cfg, &mut set_used) {
            EnumSheetRead::Loaded(table) => table,
            EnumSheetRead::Skipped(c_reason) => {
                warn!(sheet = %c_requested, reason = %c_reason, "notebook sheet skipped");
                report.warn(format!("sheet {c_requested:?} skipped: {c_reason}"));
                stat.reason_skipped = Some(c_reason);
                report.sheets.push(stat);
                continue;
            }
        };
        n_sheets_read += 1;
        stat.sheet_used = Some(table.sheet_name.clone());
        stat.n_rows_read = table.height();

        let schema = reconcile_columns(&table.columns, &cfg.rules_columns, &cfg.col_status);
        for c_warning in &schema.warnings {
            report.warn(format!("sheet {:?}: {c_warning}", table.sheet_name));
        }
        let Some(n_idx_status) = schema.idx_status else {
            let c_reason = format!("no column maps to {:?}", cfg.col_status);
            warn!(sheet = %table.sheet_name, columns = ?table.columns, "no status column recognized");
            report.warn(format!("sheet {:?} skipped: {c_reason}", table.sheet_name));
            stat.reason_skipped = Some(c_reason);
            report.sheets.push(stat);
            continue;
        };
        n_sheets_with_status += 1;
        info!(
            sheet = %table.sheet_name,
            rows = table.height(),
            status_column = %schema.columns_source[n_idx_status],
            "notebook sheet read"
        );

        let n_idx_stat = report.sheets.len();
        for row in &table.rows {
            let c_status_raw = row.get(n_idx_status).cloned().unwrap_or_default();
            l_pending.push((n_idx_stat, c_status_raw, project_row(&schema, row)));
        }
        report.sheets.push(stat);
    }

    if n_sheets_read == 0 {
        let c_requested = join_texts(&cfg.sheets_source);
        error!(requested = %c_requested, "no readable notebook sheet");
        return Err(ReportError::NoReadableSheet {
            requested: c_requested,
        });
    }
    if n_sheets_with_status == 0 {
        error!(column = %cfg.col_status, "no status column in any notebook sheet");
        return Err(ReportError::MissingStatusColumn {
            column: cfg.col_status.clone(),
        });
    }

    // Normalize + filter: exclusion before inclusion
    let mut l_rows: Vec<SpecCanonicalRow> = Vec::new();
    for (n_idx_stat, c_status_raw, mut fields) in l_pending {
        let outcome = normalize_status(&c_status_raw, &cfg.rules_status);
        let c_normalized = outcome.as_text().to_string();
        if !report.statuses_seen.contains(&c_normalized) {
            report.statuses_seen.push(c_normalized.clone());
        }
        if is_excluded_status(&c_normalized, &cfg.rules_status) {
            report.n_rows_excluded += 1;
            continue;
        }
        let EnumStatusOutcome::Canonical(label) = outcome else {
            report.n_rows_unrecognized += 1;
            continue;
        };
        fields.insert(cfg.col_status.clone(), label.as_str().to_string());
        fields.insert(cfg.col_date.clone(), c_date.clone());
        if let Some(stat) = report.sheets.get_mut(n_idx_stat) {
            stat.n_rows_kept += 1;
        }
        l_rows.push(SpecCanonicalRow {
            status: label,
            fields,
        });
    }
    info!(
        kept = l_rows.len(),
        excluded = report.n_rows_excluded,
        unrecognized = report.n_rows_unrecognized,
        statuses = ?report.statuses_seen,
        "statuses normalized"
    );
    if report.n_rows_excluded + report.n_rows_unrecognized > 0 {
        warn!(
            excluded = report.n_rows_excluded,
            unrecognized = report.n_rows_unrecognized,
            "rows dropped by status filter"
        );
    }

    if l_rows.is_empty() {
        let l_accepted: Vec<&str> = EnumStatusLabel::ALL.iter().map(|label| label.as_str()).collect();
        error!(statuses = ?report.statuses_seen, "no valid test rows");
        return Err(ReportError::NoValidRows {
            accepted: join_texts(&l_accepted),
            found: join_texts(&report.statuses_seen),
        });
    }

    // Write
    let mut book_daily = read_workbook_bytes(v_daily)?;
    if book_daily.get_sheet_by_name(&cfg.sheet_destination).is_none() {
        let c_available = join_texts(&list_sheet_names(&book_daily));
        error!(sheet = %cfg.sheet_destination, available = %c_available, "destination sheet missing");
        return Err(ReportError::MissingDestinationSheet {
            sheet: cfg.sheet_destination.clone(),
            available: c_available,
        });
    }
    let ws = get_sheet_mut(&mut book_daily, &cfg.sheet_destination)?;
    let header: Vec<String> = read_header_row(ws, cfg.n_row_header)
        .iter()
        .map(|c_name| c_name.trim().to_string())
        .collect();
    if !header.iter().any(|c_name| c_name == &cfg.col_date) {
        report.warn(format!(
            "destination header has no {:?} column; date not written",
            cfg.col_date
        ));
    }
    report.append = append_canonical_rows(ws, &header, &l_rows, &cfg.col_status, &cfg.colors_status)?;

    let bytes = write_workbook_bytes(&book_daily)?;
    info!(rows = l_rows.len(), n_bytes = bytes.len(), "test merge finished");
    Ok(SpecMergeOutput {
        bytes,
        n_rows_appended: l_rows.len(),
        report,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetRead

/// Read one requested notebook sheet, falling back to the workbook's first sheet.
///
/// A sheet already consumed by this merge is never read again.
pub fn read_source_sheet(
    book: &Spreadsheet,
    sheet_name: &str,
    cfg: &SpecMergeConfig,
    set_used: &mut BTreeSet<String>,
) -> EnumSheetRead {
    let options = SpecTableReadOptions::default();
    let c_target = if book.get_sheet_by_name(sheet_name).is_some() {
        sheet_name.to_string()
    } else {
        let l_available = list_sheet_names(book);
        warn!(sheet = sheet_name, available = ?l_available, "notebook sheet not found");
        if !cfg.if_fallback_first_sheet {
            return EnumSheetRead::Skipped("sheet not found".to_string());
        }
        let Some(c_first) = l_available.into_iter().next() else {
            return EnumSheetRead::Skipped("workbook has no sheets".to_string());
        };
        info!(sheet = sheet_name, fallback = %c_first, "using first sheet instead");
        c_first
    };

    if set_used.contains(&c_target) {
        return EnumSheetRead::Skipped(format!("sheet {c_target:?} already read"));
    }
    match book.get_sheet_by_name(&c_target) {
        Some(ws) => {
            set_used.insert(c_target);
            EnumSheetRead::Loaded(read_sheet_table(ws, &options))
        }
        None => EnumSheetRead::Skipped("sheet not found".to_string()),
    }
}

/// Stamp text: the validated caller date, else today in `America/Sao_Paulo`.
pub fn derive_stamp_date(date: Option<&str>) -> Result<String, ReportError> {
    match date {
        Some(c_date) if !c_date.trim().is_empty() => {
            parse_date_ddmmyyyy(c_date).map(format_date)
        }
        _ => Ok(format_date(derive_today_local())),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn create_notebook(sheets: &[(&str, &[&[&str]])]) -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for (c_sheet, rows) in sheets {
            let ws = book.new_sheet(*c_sheet).expect("new sheet");
            for (n_row, row) in rows.iter().enumerate() {
                for (n_col, c_value) in row.iter().enumerate() {
                    ws.get_cell_mut((n_col as u32 + 1, n_row as u32 + 1))
                        .set_value(*c_value);
                }
            }
        }
        book
    }

    #[test]
    fn test_read_source_sheet_prefers_named_sheet() {
        let book = create_notebook(&[
            ("Outra", &[&["Status"], &["Passed"]]),
            ("Caderno App Vivo", &[&["Status"], &["Failed"], &["Passed"]]),
        ]);
        let mut set_used = BTreeSet::new();
        let EnumSheetRead::Loaded(table) =
            read_source_sheet(&book, "Caderno App Vivo", &SpecMergeConfig::default(), &mut set_used)
        else {
            panic!("sheet must load");
        };
        assert_eq!(table.sheet_name, "Caderno App Vivo");
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_read_source_sheet_fallback_is_read_once() {
        let book = create_notebook(&[("Planilha1", &[&["Status"], &["Passed"]])]);
        let cfg = SpecMergeConfig::default();
        let mut set_used = BTreeSet::new();

        let first = read_source_sheet(&book, "Caderno App Vivo", &cfg, &mut set_used);
        assert!(matches!(first, EnumSheetRead::Loaded(ref t) if t.sheet_name == "Planilha1"));
        let second = read_source_sheet(&book, "Caderno Web B2C", &cfg, &mut set_used);
        assert!(matches!(second, EnumSheetRead::Skipped(ref c) if c.contains("already read")));
    }

    #[test]
    fn test_read_source_sheet_without_fallback() {
        let book = create_notebook(&[("Planilha1", &[&["Status"]])]);
        let cfg = SpecMergeConfig {
            if_fallback_first_sheet: false,
            ..Default::default()
        };
        let outcome = read_source_sheet(&book, "Caderno App Vivo", &cfg, &mut BTreeSet::new());
        assert_eq!(outcome, EnumSheetRead::Skipped("sheet not found".to_string()));
    }

    #[test]
    fn test_derive_stamp_date() {
        assert_eq!(derive_stamp_date(Some("7/5/2024")).expect("date"), "07/05/2024");
        assert!(matches!(
            derive_stamp_date(Some("2024-05-07")),
            Err(ReportError::InvalidDate { .. })
        ));
        let c_today = derive_stamp_date(None).expect("today");
        assert_eq!(c_today.len(), 10);
        assert_eq!(derive_stamp_date(Some("  ")).expect("blank"), c_today);
    }

    #[test]
    fn test_invalid_date_fails_before_reading_workbooks() {
        let err = process_tests(b"junk", b"junk", Some("32/01/2024"), &SpecMergeConfig::default())
            .expect_err("must fail");
        assert!(matches!(err, ReportError::InvalidDate { .. }));
    }
}
