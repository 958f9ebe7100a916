//! CHG digest: evening/overnight change requests rendered as a Keep message.

use chrono::{Days, NaiveDate, Timelike};
use opskit_io_xlsx::{
    Spreadsheet, SpecSheetTable, SpecTableReadOptions, list_sheet_names, read_sheet_table,
    read_workbook_bytes,
};
use tracing::{info, warn};

use crate::conf::{C_FMT_DATETIME, C_MSG_NO_CHG, TUP_COLUMNS_CHG};
use crate::error::ReportError;
use crate::spec::{SpecChgRecord, SpecChgReport, SpecChgReportConfig, SpecChgSheetRead};
use crate::util::{derive_today_local, join_texts, parse_sheet_datetime};

const C_CHG_HEADING: &str =
    "💻 *REPORT STATUS CHGs – QD APPs* 💻  \n\nSegue CHGs que serão executadas: \n\n";
const C_CHG_LEGEND: &str = "*Legenda:*\n⚠️ Ponto de Atenção\n📵 CHG com Indisponibilidade\n👍 Sem Indisponibilidade \n\n\n QD Spread";
const C_MARK_UNAVAILABLE: &str = "📵 ";
const C_MARK_AVAILABLE: &str = "👍 ";

////////////////////////////////////////////////////////////////////////////////
// #region Read

/// Read and concatenate the CHG sheets of a workbook.
///
/// A missing sheet is skipped with a warning unless every sheet is missing.
/// Rows whose planned start or end cannot be parsed are dropped and counted.
pub fn read_chg_records(
    book: &Spreadsheet,
    cfg: &SpecChgReportConfig,
) -> Result<SpecChgSheetRead, ReportError> {
    let mut read = SpecChgSheetRead::default();
    let mut n_sheets_found = 0usize;

    for c_sheet in &cfg.sheets {
        let Some(ws) = book.get_sheet_by_name(c_sheet) else {
            warn!(sheet = %c_sheet, "CHG sheet not found");
            read.warnings.push(format!("sheet {c_sheet:?} not found"));
            continue;
        };
        n_sheets_found += 1;
        let table = read_sheet_table(ws, &SpecTableReadOptions::default());
        read_table_records(&table, &mut read)?;
    }

    if n_sheets_found == 0 {
        return Err(ReportError::MissingSheet {
            sheet: join_texts(&cfg.sheets),
            available: join_texts(&list_sheet_names(book)),
        });
    }
    if read.n_rows_bad_date > 0 {
        warn!(rows = read.n_rows_bad_date, "CHG rows with unparseable planned dates dropped");
        read.warnings.push(format!(
            "{} rows dropped for unparseable planned dates",
            read.n_rows_bad_date
        ));
    }
    Ok(read)
}

fn read_table_records(table: &SpecSheetTable, read: &mut SpecChgSheetRead) -> Result<(), ReportError> {
    let mut l_idx = [0usize; TUP_COLUMNS_CHG.len()];
    for (n_slot, c_column) in TUP_COLUMNS_CHG.iter().enumerate() {
        l_idx[n_slot] = table
            .position(c_column)
            .ok_or_else(|| ReportError::MissingColumn {
                sheet: table.sheet_name.clone(),
                column: c_column.to_string(),
            })?;
    }
    let [
        n_number,
        n_description,
        n_status,
        n_unavailability,
        n_start,
        n_end,
        n_ci,
        n_group,
        n_observation,
        n_send,
    ] = l_idx;

    for n_row in 0..table.height() {
        read.n_rows_read += 1;
        let cell = |n_col: usize| table.value(n_row, n_col).trim().to_string();
        let (Some(start), Some(end)) = (
            parse_sheet_datetime(table.value(n_row, n_start)),
            parse_sheet_datetime(table.value(n_row, n_end)),
        ) else {
            read.n_rows_bad_date += 1;
            continue;
        };
        read.records.push(SpecChgRecord {
            number: cell(n_number),
            description: cell(n_description),
            status: cell(n_status),
            unavailability: cell(n_unavailability),
            start,
            end,
            ci_impacted: cell(n_ci),
            assignment_group: cell(n_group),
            observation: cell(n_observation),
            send: cell(n_send),
        });
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Window

/// Keep CHGs flagged for broadcast that start this evening or early tomorrow.
///
/// Evening: on `today` at or after `n_hour_today_from`. Early tomorrow: on
/// `today + 1` before `n_hour_tomorrow_until`.
pub fn select_chg_window(
    records: &[SpecChgRecord],
    today: NaiveDate,
    cfg: &SpecChgReportConfig,
) -> Vec<SpecChgRecord> {
    let tomorrow = today.checked_add_days(Days::new(1));
    let c_flag = cfg.send_flag.trim().to_lowercase();
    records
        .iter()
        .filter(|rec| rec.send.trim().to_lowercase() == c_flag)
        .filter(|rec| {
            let date_start = rec.start.date();
            let n_hour = rec.start.hour();
            (date_start == today && n_hour >= cfg.n_hour_today_from)
                || (Some(date_start) == tomorrow && n_hour < cfg.n_hour_tomorrow_until)
        })
        .cloned()
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Render

/// Keep message for the selected CHGs.
pub fn render_chg_report(records: &[SpecChgRecord]) -> String {
    if records.is_empty() {
        return C_MSG_NO_CHG.to_string();
    }
    let mut c_out = String::from(C_CHG_HEADING);
    for rec in records {
        c_out.push_str(&format!(
            "*Mudança:* {}\n*✏ Descrição:* {}\n*Tipo de Indisponibilidade:* {}{}\n*IC Impactado:* {}\n*Grupo de atribuição:* {}\n*Início:* {}\n*Término:* {}\n*Observação:* {}\n\n",
            rec.number,
            rec.description,
            derive_availability_mark(&rec.unavailability),
            rec.unavailability,
            rec.ci_impacted,
            rec.assignment_group,
            rec.start.format(C_FMT_DATETIME),
            rec.end.format(C_FMT_DATETIME),
            rec.observation,
        ));
    }
    c_out.push_str(C_CHG_LEGEND);
    c_out
}

fn derive_availability_mark(unavailability: &str) -> &'static str {
    let c_lower = unavailability.to_lowercase();
    if c_lower.contains("indisponibilidade parcial") || c_lower.contains("indisponibilidade total") {
        C_MARK_UNAVAILABLE
    } else {
        C_MARK_AVAILABLE
    }
}

/// Read the CHG workbook, select the window around `reference_date` (default: today) and render.
pub fn generate_chg_report(
    v_bytes: &[u8],
    reference_date: Option<NaiveDate>,
    cfg: &SpecChgReportConfig,
) -> Result<SpecChgReport, ReportError> {
    let today = reference_date.unwrap_or_else(derive_today_local);
    let book = read_workbook_bytes(v_bytes)?;
    let read = read_chg_records(&book, cfg)?;
    let l_selected = select_chg_window(&read.records, today, cfg);
    info!(
        reference_date = %today,
        rows = read.n_rows_read,
        selected = l_selected.len(),
        "CHG window selected"
    );
    Ok(SpecChgReport {
        text: render_chg_report(&l_selected),
        reference_date: today,
        n_selected: l_selected.len(),
        n_rows_read: read.n_rows_read,
        n_rows_bad_date: read.n_rows_bad_date,
        warnings: read.warnings,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
