//! CHG reconciliation: principal CHG table vs the table extracted from the e-mail.

use std::collections::BTreeSet;

use opskit_io_xlsx::util::is_blank_text;
use opskit_io_xlsx::{
    SpecSheetTable, SpecTableReadOptions, SpecXlsxReport, XlsxWriter, list_sheet_names,
    read_sheet_table, read_workbook_bytes,
};
use tracing::{info, warn};

use crate::conf::C_COL_CHG_NUMBER;
use crate::error::ReportError;
use crate::spec::SpecChgComparison;
use crate::util::{clean_digits, contains_ignore_case};

/// Output sheet names: new, missing, common.
pub const TUP_SHEETS_COMPARISON: [&str; 3] = ["CHGs novas", "CHGs faltantes", "CHGs comuns"];

////////////////////////////////////////////////////////////////////////////////
// #region EmailTable

/// Merge the e-mail extraction sheets into one table.
///
/// Every sheet is read raw (its first row is data until proven a header).
/// Fully empty columns are dropped. A first row with a cell containing
/// `Número` becomes the header; a headerless sheet of the same width continues
/// the last header seen. Columns are unioned by name, in first-seen order.
pub fn assemble_email_table(raw_tables: &[Vec<Vec<String>>], warnings: &mut Vec<String>) -> SpecSheetTable {
    let mut l_parts: Vec<(Vec<String>, Vec<Vec<String>>)> = Vec::new();
    let mut header_last: Option<Vec<String>> = None;

    for (n_idx_table, raw) in raw_tables.iter().enumerate() {
        let raw = drop_empty_columns(raw);
        let Some(row_first) = raw.first() else {
            continue;
        };
        if row_first.is_empty() {
            continue;
        }

        if row_first.iter().any(|c_cell| contains_ignore_case(c_cell, C_COL_CHG_NUMBER)) {
            let header = derive_email_header(row_first);
            header_last = Some(header.clone());
            l_parts.push((header, raw[1..].to_vec()));
        } else if let Some(header) = header_last.as_ref().filter(|h| h.len() == row_first.len()) {
            l_parts.push((header.clone(), raw));
        } else {
            warn!(table = n_idx_table, "e-mail table without a recognizable header");
            warnings.push(format!(
                "e-mail table {} has no {C_COL_CHG_NUMBER:?} header; its rows cannot be matched",
                n_idx_table + 1
            ));
            let header = (1..=row_first.len()).map(|n| format!("Coluna {n}")).collect();
            l_parts.push((header, raw));
        }
    }

    let mut table = SpecSheetTable {
        sheet_name: "email".to_string(),
        ..Default::default()
    };
    for (header, _) in &l_parts {
        for c_name in header {
            if !table.columns.contains(c_name) {
                table.columns.push(c_name.clone());
            }
        }
    }
    for (header, rows) in l_parts {
        let l_positions: Vec<usize> = header
            .iter()
            .filter_map(|c_name| table.position(c_name))
            .collect();
        for row in rows {
            let mut l_out = vec![String::new(); table.width()];
            for (n_idx_src, n_idx_dst) in l_positions.iter().enumerate() {
                if let Some(c_value) = row.get(n_idx_src) {
                    l_out[*n_idx_dst] = c_value.clone();
                }
            }
            table.rows.push(l_out);
        }
    }
    table
}

fn drop_empty_columns(raw: &[Vec<String>]) -> Vec<Vec<String>> {
    let n_width = raw.iter().map(Vec::len).max().unwrap_or(0);
    let l_keep: Vec<usize> = (0..n_width)
        .filter(|n_col| {
            raw.iter()
                .any(|row| row.get(*n_col).is_some_and(|c| !is_blank_text(c)))
        })
        .collect();
    raw.iter()
        .map(|row| {
            l_keep
                .iter()
                .map(|n_col| row.get(*n_col).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Header names: trimmed, first `Número`-like cell renamed to `Número`, blanks and duplicates made unique.
fn derive_email_header(row: &[String]) -> Vec<String> {
    let mut if_number_set = false;
    let l_names: Vec<String> = row
        .iter()
        .map(|c_cell| {
            let c_name = c_cell.trim();
            if !if_number_set && contains_ignore_case(c_name, C_COL_CHG_NUMBER) {
                if_number_set = true;
                return C_COL_CHG_NUMBER.to_string();
            }
            c_name.to_string()
        })
        .collect();
    derive_unique_names(&l_names)
}

fn derive_unique_names(names: &[String]) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    names
        .iter()
        .enumerate()
        .map(|(n_idx, c_name)| {
            let c_base = if c_name.is_empty() {
                format!("Coluna {}", n_idx + 1)
            } else {
                c_name.clone()
            };
            let mut c_unique = c_base.clone();
            let mut n_suffix = 2usize;
            while set_seen.contains(&c_unique) {
                c_unique = format!("{c_base} ({n_suffix})");
                n_suffix += 1;
            }
            set_seen.insert(c_unique.clone());
            c_unique
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Compare

/// Compare two CHG tables by their digit-only `Número`.
///
/// The `Número` cells of every output row hold the cleaned number. Rows whose
/// number has no digits take part in neither side.
pub fn compare_chg_tables(
    principal: &SpecSheetTable,
    email: &SpecSheetTable,
) -> Result<SpecChgComparison, ReportError> {
    let (principal, l_num_principal) = clean_number_column(principal)?;
    let (email, l_num_email) = clean_number_column(email)?;

    let set_principal: BTreeSet<&str> = l_num_principal.iter().flatten().map(String::as_str).collect();
    let set_email: BTreeSet<&str> = l_num_email.iter().flatten().map(String::as_str).collect();

    let mut cmp = SpecChgComparison::default();
    let mut l_idx_new = Vec::new();
    for (n_idx, number) in l_num_email.iter().enumerate() {
        match number {
            Some(c_num) if !set_principal.contains(c_num.as_str()) => l_idx_new.push(n_idx),
            Some(_) => {}
            None => cmp.n_rows_without_number += 1,
        }
    }
    let mut l_idx_missing = Vec::new();
    let mut l_idx_common = Vec::new();
    for (n_idx, number) in l_num_principal.iter().enumerate() {
        match number {
            Some(c_num) if set_email.contains(c_num.as_str()) => l_idx_common.push(n_idx),
            Some(_) => l_idx_missing.push(n_idx),
            None => cmp.n_rows_without_number += 1,
        }
    }

    cmp.new = email.select_rows(&l_idx_new);
    cmp.missing = principal.select_rows(&l_idx_missing);
    cmp.common = principal.select_rows(&l_idx_common);
    if cmp.n_rows_without_number > 0 {
        cmp.warnings.push(format!(
            "{} rows without a CHG number were left out",
            cmp.n_rows_without_number
        ));
    }
    let (n_new, n_missing, n_common) = cmp.counts();
    info!(new = n_new, missing = n_missing, common = n_common, "CHGs compared");
    Ok(cmp)
}

fn clean_number_column(table: &SpecSheetTable) -> Result<(SpecSheetTable, Vec<Option<String>>), ReportError> {
    let n_idx_number = table
        .position(C_COL_CHG_NUMBER)
        .ok_or_else(|| ReportError::MissingColumn {
            sheet: table.sheet_name.clone(),
            column: C_COL_CHG_NUMBER.to_string(),
        })?;
    let mut table_clean = table.clone();
    let mut l_numbers = Vec::with_capacity(table.height());
    for row in &mut table_clean.rows {
        let number = row.get(n_idx_number).and_then(|c| clean_digits(c));
        if let Some(c_cell) = row.get_mut(n_idx_number) {
            *c_cell = number.clone().unwrap_or_default();
        }
        l_numbers.push(number);
    }
    Ok((table_clean, l_numbers))
}

/// Compare the principal workbook (first sheet) with the e-mail extraction workbook (all sheets).
pub fn compare_chgs(v_principal: &[u8], v_email: &[u8]) -> Result<SpecChgComparison, ReportError> {
    let book_principal = read_workbook_bytes(v_principal)?;
    let c_first = list_sheet_names(&book_principal)
        .into_iter()
        .next()
        .ok_or_else(|| ReportError::MissingSheet {
            sheet: "<first sheet>".to_string(),
            available: String::new(),
        })?;
    let mut principal = match book_principal.get_sheet_by_name(&c_first) {
        Some(ws) => read_sheet_table(ws, &SpecTableReadOptions::default()),
        None => SpecSheetTable::default(),
    };
    principal.columns = derive_unique_names(&principal.columns);

    let book_email = read_workbook_bytes(v_email)?;
    let l_raw: Vec<Vec<Vec<String>>> = book_email
        .get_sheet_collection()
        .iter()
        .map(|ws| {
            let table = read_sheet_table(ws, &SpecTableReadOptions::default());
            if table.columns.is_empty() {
                return Vec::new();
            }
            std::iter::once(table.columns).chain(table.rows).collect()
        })
        .collect();

    let mut l_warnings = Vec::new();
    let email = assemble_email_table(&l_raw, &mut l_warnings);
    let mut cmp = compare_chg_tables(&principal, &email)?;
    l_warnings.append(&mut cmp.warnings);
    cmp.warnings = l_warnings;
    Ok(cmp)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Write

/// Render the comparison as a three-sheet workbook.
pub fn write_comparison_workbook(
    cmp: &SpecChgComparison,
) -> Result<(Vec<u8>, SpecXlsxReport), ReportError> {
    let mut writer = XlsxWriter::default();
    for (table, c_sheet) in [&cmp.new, &cmp.missing, &cmp.common]
        .into_iter()
        .zip(TUP_SHEETS_COMPARISON)
    {
        writer.write_table(table, c_sheet)?;
    }
    let bytes = writer.save_to_buffer()?;
    Ok((bytes, writer.report()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
