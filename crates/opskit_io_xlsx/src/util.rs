//! Stateless helper utilities used by the reader, template editor and writer.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::error::XlsxIoError;
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// `true` when a cell text carries no visible content.
pub fn is_blank_text(value: &str) -> bool {
    value.trim().is_empty()
}

/// Convert cell text into a typed write value.
///
/// Blank text becomes [`EnumCellValue::None`]; finite numeric text becomes a number when
/// `if_infer_numeric` is set.
pub fn convert_text_to_cell_value(value: &str, if_infer_numeric: bool) -> EnumCellValue {
    if is_blank_text(value) {
        return EnumCellValue::None;
    }
    if if_infer_numeric
        && let Ok(v) = value.trim().parse::<f64>()
        && v.is_finite()
    {
        return EnumCellValue::Number(v);
    }
    EnumCellValue::String(value.to_string())
}

/// Display width used for autofit: CJK/emoji count double.
pub fn estimate_unicode_string_width(value: &str) -> usize {
    value
        .chars()
        .map(|ch| if (ch as u32) > 0x2E80 { 2 } else { 1 })
        .sum()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableShapeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), XlsxIoError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxIoError::InvalidTable(format!(
        "Duplicate column names detected: {c_msg}"
    )))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
