//! Shared XLSX specification models.

use serde::Deserialize;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification for workbooks produced by [`crate::writer::XlsxWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Normalized cell value during write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableSpecification

/// Text grid read from one worksheet: header row plus data rows.
///
/// Every data row has exactly `columns.len()` cells; missing cells are `""`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetTable {
    /// Worksheet the table was read from.
    pub sheet_name: String,
    /// Header cells, in sheet order.
    pub columns: Vec<String>,
    /// Data rows, in sheet order.
    pub rows: Vec<Vec<String>>,
}

impl SpecSheetTable {
    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Zero-based index of the first column named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Cell text at `(row_idx, col_idx)`, `""` when out of range.
    pub fn value(&self, row_idx: usize, col_idx: usize) -> &str {
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(col_idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Keep only rows whose index is in `indices` (order of `indices` is kept).
    pub fn select_rows(&self, indices: &[usize]) -> SpecSheetTable {
        SpecSheetTable {
            sheet_name: self.sheet_name.clone(),
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|n_idx| self.rows.get(*n_idx).cloned())
                .collect(),
        }
    }
}

/// Options for [`crate::reader::read_sheet_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableReadOptions {
    /// 1-based header row.
    pub n_row_header: u32,
    /// Trim surrounding whitespace from header cells.
    pub if_trim_header: bool,
    /// Drop data rows whose cells are all blank.
    pub if_skip_blank_rows: bool,
}

impl Default for SpecTableReadOptions {
    fn default() -> Self {
        Self {
            n_row_header: crate::conf::N_ROW_HEADER,
            if_trim_header: true,
            if_skip_blank_rows: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only (default).
    #[default]
    Header,
    /// Infer width from both header and body cells.
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::Header,
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide options controlling value conversion and layout defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecXlsxWriteOptions {
    /// Write numeric-looking text as numbers.
    pub infer_numeric_cells: bool,
    /// Freeze panes below the header row.
    pub freeze_header: bool,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            infer_numeric_cells: true,
            freeze_header: true,
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-workbook write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet names emitted, in write order.
    pub sheets: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Rows whose style was extended from the template by [`crate::template::propagate_row_formats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecRowFormatPropagation {
    /// First row that received a copied style (1-based), `None` when nothing was copied.
    pub row_first: Option<u32>,
    /// Last row that received a copied style (1-based).
    pub row_last: Option<u32>,
    /// Number of cells touched.
    pub cnt_cells: u64,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_right_side_values() {
        let base = SpecCellFormat {
            font_name: Some("Calibri".to_string()),
            bold: Some(false),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.font_name.as_deref(), Some("Calibri"));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color.as_deref(), Some("#FFFFFF"));
    }

    #[test]
    fn test_table_value_and_select_rows() {
        let table = SpecSheetTable {
            sheet_name: "S".to_string(),
            columns: vec!["A".to_string(), "B".to_string()],
            rows: vec![
                vec!["1".to_string(), "x".to_string()],
                vec!["2".to_string(), "y".to_string()],
                vec!["3".to_string(), "z".to_string()],
            ],
        };

        assert_eq!(table.position("B"), Some(1));
        assert_eq!(table.value(1, 1), "y");
        assert_eq!(table.value(9, 0), "");

        let selected = table.select_rows(&[2, 0]);
        assert_eq!(selected.rows[0][0], "3");
        assert_eq!(selected.rows[1][0], "1");
    }
}
