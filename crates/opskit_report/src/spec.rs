//! Configuration, record and report models shared by the report operations.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use opskit_io_xlsx::{SpecRowFormatPropagation, SpecSheetTable};
use serde::{Deserialize, Serialize};

use crate::conf::{
    C_COL_DATE, C_COL_STATUS, C_INCIDENT_OWNER, C_SHEET_DESTINATION, N_LEN_INCIDENT_TEXT_MAX,
    TUP_OCCURRENCES_CRITICAL, TUP_OCCURRENCES_FUNCTIONAL, TUP_SHEETS_CHG, TUP_SHEETS_NOTEBOOK,
    derive_default_column_rules, derive_default_status_colors, derive_default_status_rules,
};

////////////////////////////////////////////////////////////////////////////////
// #region StatusSpecification

/// Canonical test status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumStatusLabel {
    /// `Passed`.
    Passed,
    /// `Not Executed`.
    NotExecuted,
    /// `Failed`.
    Failed,
}

impl EnumStatusLabel {
    /// All labels, in report order.
    pub const ALL: [EnumStatusLabel; 3] = [
        EnumStatusLabel::Passed,
        EnumStatusLabel::NotExecuted,
        EnumStatusLabel::Failed,
    ];

    /// Text written to the destination sheet.
    pub fn as_str(self) -> &'static str {
        match self {
            EnumStatusLabel::Passed => "Passed",
            EnumStatusLabel::NotExecuted => "Not Executed",
            EnumStatusLabel::Failed => "Failed",
        }
    }

    /// Exact (case-sensitive) lookup of a canonical label text.
    pub fn from_canonical(value: &str) -> Option<EnumStatusLabel> {
        EnumStatusLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == value)
    }
}

/// Result of normalizing one raw status cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumStatusOutcome {
    /// One of the three accepted labels.
    Canonical(EnumStatusLabel),
    /// Contains an excluded term; carries the title-cased text.
    Excluded(String),
    /// Anything else; carries the title-cased text.
    Unrecognized(String),
}

impl EnumStatusOutcome {
    /// Normalized text, as it would appear in diagnostics.
    pub fn as_text(&self) -> &str {
        match self {
            EnumStatusOutcome::Canonical(label) => label.as_str(),
            EnumStatusOutcome::Excluded(c_text) | EnumStatusOutcome::Unrecognized(c_text) => c_text,
        }
    }
}

/// Status normalization rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecStatusRules {
    /// Terms that exclude a row when contained in its status (case-insensitive).
    pub excluded_terms: Vec<String>,
}

impl Default for SpecStatusRules {
    fn default() -> Self {
        derive_default_status_rules()
    }
}

/// ARGB solid fills applied to the status cell of appended rows. `None` disables the fill.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecStatusColors {
    pub passed: Option<String>,
    pub not_executed: Option<String>,
    pub failed: Option<String>,
}

impl SpecStatusColors {
    /// Fill color for `label`.
    pub fn argb_for(&self, label: EnumStatusLabel) -> Option<&str> {
        match label {
            EnumStatusLabel::Passed => self.passed.as_deref(),
            EnumStatusLabel::NotExecuted => self.not_executed.as_deref(),
            EnumStatusLabel::Failed => self.failed.as_deref(),
        }
    }
}

impl Default for SpecStatusColors {
    fn default() -> Self {
        derive_default_status_colors()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpecification

/// Column alias and ignore rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecColumnRules {
    /// Source header -> canonical name.
    pub aliases: BTreeMap<String, String>,
    /// Canonical names dropped after renaming.
    pub ignored: Vec<String>,
}

impl Default for SpecColumnRules {
    fn default() -> Self {
        derive_default_column_rules()
    }
}

/// Column mapping derived once per source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReconciledSchema {
    /// Source header cells, trimmed.
    pub columns_source: Vec<String>,
    /// Canonical name per source column; `None` when the column is dropped.
    pub columns_canonical: Vec<Option<String>>,
    /// Source column that carries the status.
    pub idx_status: Option<usize>,
    /// Non-fatal mapping issues (duplicate canonical names).
    pub warnings: Vec<String>,
}

impl SpecReconciledSchema {
    /// Canonical names of the kept columns, in source order.
    pub fn canonical_names(&self) -> Vec<&str> {
        self.columns_canonical
            .iter()
            .filter_map(|name| name.as_deref())
            .collect()
    }
}

/// One reconciled row waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCanonicalRow {
    /// Accepted status.
    pub status: EnumStatusLabel,
    /// Canonical column -> cell text. The status column holds `status.as_str()`.
    pub fields: BTreeMap<String, String>,
}

impl SpecCanonicalRow {
    /// Cell text for a destination column, `""` when unmapped.
    pub fn value(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeSpecification

/// Test-merge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecMergeConfig {
    /// Notebook sheets read in order.
    pub sheets_source: Vec<String>,
    /// Read the workbook's first sheet when a named sheet is missing.
    pub if_fallback_first_sheet: bool,
    /// Daily tracking sheet receiving the rows.
    pub sheet_destination: String,
    /// Destination header row (1-based).
    pub n_row_header: u32,
    /// Column stamped with the merge date.
    pub col_date: String,
    /// Canonical status column.
    pub col_status: String,
    pub rules_status: SpecStatusRules,
    pub rules_columns: SpecColumnRules,
    pub colors_status: SpecStatusColors,
}

impl Default for SpecMergeConfig {
    fn default() -> Self {
        Self {
            sheets_source: TUP_SHEETS_NOTEBOOK.iter().map(|c| c.to_string()).collect(),
            if_fallback_first_sheet: true,
            sheet_destination: C_SHEET_DESTINATION.to_string(),
            n_row_header: 1,
            col_date: C_COL_DATE.to_string(),
            col_status: C_COL_STATUS.to_string(),
            rules_status: SpecStatusRules::default(),
            rules_columns: SpecColumnRules::default(),
            colors_status: SpecStatusColors::default(),
        }
    }
}

/// Outcome of reading one requested notebook sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSheetRead {
    /// Sheet (or its fallback) was read.
    Loaded(SpecSheetTable),
    /// Sheet contributes no rows; carries the reason.
    Skipped(String),
}

/// Per requested sheet statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetMergeStat {
    /// Sheet name asked for.
    pub sheet_requested: String,
    /// Sheet actually read (differs on fallback).
    pub sheet_used: Option<String>,
    /// Data rows read.
    pub n_rows_read: usize,
    /// Rows that survived status filtering.
    pub n_rows_kept: usize,
    /// Why the sheet contributed nothing.
    pub reason_skipped: Option<String>,
}

/// Rows written by the row appender.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecAppendReport {
    /// Last populated row before the append.
    pub row_last_before: u32,
    /// First written row.
    pub row_first: Option<u32>,
    /// Last written row.
    pub row_last: Option<u32>,
    /// Non-blank cells written.
    pub cnt_cells: u64,
    /// Status cells filled.
    pub cnt_fills: u64,
    /// Style extension below the template.
    pub propagation: SpecRowFormatPropagation,
}

/// Merge diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecMergeReport {
    pub sheets: Vec<SpecSheetMergeStat>,
    /// Date stamped on every appended row.
    pub date: String,
    /// Rows dropped by the excluded-term pass.
    pub n_rows_excluded: usize,
    /// Rows dropped because their status is not canonical.
    pub n_rows_unrecognized: usize,
    /// Distinct normalized statuses seen, in first-seen order.
    pub statuses_seen: Vec<String>,
    pub append: SpecAppendReport,
    pub warnings: Vec<String>,
}

impl SpecMergeReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Successful merge result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMergeOutput {
    /// Rewritten daily tracking workbook.
    pub bytes: Vec<u8>,
    pub n_rows_appended: usize,
    pub report: SpecMergeReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OccurrencesSpecification

/// One `(base sheet <- extraction sheet)` refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecOccurrencesPair {
    /// Template sheet in the base workbook.
    pub sheet_base: String,
    /// Candidate extraction sheet names, first present wins.
    pub sheets_extraction: Vec<String>,
}

/// Occurrences-refresh configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecOccurrencesConfig {
    pub functional: SpecOccurrencesPair,
    pub critical: SpecOccurrencesPair,
    /// Store numeric-looking extraction text as numbers.
    pub if_infer_numeric: bool,
}

impl Default for SpecOccurrencesConfig {
    fn default() -> Self {
        let (c_func_base, tup_func_extr) = TUP_OCCURRENCES_FUNCTIONAL;
        let (c_crit_base, tup_crit_extr) = TUP_OCCURRENCES_CRITICAL;
        Self {
            functional: SpecOccurrencesPair {
                sheet_base: c_func_base.to_string(),
                sheets_extraction: tup_func_extr.iter().map(|c| c.to_string()).collect(),
            },
            critical: SpecOccurrencesPair {
                sheet_base: c_crit_base.to_string(),
                sheets_extraction: tup_crit_extr.iter().map(|c| c.to_string()).collect(),
            },
            if_infer_numeric: true,
        }
    }
}

/// Refresh statistics for one base sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetRefresh {
    pub sheet_base: String,
    pub sheet_extraction: String,
    /// Highest row of the template before the refresh.
    pub row_template_last: u32,
    pub n_records: usize,
    pub cnt_cells_cleared: u64,
    pub propagation: SpecRowFormatPropagation,
}

/// Successful occurrences refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOccurrencesOutput {
    pub bytes: Vec<u8>,
    /// Functional plus critical records.
    pub n_records: usize,
    pub functional: SpecSheetRefresh,
    pub critical: SpecSheetRefresh,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChgSpecification

/// CHG digest configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecChgReportConfig {
    /// Sheets concatenated in order.
    pub sheets: Vec<String>,
    /// Value of `Enviar Keep` that selects a CHG (compared trimmed, lower-cased).
    pub send_flag: String,
    /// Earliest start hour on the reference day.
    pub n_hour_today_from: u32,
    /// Start hour bound (exclusive) on the following day.
    pub n_hour_tomorrow_until: u32,
}

impl Default for SpecChgReportConfig {
    fn default() -> Self {
        Self {
            sheets: TUP_SHEETS_CHG.iter().map(|c| c.to_string()).collect(),
            send_flag: "sim".to_string(),
            n_hour_today_from: 17,
            n_hour_tomorrow_until: 4,
        }
    }
}

/// One change request row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChgRecord {
    pub number: String,
    pub description: String,
    pub status: String,
    pub unavailability: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub ci_impacted: String,
    pub assignment_group: String,
    pub observation: String,
    pub send: String,
}

/// CHG rows read from the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecChgSheetRead {
    pub records: Vec<SpecChgRecord>,
    /// Data rows seen across all sheets.
    pub n_rows_read: usize,
    /// Rows dropped for an unparseable planned date.
    pub n_rows_bad_date: usize,
    pub warnings: Vec<String>,
}

/// Rendered CHG digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChgReport {
    pub text: String,
    pub reference_date: NaiveDate,
    pub n_selected: usize,
    pub n_rows_read: usize,
    pub n_rows_bad_date: usize,
    pub warnings: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IncidentSpecification

/// Incident report configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecIncidentConfig {
    /// Owner printed under every category.
    pub owner: String,
    /// Functionality text limit (longer text ends with `...`).
    pub n_len_text_max: usize,
    /// Shift printed after the report date.
    pub shift: String,
}

impl Default for SpecIncidentConfig {
    fn default() -> Self {
        Self {
            owner: C_INCIDENT_OWNER.to_string(),
            n_len_text_max: N_LEN_INCIDENT_TEXT_MAX,
            shift: "07h as 19h".to_string(),
        }
    }
}

/// One ticket from the incident export.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecIncidentRecord {
    pub number: Option<String>,
    /// Either `"3"` or `3` depending on the export.
    pub priority: Option<serde_json::Value>,
    pub short_description: Option<String>,
    pub description: Option<String>,
}

impl SpecIncidentRecord {
    /// Priority as text (`"3"` and `3` both read as `3`).
    pub fn priority_text(&self) -> Option<String> {
        match self.priority.as_ref()? {
            serde_json::Value::String(c_value) => Some(c_value.trim().to_string()),
            serde_json::Value::Number(n_value) => Some(n_value.to_string()),
            _ => None,
        }
    }
}

/// Incident export document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecIncidentDocument {
    pub records: Vec<SpecIncidentRecord>,
}

/// Incidents grouped by report section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecIncidentCategories {
    pub critical: Vec<SpecIncidentRecord>,
    pub high: Vec<SpecIncidentRecord>,
    pub specific: Vec<SpecIncidentRecord>,
    pub vip: Vec<SpecIncidentRecord>,
}

/// Per-category counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SpecIncidentStatistics {
    pub critical: usize,
    pub high: usize,
    pub specific: usize,
    pub vip: usize,
    pub total: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CompareSpecification

/// CHG reconciliation between the principal table and the e-mail table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecChgComparison {
    /// E-mail rows whose number is absent from the principal table.
    pub new: SpecSheetTable,
    /// Principal rows whose number is absent from the e-mail table.
    pub missing: SpecSheetTable,
    /// Principal rows whose number is also in the e-mail table.
    pub common: SpecSheetTable,
    /// Rows (either side) left out because their number has no digits.
    pub n_rows_without_number: usize,
    pub warnings: Vec<String>,
}

impl SpecChgComparison {
    /// `(new, missing, common)` row counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.new.height(), self.missing.height(), self.common.height())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ToolkitConfig

/// Whole-toolkit configuration, loadable from one JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SpecToolkitConfig {
    pub merge: SpecMergeConfig,
    pub occurrences: SpecOccurrencesConfig,
    pub chg: SpecChgReportConfig,
    pub incident: SpecIncidentConfig,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
