//! `opskit_report` v1:
//! Business rules of the QD operations toolkit.
//!
//! Modules:
//! - `conf`        : business constants and default preset factories
//! - `spec`        : configuration, record and report models
//! - `util`        : title case, dates, text helpers
//! - `status`      : status normalization
//! - `columns`     : source header reconciliation
//! - `append`      : canonical rows -> destination template sheet
//! - `merge`       : test-result merge (`process_tests`)
//! - `occurrences` : occurrences workbook refresh
//! - `chg`         : CHG digest
//! - `incident`    : incident report
//! - `compare`     : CHG reconciliation
pub mod append;
pub mod chg;
pub mod columns;
pub mod compare;
pub mod conf;
pub mod error;
pub mod incident;
pub mod merge;
pub mod occurrences;
pub mod spec;
pub mod status;
pub mod util;

pub use append::append_canonical_rows;
pub use chg::{generate_chg_report, read_chg_records, render_chg_report, select_chg_window};
pub use columns::{project_row, reconcile_columns};
pub use compare::{compare_chg_tables, compare_chgs, write_comparison_workbook};
pub use error::ReportError;
pub use incident::{
    categorize_incidents, derive_incident_statistics, generate_incident_report,
    parse_incident_document, render_incident_report,
};
pub use merge::process_tests;
pub use occurrences::update_occurrences;
pub use spec::{
    EnumStatusLabel, EnumStatusOutcome, SpecChgComparison, SpecChgReport, SpecChgReportConfig,
    SpecIncidentConfig, SpecIncidentStatistics, SpecMergeConfig, SpecMergeOutput, SpecMergeReport,
    SpecOccurrencesConfig, SpecOccurrencesOutput, SpecToolkitConfig,
};
pub use status::normalize_status;
