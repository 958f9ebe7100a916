//! Kernel error type.

use thiserror::Error;

/// Failures raised by workbook read/edit/write helpers.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Input bytes are not a readable XLSX container.
    #[error("failed to read workbook: {0}")]
    Read(String),
    /// Workbook could not be serialized.
    #[error("failed to write workbook: {0}")]
    Write(String),
    /// Requested worksheet does not exist.
    #[error("sheet not found: {sheet:?} (available: {available})")]
    MissingSheet {
        /// Requested sheet name.
        sheet: String,
        /// Comma-joined list of sheet names present in the workbook.
        available: String,
    },
    /// Table shape is not writable (duplicate columns, ragged rows).
    #[error("invalid table: {0}")]
    InvalidTable(String),
    /// Row/column index outside Excel limits.
    #[error("index overflow: {0}")]
    IndexOverflow(String),
}

impl From<rust_xlsxwriter::XlsxError> for XlsxIoError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        XlsxIoError::Write(format!("xlsx write error: {err}"))
    }
}
