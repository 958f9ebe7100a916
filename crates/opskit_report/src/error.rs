//! Report error type.

use opskit_io_xlsx::XlsxIoError;
use thiserror::Error;

/// Failures that abort a report operation. Nothing is returned when one is raised.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Workbook could not be read, edited or written.
    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),
    /// None of the requested notebook sheets (nor a fallback) could be read.
    #[error("no readable sheet in the test notebook (requested: {requested})")]
    NoReadableSheet {
        /// Comma-joined requested sheet names.
        requested: String,
    },
    /// No sheet had a column mapping to the status column.
    #[error("no column maps to {column:?} in any notebook sheet; check the notebook headers")]
    MissingStatusColumn {
        /// Canonical status column name.
        column: String,
    },
    /// Status filtering removed every row.
    #[error("no test rows with a valid status found; accepted: {accepted}; statuses found: {found}")]
    NoValidRows {
        /// Comma-joined accepted labels.
        accepted: String,
        /// Comma-joined distinct statuses seen.
        found: String,
    },
    /// Daily tracking workbook lacks the destination sheet.
    #[error("destination sheet {sheet:?} not found in the daily workbook (available: {available})")]
    MissingDestinationSheet {
        sheet: String,
        available: String,
    },
    /// Caller-supplied date is not `DD/MM/YYYY`.
    #[error("invalid date {value:?}: expected DD/MM/YYYY")]
    InvalidDate {
        value: String,
    },
    /// A sheet required by the operation is absent.
    #[error("sheet not found: {sheet:?} (available: {available})")]
    MissingSheet {
        sheet: String,
        available: String,
    },
    /// A column required by the operation is absent.
    #[error("sheet {sheet:?} lacks required column {column:?}")]
    MissingColumn {
        sheet: String,
        column: String,
    },
    /// Incident export is not valid JSON.
    #[error("invalid incident JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Built-in pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(String),
}

impl ReportError {
    /// `true` when the failure comes from the caller's input rather than I/O.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            ReportError::Xlsx(XlsxIoError::Write(_)) | ReportError::Pattern(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_rows_message_lists_statuses() {
        let err = ReportError::NoValidRows {
            accepted: "Passed, Not Executed, Failed".to_string(),
            found: "A Validar".to_string(),
        };
        let c_msg = err.to_string();
        assert!(c_msg.contains("no test rows with a valid status"));
        assert!(c_msg.contains("A Validar"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_write_failures_are_not_input_errors() {
        let err = ReportError::from(XlsxIoError::Write("disk full".to_string()));
        assert!(!err.is_input_error());
    }
}
