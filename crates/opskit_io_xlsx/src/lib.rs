//! `opskit_io_xlsx` v1:
//! Rust-side XLSX kernel for the QD operations toolkit.
//!
//! Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : table/format/report models
//! - `util`     : pure helper functions
//! - `reader`   : workbook bytes <-> editable workbook, sheet -> text table
//! - `template` : in-place edits on formatted template sheets
//! - `writer`   : fresh workbooks from text tables
pub mod conf;
pub mod error;
pub mod reader;
pub mod spec;
pub mod template;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_ROW_HEADER};
pub use error::XlsxIoError;
pub use reader::{
    get_sheet, get_sheet_mut, list_sheet_names, read_named_table, read_sheet_table,
    read_workbook_bytes, write_workbook_bytes,
};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecRowFormatPropagation, SpecSheetTable, SpecTableReadOptions, SpecXlsxReport,
    SpecXlsxWriteOptions,
};
pub use template::{
    clear_row_values, copy_cell_format, find_last_populated_row, propagate_row_formats,
    read_cell_fill_argb, read_header_row, read_row_values, set_cell_fill, write_row_values,
};
pub use writer::XlsxWriter;

/// Re-export so callers can name workbook types without a direct dependency.
pub use umya_spreadsheet::{Spreadsheet, Worksheet};
