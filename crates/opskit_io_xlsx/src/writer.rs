//! XLSX writer kernel that renders text tables into a fresh workbook.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::conf::{EnumFmtKey, N_NROWS_EXCEL_MAX, derive_default_xlsx_formats};
use crate::error::XlsxIoError;
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecCellFormat, SpecSheetTable, SpecXlsxReport,
    SpecXlsxWriteOptions,
};
use crate::util::{
    convert_text_to_cell_value, create_sheet_identifier, estimate_unicode_string_width,
    sanitize_sheet_name, validate_unique_columns,
};

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::save_to_buffer`].
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_number: SpecCellFormat,
    fmt_header: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let derive_fmt = |key: EnumFmtKey| dict_fmt.get(key.as_str()).cloned().unwrap_or_default();
        Self::new(
            derive_fmt(EnumFmtKey::Text),
            derive_fmt(EnumFmtKey::Number),
            derive_fmt(EnumFmtKey::Header),
            SpecXlsxWriteOptions::default(),
        )
    }
}

impl XlsxWriter {
    /// Create writer with explicit format presets.
    pub fn new(
        fmt_text: SpecCellFormat,
        fmt_number: SpecCellFormat,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text,
            fmt_number,
            fmt_header,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
        }
    }

    /// Snapshot of emitted sheets and warnings.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Serialize the workbook to bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, XlsxIoError> {
        Ok(self.workbook.save_to_buffer()?)
    }

    /// Write one table as a new sheet; returns the sheet name actually used.
    ///
    /// An empty table still yields a sheet with its header row.
    pub fn write_table(
        &mut self,
        table: &SpecSheetTable,
        sheet_name: &str,
    ) -> Result<String, XlsxIoError> {
        validate_unique_columns(&table.columns)?;
        if let Some(n_idx) = table.rows.iter().position(|row| row.len() != table.width()) {
            return Err(XlsxIoError::InvalidTable(format!(
                "row {n_idx} has {} cells, header has {}",
                table.rows[n_idx].len(),
                table.width()
            )));
        }
        if table.height() >= N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::IndexOverflow(format!(
                "table with {} rows exceeds the Excel row limit",
                table.height()
            )));
        }

        let c_sheet_name = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        if c_sheet_name != sheet_name {
            self.report.warn(format!(
                "Sheet name {sheet_name:?} written as {c_sheet_name:?}."
            ));
        }

        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);
        let fmt_text = derive_rust_xlsx_format(&self.fmt_text);
        let fmt_number = derive_rust_xlsx_format(&self.fmt_number);
        let write_options = self.write_options.clone();

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&c_sheet_name)?;

        for (n_idx_col, c_name) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, cast_col_num(n_idx_col)?, c_name, &fmt_header)?;
        }
        if write_options.freeze_header {
            worksheet.set_freeze_panes(1, 0)?;
        }

        for (n_idx_row, row) in table.rows.iter().enumerate() {
            for (n_idx_col, c_value) in row.iter().enumerate() {
                let value = convert_text_to_cell_value(c_value, write_options.infer_numeric_cells);
                write_cell_with_format(
                    worksheet,
                    n_idx_row + 1,
                    n_idx_col,
                    &value,
                    &fmt_text,
                    &fmt_number,
                )?;
            }
        }

        apply_autofit(worksheet, table, &write_options)?;

        debug!(
            sheet = %c_sheet_name,
            width = table.width(),
            height = table.height(),
            "table sheet written"
        );
        self.report.sheets.push(c_sheet_name.clone());
        Ok(c_sheet_name)
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        let c_name_lower = name.to_lowercase();
        if !self.set_sheet_names_existing.contains(&c_name_lower) {
            self.set_sheet_names_existing.insert(c_name_lower);
            return name.to_string();
        }

        let mut n_idx = 1;
        loop {
            let c_candidate = create_sheet_identifier(name, n_idx);
            let c_candidate_lower = c_candidate.to_lowercase();
            if !self.set_sheet_names_existing.contains(&c_candidate_lower) {
                self.set_sheet_names_existing.insert(c_candidate_lower);
                return c_candidate;
            }
            n_idx += 1;
        }
    }
}

fn apply_autofit(
    worksheet: &mut Worksheet,
    table: &SpecSheetTable,
    write_options: &SpecXlsxWriteOptions,
) -> Result<(), XlsxIoError> {
    let policy = &write_options.policy_autofit;
    if matches!(policy.rule_columns, EnumAutofitColumnsRule::None) {
        return Ok(());
    }

    for (n_idx_col, c_name) in table.columns.iter().enumerate() {
        let mut n_width = estimate_unicode_string_width(c_name);
        if matches!(policy.rule_columns, EnumAutofitColumnsRule::All) {
            for row in &table.rows {
                n_width = usize::max(n_width, estimate_unicode_string_width(&row[n_idx_col]));
            }
        }
        let n_width_final = (n_width + policy.width_cell_padding)
            .clamp(policy.width_cell_min, policy.width_cell_max);
        worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    fmt_text: &Format,
    fmt_number: &Format,
) -> Result<(), XlsxIoError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, fmt_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                fmt_text,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                fmt_number,
            )?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value).map_err(|_| XlsxIoError::IndexOverflow(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::IndexOverflow(format!("column index overflow: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{list_sheet_names, read_named_table, read_workbook_bytes};
    use crate::spec::SpecTableReadOptions;

    fn create_table() -> SpecSheetTable {
        SpecSheetTable {
            sheet_name: "CHGs".to_string(),
            columns: vec!["Número".to_string(), "Descrição resumida".to_string()],
            rows: vec![
                vec!["1001".to_string(), "Janela de banco".to_string()],
                vec!["CHG1002".to_string(), String::new()],
            ],
        }
    }

    #[test]
    fn test_write_table_roundtrips_through_reader() {
        let mut writer = XlsxWriter::default();
        writer.write_table(&create_table(), "CHGs novas").expect("write");
        let v_bytes = writer.save_to_buffer().expect("save");

        let book = read_workbook_bytes(&v_bytes).expect("read");
        assert_eq!(list_sheet_names(&book), vec!["CHGs novas".to_string()]);

        let table = read_named_table(&book, "CHGs novas", &SpecTableReadOptions::default())
            .expect("table");
        assert_eq!(table.columns, create_table().columns);
        assert_eq!(table.value(0, 0), "1001");
        assert_eq!(table.value(1, 0), "CHG1002");
        assert_eq!(table.value(0, 1), "Janela de banco");
    }

    #[test]
    fn test_write_table_dedups_sheet_names_and_warns() {
        let mut writer = XlsxWriter::default();
        let c_first = writer.write_table(&create_table(), "CHGs").expect("first");
        let c_second = writer.write_table(&create_table(), "chgs").expect("second");
        let c_third = writer.write_table(&create_table(), "a/b").expect("third");

        assert_eq!(c_first, "CHGs");
        assert_eq!(c_second, "chgs_1");
        assert_eq!(c_third, "a_b");
        let report = writer.report();
        assert_eq!(report.sheets.len(), 3);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_write_table_rejects_ragged_rows() {
        let mut table = create_table();
        table.rows.push(vec!["x".to_string()]);
        let err = XlsxWriter::default()
            .write_table(&table, "S")
            .expect_err("must fail");
        assert!(matches!(err, XlsxIoError::InvalidTable(_)));
    }
}
