//! XLSX writer kernel that turns styled print rows into workbook output.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use gridkit_report::{SpecCellFormat, SpecPrintRow};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{C_SHEET_NAME_LOOKUP, N_LEN_EXCEL_SHEET_NAME_MAX};
use crate::spec::{
    EnumCellValue, SpecSheetColumn, SpecSheetSlice, SpecXlsxReport, SpecXlsxSheetWriteOptions,
    SpecXlsxWriteOptions, XlsxSinkError,
};
use crate::util::{
    convert_naive_datetime, convert_record_value, plan_sheet_slices, sanitize_sheet_name,
    validate_unique_columns,
};
use crate::validation::{SpecLookupLists, derive_data_validation};

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::save_to_buffer`] or
/// [`Self::close`] is called; both finalize the writer.
pub struct XlsxWriter {
    workbook: Workbook,
    write_options: SpecXlsxWriteOptions,
    lookup_lists: SpecLookupLists,
    dict_formats: HashMap<SpecCellFormat, Format>,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new(SpecXlsxWriteOptions::default())
    }
}

impl XlsxWriter {
    /// Create writer with format/options presets.
    pub fn new(write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            workbook: Workbook::new(),
            write_options,
            lookup_lists: SpecLookupLists::default(),
            dict_formats: HashMap::new(),
            set_sheet_names_existing: BTreeSet::from([C_SHEET_NAME_LOOKUP.to_string()]),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Dropdown lists registered for the hidden lookup sheet so far.
    pub fn lookup_lists(&self) -> &SpecLookupLists {
        &self.lookup_lists
    }

    /// Finalize and serialize workbook into XLSX bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, XlsxSinkError> {
        self.finalize()?;
        Ok(self.workbook.save_to_buffer()?)
    }

    /// Finalize and flush workbook to disk.
    pub fn close(&mut self, path_file_out: impl AsRef<Path>) -> Result<(), XlsxSinkError> {
        self.finalize()?;
        self.workbook.save(path_file_out.as_ref())?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), XlsxSinkError> {
        if self.if_closed {
            return Ok(());
        }
        if !self.lookup_lists.is_empty() {
            self.lookup_lists.write_sheet(&mut self.workbook)?;
        }
        self.if_closed = true;
        Ok(())
    }

    /// Write one sheet of print rows.
    ///
    /// Cells are read from each row by column key, in `columns` order. The
    /// effective cell format is the base format overlaid with the row style.
    pub fn write_sheet(
        &mut self,
        sheet_name: &str,
        columns: &[SpecSheetColumn],
        rows: &[SpecPrintRow],
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), XlsxSinkError> {
        if self.if_closed {
            return Err(XlsxSinkError::Closed);
        }
        validate_unique_columns(columns).map_err(XlsxSinkError::InvalidLayout)?;

        let n_rows_header = 1usize;
        let mut report = SpecXlsxReport::default();
        let l_sheet_parts = plan_sheet_slices(
            rows.len(),
            columns.len(),
            n_rows_header,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )
        .map_err(XlsxSinkError::InvalidLayout)?;
        if l_sheet_parts.len() > 1 {
            tracing::warn!(
                sheet_name,
                n_rows = rows.len(),
                n_sheets = l_sheet_parts.len(),
                "sheet split across Excel row limit"
            );
        }

        let mut l_validations = Vec::with_capacity(columns.len());
        for column in columns {
            l_validations.push(derive_data_validation(
                &column.validation,
                &mut self.lookup_lists,
            )?);
        }

        let fmt_header = derive_cached_format(
            &mut self.dict_formats,
            &self.write_options.header_format,
        );
        let n_row_freeze = options.row_freeze.unwrap_or(if self.write_options.if_freeze_header {
            n_rows_header
        } else {
            0
        });

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let worksheet = self.workbook.add_worksheet();
            worksheet.set_name(&sheet_name_unique)?;

            write_header(worksheet, columns, &fmt_header)?;
            if n_row_freeze > 0 || options.col_freeze > 0 {
                worksheet.set_freeze_panes(
                    cast_cell_index("row", n_row_freeze)?,
                    cast_cell_index("column", options.col_freeze)?,
                )?;
            }
            for (n_idx_col, column) in columns.iter().enumerate() {
                if let Some(n_width) = column.width {
                    worksheet.set_column_width(cast_cell_index("column", n_idx_col)?, n_width)?;
                }
            }

            let l_rows_slice =
                &rows[sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive];
            for (n_idx_row, row) in l_rows_slice.iter().enumerate() {
                for (n_idx_col, column) in columns.iter().enumerate() {
                    let value = convert_record_value(
                        row.value(&column.key),
                        column.validation.is_date(),
                        &self.write_options.value_policy,
                    );

                    let mut fmt_cell = self
                        .write_options
                        .base_format
                        .merge(&row.style.resolve_cell(&column.key));
                    if value.is_date() && fmt_cell.num_format.is_none() {
                        fmt_cell.num_format = Some(self.write_options.num_format_date.clone());
                    }
                    let format = derive_cached_format(&mut self.dict_formats, &fmt_cell);

                    write_cell_with_format(
                        worksheet,
                        n_rows_header + n_idx_row,
                        n_idx_col,
                        &value,
                        &format,
                    )?;
                }
            }

            if !l_rows_slice.is_empty() {
                let n_row_first = cast_cell_index("row", n_rows_header)?;
                let n_row_last =
                    cast_cell_index("row", n_rows_header + l_rows_slice.len() - 1)?;
                for (n_idx_col, validation) in l_validations.iter().enumerate() {
                    if let Some(dv) = validation {
                        let n_col = cast_cell_index("column", n_idx_col)?;
                        worksheet.add_data_validation(n_row_first, n_col, n_row_last, n_col, dv)?;
                    }
                }
            }

            tracing::debug!(
                sheet_name = %sheet_name_unique,
                n_rows = l_rows_slice.len(),
                n_cols = columns.len(),
                "sheet written"
            );
            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                row_start_inclusive: sheet_slice.row_start_inclusive,
                row_end_exclusive: sheet_slice.row_end_exclusive,
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn derive_cached_format(
    dict_formats: &mut HashMap<SpecCellFormat, Format>,
    spec: &SpecCellFormat,
) -> Format {
    dict_formats
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

fn write_header(
    worksheet: &mut Worksheet,
    columns: &[SpecSheetColumn],
    fmt_header: &Format,
) -> Result<(), XlsxSinkError> {
    for (col_idx, column) in columns.iter().enumerate() {
        if column.header.is_empty() {
            worksheet.write_blank(0, cast_cell_index("column", col_idx)?, fmt_header)?;
        } else {
            worksheet.write_string_with_format(
                0,
                cast_cell_index("column", col_idx)?,
                &column.header,
                fmt_header,
            )?;
        }
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxSinkError> {
    let n_row = cast_cell_index("row", row_idx)?;
    let n_col = cast_cell_index("column", col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Bool(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::DateTime(val) => match convert_naive_datetime(val) {
            Ok(dt) => {
                worksheet.write_datetime_with_format(n_row, n_col, &dt, format)?;
            }
            // Dates Excel cannot represent stay readable as text.
            Err(_) => {
                worksheet.write_string_with_format(n_row, n_col, val.to_string(), format)?;
            }
        },
    }
    Ok(())
}

/// Translate a merged cell format into a `rust_xlsxwriter` format.
fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(font_name) = spec.font_name.as_deref() {
        format = format.set_font_name(font_name);
    }
    if let Some(n_size) = spec.font_size {
        format = format.set_font_size(n_size as f64);
    }
    if spec.bold == Some(true) {
        format = format.set_bold();
    }
    if spec.italic == Some(true) {
        format = format.set_italic();
    }
    if spec.text_wrap == Some(true) {
        format = format.set_text_wrap();
    }

    let l_aligns = [
        spec.align.as_deref().and_then(derive_horizontal_align),
        spec.valign.as_deref().and_then(derive_vertical_align),
    ];
    for align in l_aligns.into_iter().flatten() {
        format = format.set_align(align);
    }

    if let Some(num_format) = spec.num_format.as_deref() {
        format = format.set_num_format(num_format);
    }
    if let Some(color) = spec.bg_color.as_deref() {
        format = format.set_background_color(color);
    }
    if let Some(color) = spec.font_color.as_deref() {
        format = format.set_font_color(color);
    }

    if let Some(n_code) = spec.border {
        format = format.set_border(derive_border_style(n_code));
    }
    let l_edges: [(Option<i64>, fn(Format, FormatBorder) -> Format); 4] = [
        (spec.top, Format::set_border_top),
        (spec.bottom, Format::set_border_bottom),
        (spec.left, Format::set_border_left),
        (spec.right, Format::set_border_right),
    ];
    for (n_code, set_edge) in l_edges {
        if let Some(n_code) = n_code {
            format = set_edge(format, derive_border_style(n_code));
        }
    }

    format
}

/// Border style for an Excel border code; unknown non-zero codes draw thin.
fn derive_border_style(n_code: i64) -> FormatBorder {
    match n_code {
        0 => FormatBorder::None,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::Thin,
    }
}

fn derive_horizontal_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        _ => None,
    }
}

fn derive_vertical_align(valign: &str) -> Option<FormatAlign> {
    match valign.trim().to_ascii_lowercase().as_str() {
        "top" => Some(FormatAlign::Top),
        "vcenter" | "center" => Some(FormatAlign::VerticalCenter),
        "bottom" => Some(FormatAlign::Bottom),
        _ => None,
    }
}

/// Narrow a zero-based row or column index to the sheet's index type.
fn cast_cell_index<T: TryFrom<usize>>(c_axis: &str, value: usize) -> Result<T, XlsxSinkError> {
    T::try_from(value)
        .map_err(|_| XlsxSinkError::InvalidLayout(format!("{c_axis} index overflow: {value}")))
}
