//! Per-column data validation and the hidden dropdown lookup sheet.

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{
    DataValidation, DataValidationErrorStyle, DataValidationRule, ExcelDateTime, Formula,
    Workbook, XlsxError,
};

use crate::conf::{C_SHEET_NAME_LOOKUP, TUP_DATE_VALIDATION_MIN};
use crate::spec::{EnumColumnValidation, XlsxSinkError};
use crate::util::{derive_excel_col_letter, is_list_literal_fit};

////////////////////////////////////////////////////////////////////////////////
// #region LookupSheet

/// Dropdown value lists placed on the hidden lookup sheet, one column each.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpecLookupLists {
    l_lists: Vec<Vec<String>>,
}

impl SpecLookupLists {
    /// Register `values` and return the absolute range formula referencing them.
    ///
    /// Identical lists share one lookup column.
    pub fn register(&mut self, values: &[String]) -> String {
        let n_idx_col = match self.l_lists.iter().position(|l_vals| l_vals == values) {
            Some(n_idx) => n_idx,
            None => {
                self.l_lists.push(values.to_vec());
                self.l_lists.len() - 1
            }
        };
        let c_col = derive_excel_col_letter(n_idx_col);
        format!(
            "'{C_SHEET_NAME_LOOKUP}'!${c_col}$1:${c_col}${}",
            usize::max(1, values.len())
        )
    }

    /// Whether no list was registered.
    pub fn is_empty(&self) -> bool {
        self.l_lists.is_empty()
    }

    /// Registered lists in column order.
    pub fn lists(&self) -> &[Vec<String>] {
        &self.l_lists
    }

    /// Append the hidden lookup worksheet to `workbook`.
    pub fn write_sheet(&self, workbook: &mut Workbook) -> Result<(), XlsxSinkError> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(C_SHEET_NAME_LOOKUP)?;
        worksheet.set_hidden(true);

        for (n_idx_col, l_values) in self.l_lists.iter().enumerate() {
            let n_col = u16::try_from(n_idx_col).map_err(|_| {
                XlsxSinkError::InvalidLayout(format!("lookup column overflow: {n_idx_col}"))
            })?;
            for (n_idx_row, value) in l_values.iter().enumerate() {
                let n_row = u32::try_from(n_idx_row).map_err(|_| {
                    XlsxSinkError::InvalidLayout(format!("lookup row overflow: {n_idx_row}"))
                })?;
                worksheet.write_string(n_row, n_col, value)?;
            }
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnValidation

/// Build the data validation of one column, registering lookup lists as needed.
///
/// Returns `None` for text columns and for empty dropdowns.
pub fn derive_data_validation(
    validation: &EnumColumnValidation,
    lookup_lists: &mut SpecLookupLists,
) -> Result<Option<DataValidation>, XlsxError> {
    let dv = match validation {
        EnumColumnValidation::Text => return Ok(None),
        EnumColumnValidation::Array {
            values,
            if_lookup_sheet,
        } => {
            if values.is_empty() {
                return Ok(None);
            }
            let dv = if !*if_lookup_sheet && is_list_literal_fit(values) {
                DataValidation::new().allow_list_strings(values.as_slice())?
            } else {
                DataValidation::new().allow_list_formula(Formula::new(lookup_lists.register(values)))
            };
            set_error_text(dv, "Invalid value", "Please select a value from the list")?
        }
        EnumColumnValidation::Int { min, max } => {
            let rule = match (min, max) {
                (Some(n_min), Some(n_max)) => DataValidationRule::Between(*n_min, *n_max),
                (Some(n_min), None) => DataValidationRule::GreaterThanOrEqualTo(*n_min),
                (None, Some(n_max)) => DataValidationRule::LessThanOrEqualTo(*n_max),
                (None, None) => DataValidationRule::Between(i32::MIN, i32::MAX),
            };
            set_error_text(
                DataValidation::new().allow_whole_number(rule),
                "Invalid integer",
                "Please enter a whole number",
            )?
        }
        EnumColumnValidation::Float { min, max } => {
            let rule = match (min, max) {
                (Some(n_min), Some(n_max)) if n_min.is_finite() && n_max.is_finite() => {
                    DataValidationRule::Between(*n_min, *n_max)
                }
                (Some(n_min), None) if n_min.is_finite() => {
                    DataValidationRule::GreaterThanOrEqualTo(*n_min)
                }
                (None, Some(n_max)) if n_max.is_finite() => {
                    DataValidationRule::LessThanOrEqualTo(*n_max)
                }
                _ => DataValidationRule::Between(f64::MIN, f64::MAX),
            };
            set_error_text(
                DataValidation::new().allow_decimal_number(rule),
                "Invalid number",
                "Please enter a number",
            )?
        }
        EnumColumnValidation::Date { min, max } => {
            let rule = match (min, max) {
                (Some(date_min), Some(date_max)) => DataValidationRule::Between(
                    convert_naive_date(date_min)?,
                    convert_naive_date(date_max)?,
                ),
                (None, Some(date_max)) => {
                    DataValidationRule::LessThanOrEqualTo(convert_naive_date(date_max)?)
                }
                (Some(date_min), None) => {
                    DataValidationRule::GreaterThanOrEqualTo(convert_naive_date(date_min)?)
                }
                (None, None) => {
                    let (year, month, day) = TUP_DATE_VALIDATION_MIN;
                    DataValidationRule::GreaterThanOrEqualTo(ExcelDateTime::from_ymd(
                        year, month, day,
                    )?)
                }
            };
            set_error_text(
                DataValidation::new().allow_date(rule),
                "Invalid date",
                "Please enter a date",
            )?
        }
    };
    Ok(Some(dv))
}

fn set_error_text(dv: DataValidation, title: &str, message: &str) -> Result<DataValidation, XlsxError> {
    Ok(dv
        .set_error_title(title)?
        .set_error_message(message)?
        .set_error_style(DataValidationErrorStyle::Warning))
}

fn convert_naive_date(date: &NaiveDate) -> Result<ExcelDateTime, XlsxError> {
    // Out-of-range years map to a value `from_ymd` rejects.
    let year = u16::try_from(date.year()).unwrap_or(u16::MAX);
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
