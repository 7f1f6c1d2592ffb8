//! Sheet, column and write-option specification models.

use chrono::{NaiveDate, NaiveDateTime};
use gridkit_report::{SpecCellFormat, derive_default_report_styles};
use rust_xlsxwriter::XlsxError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{C_NUM_FORMAT_DATE, derive_default_base_format};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpecification

/// Per-column data validation, selected by declared column type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnumColumnValidation {
    /// Free text, no validation.
    #[default]
    Text,
    /// Dropdown of fixed values.
    Array {
        /// Allowed values, in display order.
        values: Vec<String>,
        /// Always reference the hidden lookup sheet instead of an inline list.
        #[serde(default)]
        if_lookup_sheet: bool,
    },
    /// Whole number.
    Int {
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<i32>,
        /// Inclusive upper bound.
        #[serde(default)]
        max: Option<i32>,
    },
    /// Decimal number.
    Float {
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default)]
        max: Option<f64>,
    },
    /// Date; numeric cell values are read as epoch milliseconds.
    Date {
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<NaiveDate>,
        /// Inclusive upper bound.
        #[serde(default)]
        max: Option<NaiveDate>,
    },
}

impl EnumColumnValidation {
    /// Whether column holds dates.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date { .. })
    }
}

/// One output column: header label, record key, width and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecSheetColumn {
    /// Header label.
    pub header: String,
    /// Record key read for each cell.
    pub key: String,
    /// Column width in character units; default width when `None`.
    #[serde(default)]
    pub width: Option<f64>,
    /// Data validation.
    #[serde(default)]
    pub validation: EnumColumnValidation,
}

impl SpecSheetColumn {
    /// Text column whose header equals its key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            header: key.clone(),
            key,
            width: None,
            validation: EnumColumnValidation::Text,
        }
    }

    /// Replace header label.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set column width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set data validation.
    pub fn with_validation(mut self, validation: EnumColumnValidation) -> Self {
        self.validation = validation;
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Text written in place of non-finite numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecXlsxWriteOptions {
    /// Format underlying every body cell; row styles are merged on top.
    pub base_format: SpecCellFormat,
    /// Header cell format.
    pub header_format: SpecCellFormat,
    /// Number format of date cells lacking one.
    pub num_format_date: String,
    /// Freeze rows above the first data row.
    pub if_freeze_header: bool,
    /// Non-finite number replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            base_format: derive_default_base_format(),
            header_format: derive_default_report_styles().header,
            num_format_date: C_NUM_FORMAT_DATE.to_string(),
            if_freeze_header: true,
            value_policy: SpecXlsxValuePolicy::default(),
        }
    }
}

/// Per-sheet call options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecXlsxSheetWriteOptions {
    /// Number of frozen columns.
    pub col_freeze: usize,
    /// Frozen row index; defaults to the header height when header freezing is on.
    pub row_freeze: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized value ready for one worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Blank cell.
    None,
    /// Text cell.
    String(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date-time cell.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// Whether value needs a date number format.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Number of body rows written across all slices.
    pub fn n_rows(&self) -> usize {
        self.sheets
            .iter()
            .map(|slice| slice.row_end_exclusive - slice.row_start_inclusive)
            .sum()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Spreadsheet sink failures.
#[derive(Debug, Error)]
pub enum XlsxSinkError {
    /// Workbook/worksheet operation failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// DataFrame ingestion failed.
    #[error("dataframe read error: {0}")]
    DataFrame(String),
    /// Caller-provided sheet layout is invalid.
    #[error("invalid sheet layout: {0}")]
    InvalidLayout(String),
    /// Writer was already saved.
    #[error("Cannot write after the workbook was saved.")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
