//! XLSX constants and default preset factories.

use gridkit_report::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Excel limit on the comma-joined source of an inline list validation.
pub const N_LEN_LIST_LITERAL_MAX: usize = 255;
/// Name of the hidden worksheet holding dropdown lookup values.
pub const C_SHEET_NAME_LOOKUP: &str = "__lists__";
/// Number format of date-time cells without an explicit format.
pub const C_NUM_FORMAT_DATE: &str = "yyyy-mm-dd";

/// Earliest date accepted by default date validation (year, month, day).
pub const TUP_DATE_VALIDATION_MIN: (u16, u8, u8) = (1900, 1, 1);

/// MIME type of `.xlsx` payloads.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// MIME type of `.xls` payloads.
pub const C_MIME_XLS: &str = "application/vnd.ms-excel";

/// Base format applied under every body cell.
pub fn derive_default_base_format() -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    }
}

