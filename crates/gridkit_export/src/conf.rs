//! Export constants.

use gridkit_io_xlsx::{C_MIME_XLS, C_MIME_XLSX};

/// Sheet name used when options leave it empty.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";

/// Extensions served by the spreadsheet exporter.
pub const TUP_EXTENSIONS_XLSX: [&str; 2] = ["xlsx", "xls"];

/// Normalize an extension key: trimmed, without leading dot, lowercase.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// MIME type of a spreadsheet extension.
pub fn derive_mime_type(extension: &str) -> Option<&'static str> {
    match normalize_extension(extension).as_str() {
        "xlsx" => Some(C_MIME_XLSX),
        "xls" => Some(C_MIME_XLS),
        _ => None,
    }
}
