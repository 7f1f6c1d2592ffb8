//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use gridkit_report::EnumRecordValue;
use rust_xlsxwriter::{ExcelDateTime, XlsxError};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_LIST_LITERAL_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecSheetColumn, SpecSheetSlice, SpecXlsxReport, SpecXlsxValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Normalize one record value for cell output.
///
/// Non-finite numbers become policy text. In date columns, finite numbers are
/// read as epoch milliseconds. Nested objects become JSON text.
pub fn convert_record_value(
    value: &EnumRecordValue,
    if_is_date_col: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> EnumCellValue {
    match value {
        EnumRecordValue::Null => EnumCellValue::None,
        EnumRecordValue::Bool(val) => EnumCellValue::Bool(*val),
        EnumRecordValue::Number(val) => {
            if let Ok(c_text) = convert_nan_inf_to_str(*val, value_policy) {
                return EnumCellValue::String(c_text);
            }
            if if_is_date_col && let Some(dt) = convert_epoch_millis_to_datetime(*val) {
                return EnumCellValue::DateTime(dt);
            }
            EnumCellValue::Number(*val)
        }
        EnumRecordValue::String(val) => EnumCellValue::String(val.clone()),
        EnumRecordValue::DateTime(val) => EnumCellValue::DateTime(*val),
        EnumRecordValue::Object(_) => {
            EnumCellValue::String(serde_json::to_string(value).unwrap_or_default())
        }
    }
}

/// Interpret `millis` as a Unix epoch timestamp in milliseconds (UTC).
pub fn convert_epoch_millis_to_datetime(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64).map(|dt| dt.naive_utc())
}

/// Convert a chrono date-time to an Excel serial date-time.
///
/// Fails for dates Excel cannot represent (before 1900 or after 9999).
pub fn convert_naive_datetime(value: &NaiveDateTime) -> Result<ExcelDateTime, XlsxError> {
    // Out-of-range years map to a value `from_ymd` rejects.
    let year = u16::try_from(value.year()).unwrap_or(u16::MAX);
    let n_seconds = value.second() as f64 + value.nanosecond() as f64 / 1_000_000_000.0;

    ExcelDateTime::from_ymd(year, value.month() as u8, value.day() as u8)?.and_hms(
        value.hour() as u16,
        value.minute() as u8,
        n_seconds,
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no duplicated keys.
pub fn validate_unique_columns(columns: &[SpecSheetColumn]) -> Result<(), String> {
    if columns.len()
        == columns
            .iter()
            .map(|column| column.key.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, column) in columns.iter().enumerate() {
        dict_pos.entry(column.key.as_str()).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column keys detected: {c_msg}"))
}

/// Convert a zero-based column index to Excel's A1 column letters.
///
/// `0 -> "A"`, `25 -> "Z"`, `26 -> "AA"`.
pub fn derive_excel_col_letter(col_idx: usize) -> String {
    let mut l_letters = Vec::with_capacity(3);
    let mut n_idx = col_idx + 1;
    while n_idx > 0 {
        let n_rem = (n_idx - 1) % 26;
        l_letters.push((b'A' + n_rem as u8) as char);
        n_idx = (n_idx - 1) / 26;
    }
    l_letters.iter().rev().collect()
}

/// Whether `values` fit an inline list validation.
pub fn is_list_literal_fit(values: &[String]) -> bool {
    let n_len_joined =
        values.iter().map(|val| val.chars().count()).sum::<usize>() + values.len().saturating_sub(1);
    n_len_joined <= N_LEN_LIST_LITERAL_MAX && values.iter().all(|val| !val.contains(','))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split body rows into Excel-compliant sheet slices.
///
/// Column overflow is an error: an export never spreads one record across
/// sheets.
pub fn plan_sheet_slices(
    height_body: usize,
    width: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    if width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Too many columns: width={width} exceeds Excel limit {N_NCOLS_EXCEL_MAX}."
        ));
    }

    let n_rows_data_max = N_NROWS_EXCEL_MAX
        .checked_sub(height_header)
        .filter(|n_max| *n_max > 0)
        .ok_or_else(|| {
            format!("Header too tall: height_header={height_header} exceeds Excel limit.")
        })?;

    let mut l_row_slices = Vec::new();
    let mut n_row_start = 0;
    while n_row_start < height_body {
        let n_row_end = usize::min(height_body, n_row_start + n_rows_data_max);
        l_row_slices.push((n_row_start, n_row_end));
        n_row_start = n_row_end;
    }

    if l_row_slices.is_empty() {
        l_row_slices.push((0, 0));
    }

    let n_parts_total = l_row_slices.len();
    let l_sheet_parts: Vec<SpecSheetSlice> = l_row_slices
        .into_iter()
        .enumerate()
        .map(|(n_idx, (row_start, row_end))| SpecSheetSlice {
            sheet_name: if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx + 1)
            },
            row_start_inclusive: row_start,
            row_end_exclusive: row_end,
        })
        .collect();

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: split into {n_parts_total} sheets by rows."
        ));
    }

    Ok(l_sheet_parts)
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sanitize_sheet_name_replaces_illegal_chars() {
        assert_eq!(sanitize_sheet_name(" a/b:c ", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_plan_sheet_slices_splits_rows_beyond_excel_limit() {
        let mut report = SpecXlsxReport::default();
        let l_slices =
            plan_sheet_slices(N_NROWS_EXCEL_MAX + 10, 3, 1, "data", &mut report).expect("plan");

        assert_eq!(l_slices.len(), 2);
        assert_eq!(l_slices[0].sheet_name, "data_1");
        assert_eq!(l_slices[0].row_end_exclusive, N_NROWS_EXCEL_MAX - 1);
        assert_eq!(l_slices[1].row_end_exclusive, N_NROWS_EXCEL_MAX + 10);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_plan_sheet_slices_keeps_empty_body_sheet() {
        let mut report = SpecXlsxReport::default();
        let l_slices = plan_sheet_slices(0, 3, 1, "data", &mut report).expect("plan");
        assert_eq!(l_slices.len(), 1);
        assert_eq!(l_slices[0].sheet_name, "data");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_plan_sheet_slices_rejects_too_many_columns() {
        let mut report = SpecXlsxReport::default();
        assert!(plan_sheet_slices(1, N_NCOLS_EXCEL_MAX + 1, 1, "data", &mut report).is_err());
    }

    #[test]
    fn test_derive_excel_col_letter() {
        assert_eq!(derive_excel_col_letter(0), "A");
        assert_eq!(derive_excel_col_letter(25), "Z");
        assert_eq!(derive_excel_col_letter(26), "AA");
        assert_eq!(derive_excel_col_letter(701), "ZZ");
    }

    #[test]
    fn test_is_list_literal_fit() {
        assert!(is_list_literal_fit(&["a".to_string(), "b".to_string()]));
        assert!(!is_list_literal_fit(&["a,b".to_string()]));
        assert!(!is_list_literal_fit(&["x".repeat(256)]));
    }

    #[test]
    fn test_convert_epoch_millis_to_datetime() {
        let dt = convert_epoch_millis_to_datetime(86_400_000.0).expect("valid timestamp");
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(1970, 1, 2)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("date")
        );
        assert!(convert_epoch_millis_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_convert_record_value_by_kind() {
        let value_policy = SpecXlsxValuePolicy::default();

        assert_eq!(
            convert_record_value(&EnumRecordValue::Null, false, &value_policy),
            EnumCellValue::None
        );
        assert_eq!(
            convert_record_value(&EnumRecordValue::Number(f64::NAN), false, &value_policy),
            EnumCellValue::String("NaN".to_string())
        );
        assert_eq!(
            convert_record_value(&EnumRecordValue::Number(86_400_000.0), false, &value_policy),
            EnumCellValue::Number(86_400_000.0)
        );
        assert!(
            convert_record_value(&EnumRecordValue::Number(86_400_000.0), true, &value_policy)
                .is_date()
        );

        let value_nested = EnumRecordValue::from(serde_json::json!({"code": "x"}));
        assert_eq!(
            convert_record_value(&value_nested, false, &value_policy),
            EnumCellValue::String(r#"{"code":"x"}"#.to_string())
        );
    }

    #[test]
    fn test_validate_unique_columns_reports_duplicates() {
        let columns = vec![
            SpecSheetColumn::new("a"),
            SpecSheetColumn::new("b"),
            SpecSheetColumn::new("a"),
        ];
        let err = validate_unique_columns(&columns).expect_err("duplicate key");
        assert!(err.contains("\"a\" x2"));
    }
}
