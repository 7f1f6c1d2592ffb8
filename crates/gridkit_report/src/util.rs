//! Stateless helpers used by the grouped report builder.

use crate::conf::{N_BORDER_NONE, N_BORDER_THIN};
use crate::spec::{EnumRecordValue, Record, SpecCellBorder, SpecPrintRow};

////////////////////////////////////////////////////////////////////////////////
// #region NumericParsing

/// Parse the longest leading decimal literal of `text`.
///
/// Leading whitespace is skipped and trailing garbage ignored, so `"12kg"`
/// yields `12.0`. `"Infinity"` (optionally signed) is accepted. Returns `None`
/// when no digits lead the text.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let c_text = text.trim_start();
    let v_bytes = c_text.as_bytes();
    let n_len = v_bytes.len();

    let mut n_end = 0;
    let mut if_negative = false;
    if n_end < n_len && (v_bytes[n_end] == b'+' || v_bytes[n_end] == b'-') {
        if_negative = v_bytes[n_end] == b'-';
        n_end += 1;
    }

    if c_text[n_end..].starts_with("Infinity") {
        return Some(if if_negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let n_idx_digits_start = n_end;
    while n_end < n_len && v_bytes[n_end].is_ascii_digit() {
        n_end += 1;
    }
    let mut n_digits = n_end - n_idx_digits_start;

    if n_end < n_len && v_bytes[n_end] == b'.' {
        n_end += 1;
        let n_idx_fraction_start = n_end;
        while n_end < n_len && v_bytes[n_end].is_ascii_digit() {
            n_end += 1;
        }
        n_digits += n_end - n_idx_fraction_start;
    }

    if n_digits == 0 {
        return None;
    }

    if n_end < n_len && (v_bytes[n_end] == b'e' || v_bytes[n_end] == b'E') {
        let mut n_idx_exp = n_end + 1;
        if n_idx_exp < n_len && (v_bytes[n_idx_exp] == b'+' || v_bytes[n_idx_exp] == b'-') {
            n_idx_exp += 1;
        }
        let n_idx_exp_digits_start = n_idx_exp;
        while n_idx_exp < n_len && v_bytes[n_idx_exp].is_ascii_digit() {
            n_idx_exp += 1;
        }
        if n_idx_exp > n_idx_exp_digits_start {
            n_end = n_idx_exp;
        }
    }

    c_text[..n_end].parse::<f64>().ok()
}

/// Numeric contribution of one value to a subtotal; unparsable values count as 0.
pub fn convert_value_to_addend(value: &EnumRecordValue) -> f64 {
    let n_value = match value {
        EnumRecordValue::Number(n) => *n,
        EnumRecordValue::String(s) => parse_float_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if n_value.is_nan() { 0.0 } else { n_value }
}

/// Sum `column` over `records`; records without the column contribute 0.
pub fn sum_total_column(records: &[&Record], column: &str) -> f64 {
    records
        .iter()
        .filter_map(|record| record.get(column))
        .map(convert_value_to_addend)
        .sum()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Partitioning

/// Split `records` into runs sharing the same `column` value.
///
/// Partitions keep first-occurrence order and records keep input order
/// within a partition. Keys compare by exact value equality; a missing
/// column groups as `Null`.
pub fn partition_records_by_column(records: Vec<Record>, column: &str) -> Vec<Vec<Record>> {
    let mut l_partitions: Vec<(EnumRecordValue, Vec<Record>)> = Vec::new();

    for record in records {
        let value_key = record.get(column).cloned().unwrap_or_default();
        match l_partitions.iter_mut().find(|(key, _)| *key == value_key) {
            Some((_, l_records)) => l_records.push(record),
            None => l_partitions.push((value_key, vec![record])),
        }
    }

    l_partitions
        .into_iter()
        .map(|(_, l_records)| l_records)
        .collect()
}

/// Clear `column` on every row except the first, keeping only first-row text.
pub fn apply_column_blankout(rows: &mut [SpecPrintRow], column: &str) {
    for row in rows.iter_mut().skip(1) {
        row.data.insert(column.to_string(), EnumRecordValue::blank());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RunBorders

/// Border of row `row_idx` inside a vertical run of `n_rows` rows.
///
/// Only the first row draws a top edge and only the last row a bottom edge,
/// so the run reads as one merged block.
pub fn derive_run_border(row_idx: usize, n_rows: usize) -> SpecCellBorder {
    SpecCellBorder {
        top: if row_idx == 0 {
            N_BORDER_THIN
        } else {
            N_BORDER_NONE
        },
        bottom: if row_idx + 1 == n_rows {
            N_BORDER_THIN
        } else {
            N_BORDER_NONE
        },
        left: N_BORDER_THIN,
        right: N_BORDER_THIN,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(region: &str, amt: f64) -> Record {
        Record::from([
            ("region".to_string(), EnumRecordValue::from(region)),
            ("amt".to_string(), EnumRecordValue::from(amt)),
        ])
    }

    #[test]
    fn test_parse_float_prefix_follows_leading_literal() {
        assert_eq!(parse_float_prefix("12"), Some(12.0));
        assert_eq!(parse_float_prefix("  3.5kg"), Some(3.5));
        assert_eq!(parse_float_prefix("-.5"), Some(-0.5));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_convert_value_to_addend_treats_non_numeric_as_zero() {
        assert_eq!(convert_value_to_addend(&EnumRecordValue::from("n/a")), 0.0);
        assert_eq!(convert_value_to_addend(&EnumRecordValue::Bool(true)), 0.0);
        assert_eq!(convert_value_to_addend(&EnumRecordValue::Null), 0.0);
        assert_eq!(convert_value_to_addend(&EnumRecordValue::Number(f64::NAN)), 0.0);
        assert_eq!(convert_value_to_addend(&EnumRecordValue::from("7.25")), 7.25);
    }

    #[test]
    fn test_partition_records_keeps_first_seen_order() {
        let records = vec![
            make_record("W", 1.0),
            make_record("E", 2.0),
            make_record("W", 3.0),
        ];

        let l_partitions = partition_records_by_column(records, "region");

        assert_eq!(l_partitions.len(), 2);
        assert_eq!(l_partitions[0].len(), 2);
        assert_eq!(l_partitions[0][1]["amt"], EnumRecordValue::Number(3.0));
        assert_eq!(l_partitions[1][0]["region"], EnumRecordValue::from("E"));
    }

    #[test]
    fn test_partition_records_does_not_normalize_keys() {
        let records = vec![
            make_record("e", 1.0),
            make_record("E", 2.0),
            Record::from([("region".to_string(), EnumRecordValue::from(1.0))]),
            Record::from([("region".to_string(), EnumRecordValue::from("1"))]),
        ];

        assert_eq!(partition_records_by_column(records, "region").len(), 4);
    }

    #[test]
    fn test_sum_total_column_skips_missing_fields() {
        let record_a = make_record("E", 10.0);
        let record_b = Record::from([("region".to_string(), EnumRecordValue::from("E"))]);

        assert_eq!(sum_total_column(&[&record_a, &record_b], "amt"), 10.0);
    }

    #[test]
    fn test_derive_run_border() {
        assert_eq!(derive_run_border(0, 1).top, N_BORDER_THIN);
        assert_eq!(derive_run_border(0, 1).bottom, N_BORDER_THIN);
        assert_eq!(derive_run_border(0, 3).bottom, N_BORDER_NONE);
        assert_eq!(derive_run_border(1, 3).top, N_BORDER_NONE);
        assert_eq!(derive_run_border(1, 3).bottom, N_BORDER_NONE);
        assert_eq!(derive_run_border(2, 3).bottom, N_BORDER_THIN);
    }
}
