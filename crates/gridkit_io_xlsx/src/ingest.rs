//! Polars DataFrame ingestion into report records.

use std::io::Cursor;

use gridkit_report::{EnumRecordValue, Record};
use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::spec::XlsxSinkError;

/// Convert every DataFrame row into a record keyed by column name.
pub fn derive_records_from_dataframe(df: &DataFrame) -> Result<Vec<Record>, XlsxSinkError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_records = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut record = Record::new();
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            let value = col.get(n_idx_row).map_err(|err| {
                XlsxSinkError::DataFrame(format!("Failed to access cell value: {err}"))
            })?;
            record.insert(c_name.clone(), derive_record_value_from_any_value(value));
        }
        l_records.push(record);
    }

    tracing::debug!(
        n_rows = l_records.len(),
        n_cols = l_colnames.len(),
        "dataframe ingested"
    );
    Ok(l_records)
}

/// Read a Polars IPC payload and convert it into records.
pub fn derive_records_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Vec<Record>, XlsxSinkError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    derive_records_from_dataframe(&df)
}

fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, XlsxSinkError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| XlsxSinkError::DataFrame(format!("Failed to read IPC DataFrame bytes: {err}")))
}

fn derive_record_value_from_any_value(value: AnyValue<'_>) -> EnumRecordValue {
    match value {
        AnyValue::Null => EnumRecordValue::Null,
        AnyValue::String(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumRecordValue::Bool(val),
        AnyValue::UInt8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int128(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Float32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Float64(val) => EnumRecordValue::Number(val),
        _ => EnumRecordValue::String(value.to_string()),
    }
}
