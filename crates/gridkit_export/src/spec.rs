//! Export request, options, report and error models.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use gridkit_io_xlsx::{
    SpecSheetColumn, SpecXlsxReport, SpecXlsxSheetWriteOptions, SpecXlsxWriteOptions,
    XlsxSinkError,
};
use gridkit_report::{
    Record, ReportError, SpecBuildOptions, SpecGroupSpec, SpecReportStyles,
    derive_records_from_json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::C_SHEET_NAME_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region ExportData

/// Deferred record source awaited before the report is built.
pub type RecordProducer =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<Vec<Record>, ExportError>> + Send>;

/// Records to export, given directly or produced on demand.
pub enum EnumExportData {
    /// Records in memory.
    Records(Vec<Record>),
    /// Polars IPC payload.
    Ipc(Vec<u8>),
    /// Zero-argument asynchronous producer.
    Producer(RecordProducer),
}

impl EnumExportData {
    /// Wrap an async closure as a record producer.
    pub fn from_producer<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<Record>, ExportError>> + Send + 'static,
    {
        Self::Producer(Box::new(move || producer().boxed()))
    }

    /// Records from a JSON array of objects.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ExportError> {
        derive_records_from_json(value)
            .map(Self::Records)
            .map_err(ExportError::DataSource)
    }
}

impl fmt::Debug for EnumExportData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Records(l_records) => f.debug_tuple("Records").field(&l_records.len()).finish(),
            Self::Ipc(v_ipc_df) => f.debug_tuple("Ipc").field(&v_ipc_df.len()).finish(),
            Self::Producer(_) => f.write_str("Producer"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Layout and grouping options of one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecExportOptions {
    /// Target sheet name.
    pub sheet_name: String,
    /// Output columns; when empty, every record key in first-seen order.
    pub columns: Vec<SpecSheetColumn>,
    /// Grouping columns, outermost first.
    pub group_columns: Vec<String>,
    /// One spec per grouping column.
    pub group_specs: Vec<SpecGroupSpec>,
    /// Columns summed into subtotal rows.
    pub total_columns: Vec<String>,
    /// Builder options.
    pub build: SpecBuildOptions,
    /// Row style presets; `styles.header` also formats the sheet header.
    pub styles: SpecReportStyles,
    /// Workbook-wide write options.
    pub write: SpecXlsxWriteOptions,
    /// Per-sheet write options.
    pub sheet: SpecXlsxSheetWriteOptions,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            columns: vec![],
            group_columns: vec![],
            group_specs: vec![],
            total_columns: vec![],
            build: SpecBuildOptions::default(),
            styles: SpecReportStyles::default(),
            write: SpecXlsxWriteOptions::default(),
            sheet: SpecXlsxSheetWriteOptions::default(),
        }
    }
}

impl SpecExportOptions {
    /// Parse options from JSON; omitted fields keep their defaults.
    pub fn from_json_str(c_json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(c_json)?)
    }
}

/// One export call.
#[derive(Debug)]
pub struct SpecExportRequest {
    /// Target file extension (`xlsx`, `xls`).
    pub extension: String,
    /// Output file stem.
    pub name: String,
    /// Records to export.
    pub data: EnumExportData,
    /// Layout and grouping options.
    pub options: SpecExportOptions,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportReport

/// Serialized file handed to a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDeliveredFile {
    /// File name including extension.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// File bytes.
    pub content: Vec<u8>,
}

/// Outcome of one delivered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportReport {
    /// Delivered file name.
    pub file_name: String,
    /// Delivered MIME type.
    pub mime_type: String,
    /// Size of the delivered file.
    pub n_bytes: usize,
    /// Number of input records.
    pub n_records: usize,
    /// Number of print rows written, subtotals included.
    pub n_rows: usize,
    /// Number of sheet columns written.
    pub n_cols: usize,
    /// Sink report of the written sheet.
    pub sheet: SpecXlsxReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Grouping configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ReportError),
    /// Options JSON could not be parsed.
    #[error("invalid export options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
    /// Spreadsheet sink failed.
    #[error(transparent)]
    Sink(#[from] XlsxSinkError),
    /// File delivery failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] std::io::Error),
    /// Record producer failed.
    #[error("data source failed: {0}")]
    DataSource(String),
    /// No handler serves the extension.
    #[error("unsupported export extension: {0:?}")]
    UnsupportedExtension(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
