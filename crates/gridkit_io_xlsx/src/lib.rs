//! `gridkit_io_xlsx` v1:
//! Spreadsheet sink writing styled print rows into XLSX workbooks.
//!
//! Modules:
//! - `conf`       : constants and default presets
//! - `ingest`     : Polars DataFrame / IPC to records
//! - `spec`       : columns/options/reports/errors
//! - `util`       : pure helper functions
//! - `validation` : per-column data validation and the lookup sheet
//! - `writer`     : workbook writer kernel
pub mod conf;
pub mod ingest;
pub mod spec;
pub mod util;
pub mod validation;
pub mod writer;

pub use conf::{
    C_MIME_XLS, C_MIME_XLSX, C_SHEET_NAME_LOOKUP, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use ingest::{derive_records_from_dataframe, derive_records_from_ipc_bytes};
pub use spec::{
    EnumCellValue, EnumColumnValidation, SpecSheetColumn, SpecSheetSlice, SpecXlsxReport,
    SpecXlsxSheetWriteOptions, SpecXlsxValuePolicy, SpecXlsxWriteOptions, XlsxSinkError,
};
pub use util::{convert_nan_inf_to_str, plan_sheet_slices, sanitize_sheet_name};
pub use validation::{SpecLookupLists, derive_data_validation};
pub use writer::XlsxWriter;
