//! `gridkit_export` v1:
//! Export handlers wiring the grouped report builder to the XLSX sink.
//!
//! Modules:
//! - `conf`     : extension and MIME constants
//! - `delivery` : file delivery targets
//! - `exporter` : spreadsheet export handler
//! - `registry` : extension-keyed handler registry
//! - `spec`     : requests/options/reports/errors
pub mod conf;
pub mod delivery;
pub mod exporter;
pub mod registry;
pub mod spec;

pub use conf::{C_SHEET_NAME_DEFAULT, derive_mime_type};
pub use delivery::{DirectoryFileDelivery, FileDelivery, MemoryFileDelivery};
pub use exporter::{ExportHandler, XlsxExporter};
pub use registry::{ExportRegistry, register_xlsx_exporters};
pub use spec::{
    EnumExportData, ExportError, RecordProducer, SpecDeliveredFile, SpecExportOptions,
    SpecExportReport, SpecExportRequest,
};
