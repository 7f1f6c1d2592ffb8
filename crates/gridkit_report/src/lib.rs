//! `gridkit_report` v1:
//! Grouped report kernel turning flat records into styled print rows.
//!
//! Modules:
//! - `builder` : grouping recursion, subtotal synthesis, style assignment
//! - `conf`    : style constants and default presets
//! - `spec`    : records/schema/styles/errors
//! - `util`    : pure helper functions
pub mod builder;
pub mod conf;
pub mod spec;
pub mod util;

pub use builder::{GroupedReportBuilder, SpecStripeState, build_grouped_rows};
pub use conf::derive_default_report_styles;
pub use spec::{
    EnumGroupOrder, EnumPrintRowKind, EnumRecordValue, EnumValueKind, Record, ReportError,
    SpecBuildOptions, SpecCellBorder, SpecCellFormat, SpecGroupSpec, SpecPrintRow,
    SpecRecordSchema, SpecReportStyles, SpecRowStyle, SpecSchemaField, derive_records_from_json,
};
pub use util::{parse_float_prefix, partition_records_by_column, sum_total_column};
