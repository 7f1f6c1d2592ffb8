//! Spreadsheet export handler: records -> grouped print rows -> workbook -> delivery.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use gridkit_io_xlsx::{
    SpecSheetColumn, SpecXlsxReport, XlsxWriter, derive_records_from_ipc_bytes,
};
use gridkit_report::{GroupedReportBuilder, Record, SpecPrintRow};

use crate::conf::{derive_mime_type, normalize_extension};
use crate::delivery::FileDelivery;
use crate::spec::{
    EnumExportData, ExportError, SpecDeliveredFile, SpecExportOptions, SpecExportReport,
    SpecExportRequest,
};

/// Serves export requests for one family of file extensions.
#[async_trait]
pub trait ExportHandler: Send + Sync {
    /// Export `request`; `Ok(None)` when there was nothing to export.
    async fn export(
        &self,
        request: SpecExportRequest,
    ) -> Result<Option<SpecExportReport>, ExportError>;
}

/// Writes grouped reports as `.xlsx` / `.xls` workbooks.
///
/// `.xls` requests receive the same OOXML payload under the legacy MIME type.
#[derive(Clone)]
pub struct XlsxExporter {
    delivery: Arc<dyn FileDelivery>,
}

impl XlsxExporter {
    pub fn new(delivery: Arc<dyn FileDelivery>) -> Self {
        Self { delivery }
    }
}

#[async_trait]
impl ExportHandler for XlsxExporter {
    async fn export(
        &self,
        request: SpecExportRequest,
    ) -> Result<Option<SpecExportReport>, ExportError> {
        let SpecExportRequest {
            extension,
            name,
            data,
            options,
        } = request;

        let c_extension = normalize_extension(&extension);
        let mime_type = derive_mime_type(&c_extension)
            .ok_or_else(|| ExportError::UnsupportedExtension(extension.clone()))?;

        let l_records = resolve_records(data).await?;

        let builder = GroupedReportBuilder::new()
            .with_styles(options.styles.clone())
            .with_options(options.build.clone());
        let l_rows = builder.build(
            &l_records,
            &options.group_columns,
            &options.group_specs,
            &options.total_columns,
        )?;
        if l_records.is_empty() {
            tracing::info!(name = %name, extension = %c_extension, "no records; export skipped");
            return Ok(None);
        }

        let l_columns = if options.columns.is_empty() {
            derive_columns_from_records(&l_records)
        } else {
            options.columns.clone()
        };
        let (v_bytes, sheet) = render_workbook(&options, &l_columns, &l_rows)?;

        let file_name = format!("{name}.{c_extension}");
        let n_bytes = v_bytes.len();
        self.delivery
            .deliver(SpecDeliveredFile {
                file_name: file_name.clone(),
                mime_type: mime_type.to_string(),
                content: v_bytes,
            })
            .await?;

        tracing::info!(
            file_name = %file_name,
            n_records = l_records.len(),
            n_rows = l_rows.len(),
            n_bytes,
            "export delivered"
        );
        Ok(Some(SpecExportReport {
            file_name,
            mime_type: mime_type.to_string(),
            n_bytes,
            n_records: l_records.len(),
            n_rows: l_rows.len(),
            n_cols: l_columns.len(),
            sheet,
        }))
    }
}

async fn resolve_records(data: EnumExportData) -> Result<Vec<Record>, ExportError> {
    match data {
        EnumExportData::Records(l_records) => Ok(l_records),
        EnumExportData::Ipc(v_ipc_df) => Ok(derive_records_from_ipc_bytes(&v_ipc_df)?),
        EnumExportData::Producer(producer) => producer().await,
    }
}

fn render_workbook(
    options: &SpecExportOptions,
    columns: &[SpecSheetColumn],
    rows: &[SpecPrintRow],
) -> Result<(Vec<u8>, SpecXlsxReport), ExportError> {
    let mut write_options = options.write.clone();
    write_options.header_format = options.styles.header.clone();

    let mut writer = XlsxWriter::new(write_options);
    writer.write_sheet(&options.sheet_name, columns, rows, &options.sheet)?;
    let v_bytes = writer.save_to_buffer()?;
    let sheet = writer.report().into_iter().next().unwrap_or_default();
    Ok((v_bytes, sheet))
}

/// Columns for every key present in any record, in first-seen order.
///
/// Keys of one record come in sorted order; keys first met in later records
/// follow those of earlier records.
fn derive_columns_from_records(records: &[Record]) -> Vec<SpecSheetColumn> {
    let mut set_keys_seen: BTreeSet<&str> = BTreeSet::new();
    let mut l_columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if set_keys_seen.insert(key.as_str()) {
                l_columns.push(SpecSheetColumn::new(key.as_str()));
            }
        }
    }
    l_columns
}
