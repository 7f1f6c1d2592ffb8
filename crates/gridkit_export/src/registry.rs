//! Extension-keyed registry of export handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::conf::{TUP_EXTENSIONS_XLSX, normalize_extension};
use crate::delivery::FileDelivery;
use crate::exporter::{ExportHandler, XlsxExporter};
use crate::spec::{ExportError, SpecExportReport, SpecExportRequest};

/// Maps file extensions (case-insensitive) to export handlers.
#[derive(Clone, Default)]
pub struct ExportRegistry {
    dict_handlers: HashMap<String, Arc<dyn ExportHandler>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `extension`, replacing any previous handler.
    pub fn register(&mut self, extension: &str, handler: Arc<dyn ExportHandler>) {
        let c_extension = normalize_extension(extension);
        tracing::debug!(extension = %c_extension, "export handler registered");
        self.dict_handlers.insert(c_extension, handler);
    }

    /// Handler registered for `extension`.
    pub fn get(&self, extension: &str) -> Option<Arc<dyn ExportHandler>> {
        self.dict_handlers
            .get(&normalize_extension(extension))
            .cloned()
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut l_extensions: Vec<String> = self.dict_handlers.keys().cloned().collect();
        l_extensions.sort();
        l_extensions
    }

    /// Dispatch `request` to the handler of its extension.
    pub async fn export(
        &self,
        request: SpecExportRequest,
    ) -> Result<Option<SpecExportReport>, ExportError> {
        let handler = self
            .get(&request.extension)
            .ok_or_else(|| ExportError::UnsupportedExtension(request.extension.clone()))?;
        handler.export(request).await
    }
}

/// Install the spreadsheet exporter for every spreadsheet extension.
pub fn register_xlsx_exporters(registry: &mut ExportRegistry, delivery: Arc<dyn FileDelivery>) {
    let handler: Arc<dyn ExportHandler> = Arc::new(XlsxExporter::new(delivery));
    for extension in TUP_EXTENSIONS_XLSX {
        registry.register(extension, handler.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DirectoryFileDelivery;
    use crate::spec::{EnumExportData, SpecExportOptions};

    fn make_request(extension: &str, name: &str) -> SpecExportRequest {
        let data = EnumExportData::from_json(serde_json::json!([
            {"name": "a", "qty": 1},
            {"name": "b", "qty": 2},
        ]))
        .expect("data");
        SpecExportRequest {
            extension: extension.to_string(),
            name: name.to_string(),
            data,
            options: SpecExportOptions::default(),
        }
    }

    #[test]
    fn test_register_xlsx_exporters_installs_both_extensions() {
        let mut registry = ExportRegistry::new();
        register_xlsx_exporters(
            &mut registry,
            Arc::new(DirectoryFileDelivery::new(std::env::temp_dir())),
        );

        assert_eq!(registry.extensions(), vec!["xls", "xlsx"]);
        assert!(registry.get("XLSX").is_some());
        assert!(registry.get(".xls").is_some());
        assert!(registry.get("csv").is_none());
    }

    #[tokio::test]
    async fn test_registry_dispatches_to_directory_delivery() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut registry = ExportRegistry::new();
        register_xlsx_exporters(
            &mut registry,
            Arc::new(DirectoryFileDelivery::new(dir.path())),
        );

        let report = registry
            .export(make_request("Xlsx", "plain"))
            .await
            .expect("export")
            .expect("report");

        assert_eq!(report.n_rows, 2);
        assert!(dir.path().join("plain.xlsx").exists());
    }

    #[tokio::test]
    async fn test_registry_keeps_exports_inside_delivery_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut registry = ExportRegistry::new();
        register_xlsx_exporters(
            &mut registry,
            Arc::new(DirectoryFileDelivery::new(dir.path().join("out"))),
        );

        let err = registry
            .export(make_request("xlsx", "../escaped"))
            .await
            .expect_err("name leaves the directory");

        assert!(matches!(err, ExportError::Delivery(_)));
        assert!(!dir.path().join("escaped.xlsx").exists());
    }

    #[tokio::test]
    async fn test_registry_rejects_unknown_extension() {
        let registry = ExportRegistry::new();
        let err = registry
            .export(SpecExportRequest {
                extension: "pdf".to_string(),
                name: "x".to_string(),
                data: EnumExportData::Records(vec![]),
                options: SpecExportOptions::default(),
            })
            .await
            .expect_err("unknown extension");
        assert!(matches!(err, ExportError::UnsupportedExtension(ext) if ext == "pdf"));
    }
}
