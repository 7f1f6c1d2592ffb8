//! File delivery targets for serialized exports.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::fs;

use crate::spec::{ExportError, SpecDeliveredFile};

/// Receives a fully serialized export file.
#[async_trait]
pub trait FileDelivery: Send + Sync {
    /// Hand over one file.
    async fn deliver(&self, file: SpecDeliveredFile) -> Result<(), ExportError>;
}

/// Writes delivered files into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryFileDelivery {
    path_dir_out: PathBuf,
}

impl DirectoryFileDelivery {
    /// Deliver into `path_dir_out`, created on first delivery if missing.
    pub fn new(path_dir_out: impl Into<PathBuf>) -> Self {
        Self {
            path_dir_out: path_dir_out.into(),
        }
    }
}

#[async_trait]
impl FileDelivery for DirectoryFileDelivery {
    async fn deliver(&self, file: SpecDeliveredFile) -> Result<(), ExportError> {
        validate_file_name(&file.file_name)?;

        fs::create_dir_all(&self.path_dir_out).await?;
        let path_file_out = self.path_dir_out.join(&file.file_name);
        fs::write(&path_file_out, &file.content).await?;
        tracing::debug!(
            path = %path_file_out.display(),
            n_bytes = file.content.len(),
            "file delivered"
        );
        Ok(())
    }
}

/// Accept only a single plain path component, so files stay inside the target directory.
fn validate_file_name(file_name: &str) -> Result<(), ExportError> {
    let mut l_components = Path::new(file_name).components();
    match (l_components.next(), l_components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ExportError::Delivery(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("file name must be a single path component: {file_name:?}"),
        ))),
    }
}

/// Keeps delivered files in memory.
#[derive(Debug, Default)]
pub struct MemoryFileDelivery {
    l_files: Mutex<Vec<SpecDeliveredFile>>,
}

impl MemoryFileDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered files, in delivery order.
    pub fn files(&self) -> Vec<SpecDeliveredFile> {
        self.l_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl FileDelivery for MemoryFileDelivery {
    async fn deliver(&self, file: SpecDeliveredFile) -> Result<(), ExportError> {
        self.l_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file);
        Ok(())
    }
}
