//! Persistence of the bundle at its fixed location.

use crate::export::bundle::InvestigationBundle;
use crate::export::ExportError;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name used for the persisted bundle.
pub const BUNDLE_FILE_NAME: &str = "investigation_log.json";

/// Reads and writes the bundle file. Each save overwrites the previous one.
#[derive(Debug, Clone)]
pub struct BundleStore {
    path: PathBuf,
}

impl BundleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the bundle as [`BUNDLE_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(BUNDLE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Serialize and write the bundle, replacing any earlier file.
    pub fn save(&self, bundle: &InvestigationBundle) -> Result<(), ExportError> {
        let json = bundle
            .to_json()
            .map_err(|e| ExportError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::io(&self.path, e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| ExportError::io(&self.path, e))?;

        info!(path = ?self.path, photos = bundle.photos_count, "Bundle saved");
        Ok(())
    }

    /// Raw bytes of the persisted file.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if !self.exists() {
            return Err(ExportError::Missing(self.path.clone()));
        }
        std::fs::read(&self.path).map_err(|e| ExportError::io(&self.path, e))
    }

    /// Parse the persisted file back into a bundle.
    pub fn load(&self) -> Result<InvestigationBundle, ExportError> {
        let bytes = self.read_bytes()?;
        serde_json::from_slice(&bytes).map_err(|e| ExportError::Serialization(e.to_string()))
    }
}
