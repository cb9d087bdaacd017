//! Handing the persisted bundle to a sharing facility.

use crate::export::store::BundleStore;
use crate::export::ExportError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Something that can receive a file to share.
pub trait ShareTarget {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn share(&self, file: &Path) -> Result<(), ExportError>;
}

/// Share the persisted bundle. Fails with [`ExportError::Missing`] when
/// nothing has been saved yet; the target is not invoked in that case.
pub fn share_bundle<T: ShareTarget + ?Sized>(
    store: &BundleStore,
    target: &T,
) -> Result<(), ExportError> {
    if !store.exists() {
        return Err(ExportError::Missing(store.path().to_path_buf()));
    }
    target.share(store.path())?;
    info!(target = target.name(), path = ?store.path(), "Bundle shared");
    Ok(())
}

/// Opens the file with the desktop's default handler.
#[derive(Debug, Clone, Default)]
pub struct OpenerShare;

impl ShareTarget for OpenerShare {
    fn name(&self) -> &str {
        "default application"
    }

    fn share(&self, file: &Path) -> Result<(), ExportError> {
        opener::open(file).map_err(|e| ExportError::Share(e.to_string()))
    }
}

/// Copies the file into a directory, such as a synced or removable folder.
#[derive(Debug, Clone)]
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ShareTarget for DirectoryShare {
    fn name(&self) -> &str {
        "directory"
    }

    fn share(&self, file: &Path) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::io(&self.dir, e))?;
        let file_name = file
            .file_name()
            .ok_or_else(|| ExportError::Share(format!("{file:?} has no file name")))?;
        let destination = self.dir.join(file_name);
        std::fs::copy(file, &destination).map_err(|e| ExportError::io(&destination, e))?;
        Ok(())
    }
}
