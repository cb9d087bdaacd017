//! Building, persisting and sharing the investigation bundle.

pub mod bundle;
pub mod share;
pub mod store;

use std::path::{Path, PathBuf};

pub use bundle::{BundleInputs, InvestigationBundle, PhotoEntry, UNKNOWN_DATE};
pub use share::{share_bundle, DirectoryShare, OpenerShare, ShareTarget};
pub use store::{BundleStore, BUNDLE_FILE_NAME};

/// Export error types.
#[derive(Debug)]
pub enum ExportError {
    /// No bundle has been saved yet
    Missing(PathBuf),
    /// Reading or writing a file failed
    Io { path: PathBuf, message: String },
    /// JSON serialization or parsing failed
    Serialization(String),
    /// The share target refused the file
    Share(String),
}

impl ExportError {
    fn io(path: &Path, error: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Missing(path) => write!(f, "No bundle saved at {path:?}"),
            ExportError::Io { path, message } => write!(f, "File error on {path:?}: {message}"),
            ExportError::Serialization(msg) => write!(f, "Bundle serialization error: {msg}"),
            ExportError::Share(msg) => write!(f, "Share failed: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}
