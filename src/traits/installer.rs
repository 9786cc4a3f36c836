//! Installer hand-off trait.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors reported when the OS installer cannot be opened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("No application can open {mime_type}")]
    NoHandler { mime_type: String },

    #[error("Installer failed: {0}")]
    Failed(String),
}

/// Hands a downloaded artifact to the operating system installer.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Open `path` with the handler registered for `mime_type`.
    async fn open(&self, path: &Path, mime_type: &str) -> Result<(), InstallError>;
}
