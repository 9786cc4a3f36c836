//! Native device capability trait.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::update::Platform;

/// Errors reported by the native device layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    Other(String),
}

/// Host environment the application runs in.
///
/// Implementations wrap whatever the embedding runtime exposes (package
/// manager queries, storage roots, intent launching).
#[async_trait]
pub trait DeviceHost: Send + Sync {
    /// Whether the host is a real mobile runtime.
    ///
    /// Desktop and browser preview contexts return `false`; the update
    /// workflow short-circuits on them.
    fn is_mobile(&self) -> bool;

    /// Platform family of the host.
    fn platform(&self) -> Platform;

    /// Version identifier of the running build.
    async fn version_number(&self) -> Result<String, DeviceError>;

    /// Fully qualified package name, e.g. `com.kit.demo`.
    async fn package_name(&self) -> Result<String, DeviceError>;

    /// Root of the external storage area downloads are written into.
    fn external_root_dir(&self) -> Result<PathBuf, DeviceError>;

    /// Ask the user for permission to write to external storage.
    async fn request_storage_permission(&self) -> Result<(), DeviceError>;

    /// Open a URL in the system browser.
    async fn open_url(&self, url: &str) -> Result<(), DeviceError>;
}
