//! Unified error handling for update operations.
//!
//! Every failure the workflow can hit is caught where it happens and
//! turned into an [`UpdateError`]; the orchestrator then logs it and
//! converts it to a silent no-op or a single user-visible prompt. None of
//! these are fatal to the host.

use std::fmt;
use std::path::PathBuf;

use crate::traits::{DeviceError, InstallError, TransferError};

/// Represents the category of an update error for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorCategory {
    /// Version metadata could not be obtained or understood
    Metadata,
    /// The package transfer failed
    Transfer,
    /// Permission refused by the user or OS
    Permission,
    /// Host is not a supported mobile runtime
    Platform,
    /// Installer hand-off errors
    Installer,
}

impl UpdateErrorCategory {
    /// Returns true if this error category is likely transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpdateErrorCategory::Transfer)
    }

    /// Returns a short label for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateErrorCategory::Metadata => "metadata",
            UpdateErrorCategory::Transfer => "transfer",
            UpdateErrorCategory::Permission => "permission",
            UpdateErrorCategory::Platform => "platform",
            UpdateErrorCategory::Installer => "installer",
        }
    }
}

impl fmt::Display for UpdateErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why version metadata is unavailable.
///
/// Kept distinct so callers can tell "the service could not be reached"
/// apart from "the service has nothing for this app".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataIssue {
    /// The request itself failed
    RequestFailed { message: String },
    /// The service answered with a non-success code
    Rejected { code: i64, message: Option<String> },
    /// The service answered but knows no latest version
    NoLatestVersion,
    /// The payload could not be parsed
    Malformed { message: String },
}

impl fmt::Display for MetadataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataIssue::RequestFailed { message } => write!(f, "request failed: {}", message),
            MetadataIssue::Rejected { code, message } => match message {
                Some(m) => write!(f, "service returned code {}: {}", code, m),
                None => write!(f, "service returned code {}", code),
            },
            MetadataIssue::NoLatestVersion => write!(f, "no latest version published"),
            MetadataIssue::Malformed { message } => write!(f, "malformed payload: {}", message),
        }
    }
}

/// Comprehensive error type for all update operations.
#[derive(Debug, Clone)]
pub enum UpdateError {
    /// Version metadata could not be obtained
    MetadataUnavailable { reason: MetadataIssue },

    /// Update confirmed but no package location was resolved
    NoDownloadTarget,

    /// The native transfer was rejected
    TransferFailure { message: String },

    /// Not running on a mobile runtime
    UnsupportedHost,

    /// A runtime permission was refused
    PermissionDenied { capability: String },

    /// The OS installer could not be opened
    InstallerFailed { path: PathBuf, message: String },

    /// A device capability failed
    Device { message: String },
}

impl UpdateError {
    /// Get the category of this error.
    pub fn category(&self) -> UpdateErrorCategory {
        match self {
            UpdateError::MetadataUnavailable { .. } | UpdateError::NoDownloadTarget => {
                UpdateErrorCategory::Metadata
            }
            UpdateError::TransferFailure { .. } => UpdateErrorCategory::Transfer,
            UpdateError::PermissionDenied { .. } => UpdateErrorCategory::Permission,
            UpdateError::UnsupportedHost | UpdateError::Device { .. } => {
                UpdateErrorCategory::Platform
            }
            UpdateError::InstallerFailed { .. } => UpdateErrorCategory::Installer,
        }
    }

    /// Check if this error is likely transient and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpdateError::MetadataUnavailable { reason } => {
                matches!(reason, MetadataIssue::RequestFailed { .. })
            }
            _ => self.category().is_retryable(),
        }
    }

    /// Whether this error should stay invisible to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, UpdateError::UnsupportedHost)
    }

    /// Get a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            UpdateError::MetadataUnavailable { reason } => match reason {
                MetadataIssue::NoLatestVersion => {
                    "No version information was found for this app.".to_string()
                }
                _ => "Could not retrieve version information. Please try again later.".to_string(),
            },
            UpdateError::NoDownloadTarget => {
                "No package download address was found for this update.".to_string()
            }
            UpdateError::TransferFailure { .. } => {
                "The download failed. You can download the update from the web instead.".to_string()
            }
            UpdateError::UnsupportedHost => {
                "Updates are only available in the mobile app.".to_string()
            }
            UpdateError::PermissionDenied { capability } => {
                format!("Permission to use {} was denied.", capability)
            }
            UpdateError::InstallerFailed { path, .. } => {
                format!(
                    "The update was downloaded to '{}' but the installer could not be opened.",
                    path.display()
                )
            }
            UpdateError::Device { .. } => {
                "The device could not complete the request.".to_string()
            }
        }
    }

    /// Get a short error code suitable for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            UpdateError::MetadataUnavailable { reason } => match reason {
                MetadataIssue::RequestFailed { .. } => "E_META_REQUEST",
                MetadataIssue::Rejected { .. } => "E_META_REJECTED",
                MetadataIssue::NoLatestVersion => "E_META_NOT_FOUND",
                MetadataIssue::Malformed { .. } => "E_META_MALFORMED",
            },
            UpdateError::NoDownloadTarget => "E_NO_TARGET",
            UpdateError::TransferFailure { .. } => "E_TRANSFER",
            UpdateError::UnsupportedHost => "E_HOST",
            UpdateError::PermissionDenied { .. } => "E_PERMISSION",
            UpdateError::InstallerFailed { .. } => "E_INSTALLER",
            UpdateError::Device { .. } => "E_DEVICE",
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::MetadataUnavailable { reason } => {
                write!(f, "Version metadata unavailable: {}", reason)
            }
            UpdateError::NoDownloadTarget => write!(f, "No package location resolved"),
            UpdateError::TransferFailure { message } => {
                write!(f, "Transfer failed: {}", message)
            }
            UpdateError::UnsupportedHost => write!(f, "Host is not a mobile runtime"),
            UpdateError::PermissionDenied { capability } => {
                write!(f, "Permission denied: {}", capability)
            }
            UpdateError::InstallerFailed { path, message } => {
                write!(
                    f,
                    "Installer failed for '{}': {}",
                    path.display(),
                    message
                )
            }
            UpdateError::Device { message } => write!(f, "Device error: {}", message),
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<TransferError> for UpdateError {
    fn from(e: TransferError) -> Self {
        UpdateError::TransferFailure {
            message: e.to_string(),
        }
    }
}

impl From<DeviceError> for UpdateError {
    fn from(e: DeviceError) -> Self {
        match e {
            DeviceError::PermissionDenied(capability) => UpdateError::PermissionDenied { capability },
            other => UpdateError::Device {
                message: other.to_string(),
            },
        }
    }
}

impl UpdateError {
    /// Wrap an installer failure for the package at `path`.
    pub fn installer(path: PathBuf, err: InstallError) -> Self {
        UpdateError::InstallerFailed {
            path,
            message: err.to_string(),
        }
    }
}
