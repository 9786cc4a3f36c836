//! Trait abstractions for the collaborators of the update workflow.
//!
//! The orchestration core only decides *when* to call these and *what
//! state* governs re-entrant calls; everything that touches the network,
//! the device or the screen sits behind one of these traits.
//!
//! # Traits
//!
//! - [`HttpClient`] - metadata transport (GET only)
//! - [`DeviceHost`] - native device capabilities
//! - [`FileTransfer`] - background byte transfer with a progress channel
//! - [`PackageInstaller`] - hands a downloaded package to the OS installer
//! - [`Prompter`] / [`PromptHandle`] - dialog rendering primitive

pub mod device;
pub mod http;
pub mod installer;
pub mod prompt;
pub mod transfer;

pub use device::{DeviceError, DeviceHost};
pub use http::{Headers, HttpClient, HttpError, Response};
pub use installer::{InstallError, PackageInstaller};
pub use prompt::{PromptAction, PromptConfig, PromptHandle, PromptOutcome, Prompter};
pub use transfer::{FileTransfer, ProgressSender, TransferError, TransferProgress};
