//! Self-update workflow for a mobile app.
//!
//! This module provides:
//! - Deciding whether a fetched version descriptor is an update
//! - A single download coordinator owning the process-wide download state
//! - The orchestrator that prompts the user and fetches the update
//! - Error handling with categories and user-friendly messages
//! - Structured logging of update operations
//!
//! # Example
//!
//! ```ignore
//! use appup::update::{CheckOutcome, UpdateConfig, UpdateOrchestrator, UpdateServices};
//!
//! let orchestrator = UpdateOrchestrator::new(UpdateConfig::from_env(), services);
//! match orchestrator.check_version(true).await {
//!     CheckOutcome::MetadataUnavailable(e) => eprintln!("{}", e.user_message()),
//!     outcome => tracing::debug!(?outcome, "update check finished"),
//! }
//! ```
//!
//! # Error Handling
//!
//! Public operations return outcome enums rather than `Result`; the
//! [`UpdateError`] carried by failing outcomes can be:
//! - Classified by category (metadata, network, transfer, ...)
//! - Checked for retryability
//! - Converted to user-friendly messages

mod comparator;
pub mod config;
mod coordinator;
pub mod errors;
mod identity;
pub mod logger;
pub mod metadata;
mod orchestrator;
mod sequence;
mod throttle;

pub use comparator::{decide, UpdateDecision};
pub use config::{PromptTexts, UpdateConfig};
pub use coordinator::{
    DownloadCoordinator, DownloadObserver, DownloadOutcome, DownloadRequest, DownloadState,
    COMPLETE_PERCENT, IDLE_PERCENT,
};
pub use errors::{MetadataIssue, UpdateError, UpdateErrorCategory};
pub use identity::{app_name_from_package, AppIdentity, FetchStrategy, Platform};
pub use logger::{
    log_update_debug, log_update_error, log_update_warn, UpdateEvent, UpdateLogLevel,
    UpdateLogger,
};
pub use metadata::{MetadataClient, VersionDescriptor, VersionHistoryEntry};
pub use orchestrator::{
    CheckOutcome, FetchOutcome, OrchestratorPhase, UpdateOrchestrator, UpdateServices,
};
pub use sequence::SequenceGenerator;
pub use throttle::{ProgressThrottle, TERMINAL_PERCENT};
