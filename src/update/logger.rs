//! Update event logging.
//!
//! This is the diagnostic sink of the workflow: every check, prompt,
//! transfer and installer hand-off is reported here as a typed
//! [`UpdateEvent`] and emitted through `tracing` under the
//! `appup::update` target.

use std::path::Path;
use std::time::{Duration, Instant};

use super::errors::UpdateError;

/// Log level for update events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateLogLevel {
    /// Debug information (detailed progress)
    Debug,
    /// Informational messages (normal operations)
    Info,
    /// Warnings (recoverable issues)
    Warn,
    /// Errors (operation failures)
    Error,
}

/// Types of update events that can be logged.
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    // ========== Check Events ==========
    /// Starting an update check
    CheckStarted { current_version: String, manual: bool },
    /// Check skipped without contacting the service
    CheckSkipped { reason: String },
    /// Update check completed successfully
    CheckCompleted {
        current_version: String,
        latest_version: String,
        decision: String,
        duration: Duration,
    },
    /// Update check failed
    CheckFailed {
        error: String,
        error_code: String,
        duration: Duration,
    },

    // ========== Prompt Events ==========
    /// A prompt was put on screen
    PromptShown { title: String, actions: usize },

    // ========== Download Events ==========
    /// Starting a download
    DownloadStarted { source: String, destination: String },
    /// A download was requested while another is in flight
    DownloadAttached { percent: i8 },
    /// Download progress update
    DownloadProgress {
        percent: u8,
        bytes_downloaded: u64,
        total_bytes: u64,
    },
    /// Download completed successfully
    DownloadCompleted { file_path: String, duration: Duration },
    /// Download failed
    DownloadFailed {
        error: String,
        error_code: String,
        duration: Duration,
    },

    // ========== Hand-off Events ==========
    /// Package handed to the OS installer
    InstallHandoff { file_path: String, mime_type: String },
    /// The installer could not be opened
    InstallHandoffFailed { file_path: String, error: String },
    /// Hosted download page opened in the browser
    HostedPageOpened { url: String },
}

impl UpdateEvent {
    /// Get the log level for this event.
    pub fn level(&self) -> UpdateLogLevel {
        match self {
            UpdateEvent::CheckStarted { .. }
            | UpdateEvent::CheckSkipped { .. }
            | UpdateEvent::PromptShown { .. }
            | UpdateEvent::DownloadStarted { .. }
            | UpdateEvent::DownloadAttached { .. }
            | UpdateEvent::DownloadProgress { .. } => UpdateLogLevel::Debug,

            UpdateEvent::CheckCompleted { .. }
            | UpdateEvent::DownloadCompleted { .. }
            | UpdateEvent::InstallHandoff { .. }
            | UpdateEvent::HostedPageOpened { .. } => UpdateLogLevel::Info,

            UpdateEvent::InstallHandoffFailed { .. } => UpdateLogLevel::Warn,

            UpdateEvent::CheckFailed { .. } | UpdateEvent::DownloadFailed { .. } => {
                UpdateLogLevel::Error
            }
        }
    }

    /// Get a human-readable message for this event.
    pub fn message(&self) -> String {
        match self {
            UpdateEvent::CheckStarted {
                current_version,
                manual,
            } => {
                let kind = if *manual { "manual" } else { "automatic" };
                format!(
                    "Checking for updates ({}, current: {})",
                    kind, current_version
                )
            }
            UpdateEvent::CheckSkipped { reason } => format!("Update check skipped: {}", reason),
            UpdateEvent::CheckCompleted {
                current_version,
                latest_version,
                decision,
                duration,
            } => format!(
                "Update check finished: {} -> {} ({}) in {:.1}s",
                current_version,
                latest_version,
                decision,
                duration.as_secs_f32()
            ),
            UpdateEvent::CheckFailed {
                error,
                error_code,
                duration,
            } => format!(
                "Update check failed [{}]: {} (after {:.1}s)",
                error_code,
                error,
                duration.as_secs_f32()
            ),
            UpdateEvent::PromptShown { title, actions } => {
                format!("Prompt shown: '{}' with {} action(s)", title, actions)
            }
            UpdateEvent::DownloadStarted {
                source,
                destination,
            } => format!("Starting download from {} to {}", source, destination),
            UpdateEvent::DownloadAttached { percent } => format!(
                "Download already in progress at {}%, not starting another",
                percent
            ),
            UpdateEvent::DownloadProgress {
                percent,
                bytes_downloaded,
                total_bytes,
            } => format!(
                "Downloading: {} / {} ({}%)",
                format_bytes(*bytes_downloaded),
                format_bytes(*total_bytes),
                percent
            ),
            UpdateEvent::DownloadCompleted {
                file_path,
                duration,
            } => format!(
                "Download complete: saved to {} in {:.1}s",
                file_path,
                duration.as_secs_f32()
            ),
            UpdateEvent::DownloadFailed {
                error,
                error_code,
                duration,
            } => format!(
                "Download failed [{}]: {} (after {:.1}s)",
                error_code,
                error,
                duration.as_secs_f32()
            ),
            UpdateEvent::InstallHandoff {
                file_path,
                mime_type,
            } => format!("Opening installer for {} ({})", file_path, mime_type),
            UpdateEvent::InstallHandoffFailed { file_path, error } => {
                format!("Could not open installer for {}: {}", file_path, error)
            }
            UpdateEvent::HostedPageOpened { url } => format!("Opened download page {}", url),
        }
    }
}

/// Format bytes in a human-readable way.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Logger for update operations.
///
/// Emits [`UpdateEvent`]s through `tracing` and keeps the start time of the
/// current operation so completion events carry a duration.
#[derive(Debug, Default)]
pub struct UpdateLogger {
    operation_start: Option<Instant>,
    operation_name: Option<String>,
}

impl UpdateLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing an operation.
    pub fn start_operation(&mut self, name: &str) {
        self.operation_start = Some(Instant::now());
        self.operation_name = Some(name.to_string());
    }

    /// Get the elapsed duration since the operation started.
    pub fn elapsed(&self) -> Duration {
        self.operation_start
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    /// Log an update event.
    pub fn log(&self, event: &UpdateEvent) {
        let message = event.message();
        let operation = self.operation_name.as_deref().unwrap_or("-");

        match event.level() {
            UpdateLogLevel::Debug => {
                tracing::debug!(target: "appup::update", operation = %operation, "{}", message);
            }
            UpdateLogLevel::Info => {
                tracing::info!(target: "appup::update", operation = %operation, "{}", message);
            }
            UpdateLogLevel::Warn => {
                tracing::warn!(target: "appup::update", operation = %operation, "{}", message);
            }
            UpdateLogLevel::Error => {
                tracing::error!(target: "appup::update", operation = %operation, "{}", message);
            }
        }
    }

    /// Log an UpdateError with full context.
    pub fn log_error(&self, error: &UpdateError, context: &str) {
        log_update_error(error, context);
    }

    // ========== Convenience methods for common events ==========

    pub fn log_check_started(&mut self, current_version: &str, manual: bool) {
        self.start_operation("check");
        self.log(&UpdateEvent::CheckStarted {
            current_version: current_version.to_string(),
            manual,
        });
    }

    pub fn log_check_skipped(&self, reason: &str) {
        self.log(&UpdateEvent::CheckSkipped {
            reason: reason.to_string(),
        });
    }

    pub fn log_check_completed(&self, current_version: &str, latest_version: &str, decision: &str) {
        self.log(&UpdateEvent::CheckCompleted {
            current_version: current_version.to_string(),
            latest_version: latest_version.to_string(),
            decision: decision.to_string(),
            duration: self.elapsed(),
        });
    }

    pub fn log_check_failed(&self, error: &UpdateError) {
        self.log(&UpdateEvent::CheckFailed {
            error: error.to_string(),
            error_code: error.error_code().to_string(),
            duration: self.elapsed(),
        });
    }

    pub fn log_prompt_shown(&self, title: &str, actions: usize) {
        self.log(&UpdateEvent::PromptShown {
            title: title.to_string(),
            actions,
        });
    }

    pub fn log_download_started(&mut self, source: &str, destination: &Path) {
        self.start_operation("download");
        self.log(&UpdateEvent::DownloadStarted {
            source: source.to_string(),
            destination: destination.display().to_string(),
        });
    }

    pub fn log_download_attached(&self, percent: i8) {
        self.log(&UpdateEvent::DownloadAttached { percent });
    }

    pub fn log_download_progress(&self, percent: u8, bytes_downloaded: u64, total_bytes: u64) {
        self.log(&UpdateEvent::DownloadProgress {
            percent,
            bytes_downloaded,
            total_bytes,
        });
    }

    pub fn log_download_completed(&self, file_path: &Path) {
        self.log(&UpdateEvent::DownloadCompleted {
            file_path: file_path.display().to_string(),
            duration: self.elapsed(),
        });
    }

    pub fn log_download_failed(&self, error: &UpdateError) {
        self.log(&UpdateEvent::DownloadFailed {
            error: error.to_string(),
            error_code: error.error_code().to_string(),
            duration: self.elapsed(),
        });
    }

    pub fn log_install_handoff(&self, file_path: &Path, mime_type: &str) {
        self.log(&UpdateEvent::InstallHandoff {
            file_path: file_path.display().to_string(),
            mime_type: mime_type.to_string(),
        });
    }

    pub fn log_install_handoff_failed(&self, file_path: &Path, error: &UpdateError) {
        self.log(&UpdateEvent::InstallHandoffFailed {
            file_path: file_path.display().to_string(),
            error: error.to_string(),
        });
    }

    pub fn log_hosted_page_opened(&self, url: &str) {
        self.log(&UpdateEvent::HostedPageOpened {
            url: url.to_string(),
        });
    }
}

/// Global convenience function to log an update error.
pub fn log_update_error(error: &UpdateError, context: &str) {
    tracing::error!(
        target: "appup::update",
        error_code = %error.error_code(),
        error_category = %error.category(),
        retryable = %error.is_retryable(),
        context = %context,
        "Update error: {}",
        error
    );
}

/// Global convenience function to log an update debug message.
pub fn log_update_debug(message: &str) {
    tracing::debug!(target: "appup::update", "{}", message);
}

/// Global convenience function to log an update warning.
pub fn log_update_warn(message: &str) {
    tracing::warn!(target: "appup::update", "{}", message);
}
