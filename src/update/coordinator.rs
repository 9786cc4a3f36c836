//! Download coordination.
//!
//! [`DownloadCoordinator`] is the sole owner of the process-wide
//! [`DownloadState`]. Every mutation goes through its methods; everyone
//! else reads snapshots via [`DownloadCoordinator::status`] or a
//! [`watch::Receiver`] from [`DownloadCoordinator::subscribe`].
//!
//! Only one transfer can be in flight. A second `begin_download` while the
//! state is neither idle (`-1`) nor complete (`100`) returns immediately
//! with [`DownloadOutcome::AlreadyInFlight`] and touches nothing.
//!
//! Each claim opens a new attempt generation. A transfer that resolves
//! after a newer attempt has claimed the state (possible once it reported
//! `100`) no longer writes to the state.
//!
//! There is no cancellation and no timeout: once a transfer starts the
//! attempt ends only through the transfer's success or failure. A stalled
//! transfer leaves the state "in progress" until the process restarts.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::config::UpdateConfig;
use super::errors::UpdateError;
use super::logger::UpdateLogger;
use super::sequence::SequenceGenerator;
use super::throttle::ProgressThrottle;
use crate::traits::{DeviceHost, FileTransfer, PackageInstaller, TransferProgress};

/// Progress value meaning "no download in flight".
pub const IDLE_PERCENT: i8 = -1;

/// Progress value meaning "download finished".
pub const COMPLETE_PERCENT: i8 = 100;

/// Snapshot of the current download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadState {
    /// `-1` idle, `0..=99` in flight, `100` complete
    pub progress_percent: i8,
    /// Progress text is not rendered on screen
    pub is_backgrounded: bool,
    /// When progress was last forwarded to the UI
    pub last_reported_at: Option<DateTime<Utc>>,
}

impl DownloadState {
    pub fn idle() -> Self {
        Self {
            progress_percent: IDLE_PERCENT,
            is_backgrounded: false,
            last_reported_at: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.progress_percent == IDLE_PERCENT
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent == COMPLETE_PERCENT
    }

    /// A transfer is in flight.
    pub fn is_active(&self) -> bool {
        !self.is_idle() && !self.is_complete()
    }
}

impl Default for DownloadState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Parameters of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Location the package is fetched from
    pub source_url: String,
    /// Start with progress hidden from the screen
    pub background: bool,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            background: false,
        }
    }

    pub fn in_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }
}

/// Callbacks for one download attempt.
pub trait DownloadObserver: Send + Sync {
    /// Throttled progress; `100` is always delivered.
    fn on_progress(&self, state: &DownloadState);

    /// The package is on disk at `path`. Called before the installer opens.
    fn on_complete(&self, path: &Path);

    /// The transfer failed. Called once per attempt.
    fn on_error(&self, error: &UpdateError);
}

/// How a call to [`DownloadCoordinator::begin_download`] ended.
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Another attempt is in flight; nothing was started
    AlreadyInFlight { percent: i8 },
    /// The package was downloaded and handed to the installer
    Completed {
        path: PathBuf,
        /// Set when the installer could not be opened
        install_error: Option<UpdateError>,
    },
    /// The transfer failed and the state was reset to idle
    Failed(UpdateError),
}

impl DownloadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }
}

/// Owner of the download state and mediator of download attempts.
pub struct DownloadCoordinator {
    state: watch::Sender<DownloadState>,
    transfer: Arc<dyn FileTransfer>,
    installer: Arc<dyn PackageInstaller>,
    device: Arc<dyn DeviceHost>,
    config: Arc<UpdateConfig>,
    sequence: SequenceGenerator,
    /// Generation of the attempt that owns the state
    attempt: AtomicU64,
}

impl DownloadCoordinator {
    pub fn new(
        transfer: Arc<dyn FileTransfer>,
        installer: Arc<dyn PackageInstaller>,
        device: Arc<dyn DeviceHost>,
        config: Arc<UpdateConfig>,
    ) -> Self {
        let (state, _) = watch::channel(DownloadState::idle());
        Self {
            state,
            transfer,
            installer,
            device,
            config,
            sequence: SequenceGenerator::new(),
            attempt: AtomicU64::new(0),
        }
    }

    /// Current download state.
    pub fn status(&self) -> DownloadState {
        *self.state.borrow()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.state.subscribe()
    }

    /// Show or hide progress text for the attempt in flight.
    ///
    /// Ignored when nothing is in flight.
    pub fn set_backgrounded(&self, backgrounded: bool) {
        self.state.send_if_modified(|s| {
            if !s.is_active() || s.is_backgrounded == backgrounded {
                return false;
            }
            s.is_backgrounded = backgrounded;
            true
        });
    }

    /// Where the next attempt will be written.
    fn destination_path(&self) -> Result<PathBuf, UpdateError> {
        let root = self.device.external_root_dir()?;
        Ok(root
            .join(&self.config.download_subdir)
            .join(self.config.package_file_name(self.sequence.next())))
    }

    /// Atomically claim the state for a new attempt.
    ///
    /// Returns the new attempt's generation, or the in-flight percentage
    /// when another attempt holds the state.
    fn claim(&self, background: bool) -> Result<u64, i8> {
        let mut claimed = Err(IDLE_PERCENT);
        self.state.send_if_modified(|s| {
            if s.is_active() {
                claimed = Err(s.progress_percent);
                return false;
            }
            // bumped under the state lock so updates never see a torn pair
            claimed = Ok(self.attempt.fetch_add(1, Ordering::SeqCst) + 1);
            *s = DownloadState {
                progress_percent: 0,
                is_backgrounded: background,
                last_reported_at: None,
            };
            true
        });
        claimed
    }

    /// Apply `modify` only while `attempt` still owns the state.
    fn update_attempt<F>(&self, attempt: u64, modify: F) -> bool
    where
        F: FnOnce(&mut DownloadState) -> bool,
    {
        self.state.send_if_modified(|s| {
            self.attempt.load(Ordering::SeqCst) == attempt && modify(s)
        })
    }

    /// Download `request.source_url` and hand the result to the installer.
    ///
    /// Resolves when the attempt ends. Progress arriving from the transfer
    /// is stored immediately (so [`status`](Self::status) is always current),
    /// clamped to be non-decreasing, and forwarded to `observer` at most
    /// once per throttle interval, except `100` which is forwarded at once.
    pub async fn begin_download(
        &self,
        request: DownloadRequest,
        observer: Arc<dyn DownloadObserver>,
    ) -> DownloadOutcome {
        let mut logger = UpdateLogger::new();

        let attempt = match self.claim(request.background) {
            Ok(attempt) => attempt,
            Err(percent) => {
                logger.log_download_attached(percent);
                return DownloadOutcome::AlreadyInFlight { percent };
            }
        };

        let destination = match self.destination_path() {
            Ok(path) => path,
            Err(err) => return self.fail(attempt, err, observer.as_ref(), &logger),
        };

        logger.log_download_started(&request.source_url, &destination);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut throttle = ProgressThrottle::new(self.config.throttle_interval);
        let result = {
            let transfer = self.transfer.download(&request.source_url, &destination, tx);
            tokio::pin!(transfer);

            loop {
                tokio::select! {
                    biased;
                    Some(progress) = rx.recv() => {
                        self.record_progress(attempt, progress, &mut throttle, observer.as_ref(), &logger);
                    }
                    result = &mut transfer => break result,
                }
            }
        };
        while let Ok(progress) = rx.try_recv() {
            self.record_progress(attempt, progress, &mut throttle, observer.as_ref(), &logger);
        }

        match result {
            Ok(()) => self.complete(attempt, destination, observer.as_ref(), &logger).await,
            Err(err) => self.fail(attempt, err.into(), observer.as_ref(), &logger),
        }
    }

    fn record_progress(
        &self,
        attempt: u64,
        progress: TransferProgress,
        throttle: &mut ProgressThrottle,
        observer: &dyn DownloadObserver,
        logger: &UpdateLogger,
    ) {
        let Some(percent) = progress.percent() else {
            return;
        };

        let advanced = self.update_attempt(attempt, |s| {
            if (percent as i8) <= s.progress_percent {
                return false;
            }
            s.progress_percent = percent as i8;
            true
        });
        if !advanced {
            return;
        }

        logger.log_download_progress(percent, progress.loaded, progress.total);

        if throttle.should_emit(percent, Instant::now()) {
            self.report(attempt, observer);
        }
    }

    /// Stamp the report time and forward the current state.
    fn report(&self, attempt: u64, observer: &dyn DownloadObserver) {
        let stamped = self.update_attempt(attempt, |s| {
            s.last_reported_at = Some(Utc::now());
            true
        });
        if stamped {
            let snapshot = self.status();
            observer.on_progress(&snapshot);
        }
    }

    async fn complete(
        &self,
        attempt: u64,
        path: PathBuf,
        observer: &dyn DownloadObserver,
        logger: &UpdateLogger,
    ) -> DownloadOutcome {
        let reached = self.update_attempt(attempt, |s| {
            if s.is_complete() {
                return false;
            }
            s.progress_percent = COMPLETE_PERCENT;
            true
        });
        // the terminal value must reach the UI even if the transfer never reported it
        if reached {
            self.report(attempt, observer);
        }

        logger.log_download_completed(&path);
        observer.on_complete(&path);

        let mime = &self.config.installer_mime;
        logger.log_install_handoff(&path, mime);
        let install_error = match self.installer.open(&path, mime).await {
            Ok(()) => None,
            Err(err) => {
                let err = UpdateError::installer(path.clone(), err);
                logger.log_install_handoff_failed(&path, &err);
                Some(err)
            }
        };

        DownloadOutcome::Completed {
            path,
            install_error,
        }
    }

    fn fail(
        &self,
        attempt: u64,
        error: UpdateError,
        observer: &dyn DownloadObserver,
        logger: &UpdateLogger,
    ) -> DownloadOutcome {
        self.update_attempt(attempt, |s| {
            *s = DownloadState::idle();
            true
        });
        logger.log_download_failed(&error);
        logger.log_error(&error, "download");
        observer.on_error(&error);
        DownloadOutcome::Failed(error)
    }
}
