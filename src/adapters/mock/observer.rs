//! Recording download observer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::update::{DownloadObserver, DownloadState, UpdateError};

/// Stores every callback it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    progress: Mutex<Vec<DownloadState>>,
    completed: Mutex<Vec<PathBuf>>,
    errors: Mutex<Vec<UpdateError>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress_states(&self) -> Vec<DownloadState> {
        self.progress.lock().unwrap().clone()
    }

    /// Percentages delivered through `on_progress`.
    pub fn progress_values(&self) -> Vec<i8> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.progress_percent)
            .collect()
    }

    pub fn completed_paths(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<UpdateError> {
        self.errors.lock().unwrap().clone()
    }
}

impl DownloadObserver for RecordingObserver {
    fn on_progress(&self, state: &DownloadState) {
        self.progress.lock().unwrap().push(*state);
    }

    fn on_complete(&self, path: &Path) {
        self.completed.lock().unwrap().push(path.to_path_buf());
    }

    fn on_error(&self, error: &UpdateError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}
