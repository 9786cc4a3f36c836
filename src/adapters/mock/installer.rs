//! Mock package installer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::traits::{InstallError, PackageInstaller};

/// Records installer hand-offs; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MockInstaller {
    opened: Arc<Mutex<Vec<(PathBuf, String)>>>,
    failure: Arc<Mutex<Option<InstallError>>>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `open` fail with `err`.
    pub fn fail_with(&self, err: InstallError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// `(path, mime_type)` pairs passed to `open`.
    pub fn opened(&self) -> Vec<(PathBuf, String)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageInstaller for MockInstaller {
    async fn open(&self, path: &Path, mime_type: &str) -> Result<(), InstallError> {
        self.opened
            .lock()
            .unwrap()
            .push((path.to_path_buf(), mime_type.to_string()));
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
