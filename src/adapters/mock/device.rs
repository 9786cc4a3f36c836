//! Mock device host.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::traits::{DeviceError, DeviceHost};
use crate::update::Platform;

#[derive(Debug, Default)]
struct DeviceCalls {
    opened_urls: Vec<String>,
    permission_requests: usize,
    version_queries: usize,
}

/// In-memory [`DeviceHost`] with scripted answers.
#[derive(Debug, Clone)]
pub struct MockDeviceHost {
    mobile: bool,
    platform: Platform,
    version: String,
    package_name: String,
    external_root: Option<PathBuf>,
    permission_granted: bool,
    calls: Arc<Mutex<DeviceCalls>>,
}

impl MockDeviceHost {
    /// A mobile host running `com.kit.demo` version `1.0.0`.
    pub fn new(platform: Platform) -> Self {
        Self {
            mobile: true,
            platform,
            version: "1.0.0".to_string(),
            package_name: "com.kit.demo".to_string(),
            external_root: None,
            permission_granted: true,
            calls: Arc::new(Mutex::new(DeviceCalls::default())),
        }
    }

    /// A desktop/browser preview host.
    pub fn desktop() -> Self {
        Self {
            mobile: false,
            ..Self::new(Platform::Other)
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    pub fn with_external_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.external_root = Some(root.into());
        self
    }

    pub fn with_permission_denied(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    /// URLs passed to `open_url`, in order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().opened_urls.clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.calls.lock().unwrap().permission_requests
    }

    pub fn version_queries(&self) -> usize {
        self.calls.lock().unwrap().version_queries
    }
}

#[async_trait]
impl DeviceHost for MockDeviceHost {
    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn version_number(&self) -> Result<String, DeviceError> {
        self.calls.lock().unwrap().version_queries += 1;
        Ok(self.version.clone())
    }

    async fn package_name(&self) -> Result<String, DeviceError> {
        Ok(self.package_name.clone())
    }

    fn external_root_dir(&self) -> Result<PathBuf, DeviceError> {
        self.external_root
            .clone()
            .ok_or_else(|| DeviceError::Unavailable("external storage".to_string()))
    }

    async fn request_storage_permission(&self) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().permission_requests += 1;
        if self.permission_granted {
            Ok(())
        } else {
            Err(DeviceError::PermissionDenied("external storage".to_string()))
        }
    }

    async fn open_url(&self, url: &str) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().opened_urls.push(url.to_string());
        Ok(())
    }
}
