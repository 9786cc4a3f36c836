//! Common test utilities for integration tests.
//!
//! ```ignore
//! let h = Harness::builder().android().build();
//! h.serve_update("1.0.1", false);
//! let outcome = h.orchestrator.check_version(false).await;
//! ```

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mocks;

pub use mocks::*;

use appup::update::{Platform, UpdateConfig, UpdateOrchestrator, UpdateServices};
use std::sync::Arc;

pub const VERSION_SERVICE: &str = "https://versions.test";
pub const FILE_SERVICE: &str = "https://files.test";
pub const PACKAGE_URL: &str = "https://cdn.test/demo-1.0.1.apk";
pub const DOWNLOAD_PAGE: &str = "https://files.test/static/download.html?name=demo";

pub fn latest_url(platform: &str) -> String {
    format!(
        "{}/v1/apply/getDownloadPageByEName/demo/{}",
        VERSION_SERVICE, platform
    )
}

pub fn file_url(file_id: &str) -> String {
    format!("{}/v1/file/{}", FILE_SERVICE, file_id)
}

/// Configuration pointing at the fake services.
pub fn test_config() -> UpdateConfig {
    appup::logging::init_test_logging(None);
    UpdateConfig::default()
        .with_version_service_url(VERSION_SERVICE)
        .with_file_service_url(FILE_SERVICE)
}

/// An orchestrator wired to mocks, with handles kept for assertions.
pub struct Harness {
    pub http: MockHttpClient,
    pub device: MockDeviceHost,
    pub transfer: MockFileTransfer,
    pub installer: MockInstaller,
    pub prompter: MockPrompter,
    pub orchestrator: UpdateOrchestrator,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    fn platform_segment(&self) -> &'static str {
        use appup::traits::DeviceHost;
        self.device.platform().as_str()
    }

    /// Serve `version` as the latest build, with its package at
    /// [`PACKAGE_URL`].
    pub fn serve_update(&self, version: &str, forced: bool) {
        self.http.set_json(
            &latest_url(self.platform_segment()),
            &latest_version_json(version, forced),
        );
        self.http.set_json(&file_url("42"), &file_info_json(PACKAGE_URL));
    }
}

pub struct HarnessBuilder {
    device: MockDeviceHost,
    config: UpdateConfig,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            device: MockDeviceHost::new(Platform::Android).with_external_root("/storage/emulated/0"),
            config: test_config(),
        }
    }
}

impl HarnessBuilder {
    pub fn android(self) -> Self {
        self
    }

    pub fn ios(mut self) -> Self {
        self.device = MockDeviceHost::new(Platform::Ios);
        self
    }

    pub fn desktop(mut self) -> Self {
        self.device = MockDeviceHost::desktop();
        self
    }

    pub fn device(mut self, device: MockDeviceHost) -> Self {
        self.device = device;
        self
    }

    pub fn config(mut self, config: UpdateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Harness {
        let http = MockHttpClient::new();
        let transfer = MockFileTransfer::new();
        let installer = MockInstaller::new();
        let prompter = MockPrompter::new();

        let orchestrator = UpdateOrchestrator::new(
            self.config,
            UpdateServices {
                http: Arc::new(http.clone()),
                device: Arc::new(self.device.clone()),
                transfer: Arc::new(transfer.clone()),
                installer: Arc::new(installer.clone()),
                prompter: Arc::new(prompter.clone()),
            },
        );

        Harness {
            http,
            device: self.device,
            transfer,
            installer,
            prompter,
            orchestrator,
        }
    }
}
