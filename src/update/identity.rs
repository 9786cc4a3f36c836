//! Application identity and platform dispatch.
//!
//! The identity is resolved once per process from the [`DeviceHost`] and is
//! read-only afterwards. Everything that varies by platform (wire name,
//! how a confirmed update is fetched) is decided here so the comparator and
//! the download coordinator stay platform-agnostic.
//!
//! [`DeviceHost`]: crate::traits::DeviceHost

use serde::{Deserialize, Serialize};

/// Platform family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Other,
}

impl Platform {
    /// Identifier used in version service URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Other => "other",
        }
    }

    /// How a confirmed update is retrieved on this platform.
    pub fn fetch_strategy(&self) -> FetchStrategy {
        match self {
            Platform::Android => FetchStrategy::LocalDownload,
            Platform::Ios | Platform::Other => FetchStrategy::HostedPage,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Way a confirmed update reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Download the package locally and hand it to the installer
    LocalDownload,
    /// Open the hosted download page in the browser
    HostedPage,
}

/// Identity of the running application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    /// Short application name, e.g. `demo` for `com.kit.demo`
    pub name: String,
    pub platform: Platform,
    /// Version identifier of the running build
    pub current_version: String,
}

impl AppIdentity {
    /// Build an identity from the host's package name.
    pub fn from_package(package_name: &str, platform: Platform, current_version: String) -> Self {
        Self {
            name: app_name_from_package(package_name).to_string(),
            platform,
            current_version,
        }
    }

    pub fn fetch_strategy(&self) -> FetchStrategy {
        self.platform.fetch_strategy()
    }
}

/// Last dot-separated segment of a package name.
pub fn app_name_from_package(package_name: &str) -> &str {
    match package_name.rfind('.') {
        Some(idx) => &package_name[idx + 1..],
        None => package_name,
    }
}
