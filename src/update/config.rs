//! Configuration for the update workflow.
//!
//! Use the builder methods to customise, or [`UpdateConfig::from_env`] to
//! overlay values from the environment.
//!
//! ```ignore
//! use appup::update::UpdateConfig;
//! use std::time::Duration;
//!
//! let config = UpdateConfig::default()
//!     .with_version_service_url("https://versions.example.com")
//!     .with_throttle_interval(Duration::from_millis(500));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_VERSION_SERVICE_URL: &str = "APPUP_VERSION_SERVICE_URL";
pub const ENV_FILE_SERVICE_URL: &str = "APPUP_FILE_SERVICE_URL";
pub const ENV_THROTTLE_MS: &str = "APPUP_THROTTLE_MS";
pub const ENV_POLL_MS: &str = "APPUP_POLL_MS";

/// Shortest watcher refresh cadence; a timer cannot tick with a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Every user-visible string the workflow renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTexts {
    pub forced_title: String,
    pub forced_subtitle: String,
    pub optional_title: String,
    pub optional_subtitle: String,
    pub confirm: String,
    pub cancel: String,
    pub background: String,
    /// Progress dialog title; `{percent}` is substituted
    pub progress_title: String,
    pub already_latest: String,
    pub no_download_target: String,
    pub fallback_title: String,
    pub fallback_subtitle: String,
}

impl Default for PromptTexts {
    fn default() -> Self {
        Self {
            forced_title: "Important upgrade".to_string(),
            forced_subtitle: "You must upgrade before you can continue.".to_string(),
            optional_title: "Upgrade".to_string(),
            optional_subtitle: "A new version is available. Upgrade now?".to_string(),
            confirm: "OK".to_string(),
            cancel: "Cancel".to_string(),
            background: "Download in background".to_string(),
            progress_title: "Download progress: {percent}%".to_string(),
            already_latest: "You are already on the latest version.".to_string(),
            no_download_target: "No Android package download address was found.".to_string(),
            fallback_title: "Download from the web".to_string(),
            fallback_subtitle: "The local upgrade failed.".to_string(),
        }
    }
}

impl PromptTexts {
    /// Render the progress dialog title for a percentage.
    pub fn progress(&self, percent: i8) -> String {
        self.progress_title
            .replace("{percent}", &percent.max(0).to_string())
    }
}

/// Configuration for the update workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Base URL of the version management service
    pub version_service_url: String,
    /// Base URL of the file service (file lookup and hosted download page)
    pub file_service_url: String,
    /// Minimum spacing between UI-visible progress updates
    #[serde(with = "duration_millis")]
    pub throttle_interval: Duration,
    /// Refresh cadence of the progress-only watcher dialog
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Timeout applied by the reqwest adapters
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,
    /// Directory under the external storage root that receives packages
    pub download_subdir: String,
    pub package_prefix: String,
    pub package_extension: String,
    /// MIME type handed to the installer
    pub installer_mime: String,
    pub texts: PromptTexts,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            version_service_url: "http://localhost:8080".to_string(),
            file_service_url: "http://localhost:8081".to_string(),
            throttle_interval: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            download_subdir: "download".to_string(),
            package_prefix: "android_".to_string(),
            package_extension: "apk".to_string(),
            installer_mime: "application/vnd.android.package-archive".to_string(),
            texts: PromptTexts::default(),
        }
    }
}

impl UpdateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration overlaid with `APPUP_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Unparseable durations, and a zero poll interval, are ignored with a
    /// warning.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_VERSION_SERVICE_URL) {
            self.version_service_url = url;
        }
        if let Some(url) = lookup(ENV_FILE_SERVICE_URL) {
            self.file_service_url = url;
        }
        if let Some(ms) = lookup(ENV_THROTTLE_MS) {
            match ms.parse::<u64>() {
                Ok(ms) => self.throttle_interval = Duration::from_millis(ms),
                Err(_) => tracing::warn!("Ignoring invalid {}={}", ENV_THROTTLE_MS, ms),
            }
        }
        if let Some(ms) = lookup(ENV_POLL_MS) {
            match ms.parse::<u64>() {
                Ok(parsed) if parsed > 0 => self.poll_interval = Duration::from_millis(parsed),
                _ => tracing::warn!("Ignoring invalid {}={}", ENV_POLL_MS, ms),
            }
        }
        self
    }

    pub fn with_version_service_url(mut self, url: impl Into<String>) -> Self {
        self.version_service_url = url.into();
        self
    }

    pub fn with_file_service_url(mut self, url: impl Into<String>) -> Self {
        self.file_service_url = url.into();
        self
    }

    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// Values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Watcher refresh period, never shorter than [`MIN_POLL_INTERVAL`].
    pub fn poll_period(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_texts(mut self, texts: PromptTexts) -> Self {
        self.texts = texts;
        self
    }

    /// URL returning the latest version descriptor for an app.
    pub fn metadata_url(&self, app_name: &str, platform: &str) -> String {
        format_url(&format!(
            "{}/v1/apply/getDownloadPageByEName/{}/{}",
            self.version_service_url, app_name, platform
        ))
    }

    /// URL returning the release history for an app.
    pub fn version_list_url(&self, app_name: &str, platform: &str) -> String {
        format_url(&format!(
            "{}/v1/apply/findVersionList/{}/{}",
            self.version_service_url, app_name, platform
        ))
    }

    /// URL resolving a file id to its stored location.
    pub fn file_info_url(&self, file_id: &str) -> String {
        format_url(&format!("{}/v1/file/{}", self.file_service_url, file_id))
    }

    /// Hosted download page for an app.
    pub fn download_page_url(&self, app_name: &str) -> String {
        format_url(&format!(
            "{}/static/download.html?name={}",
            self.file_service_url, app_name
        ))
    }

    /// File name for a package download, unique per sequence token.
    pub fn package_file_name(&self, sequence: u64) -> String {
        format!(
            "{}{}.{}",
            self.package_prefix, sequence, self.package_extension
        )
    }
}

/// Collapse repeated slashes in the path part of a URL.
pub fn format_url(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(idx) => url.split_at(idx + 3),
        None => ("", url),
    };
    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    let mut prev_slash = false;
    for c in rest.chars() {
        if c == '/' && prev_slash {
            continue;
        }
        prev_slash = c == '/';
        out.push(c);
    }
    out
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
