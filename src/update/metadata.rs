//! Version service client.
//!
//! Fetches the latest version descriptor, resolves package file ids to
//! download locations and lists release history. The service wraps every
//! payload in a `{code, msg, data}` envelope where `code == 1` means
//! success; any other shape is reported as metadata being unavailable.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::config::UpdateConfig;
use super::errors::{MetadataIssue, UpdateError};
use super::identity::AppIdentity;
use crate::traits::{Headers, HttpClient, Response};

/// Envelope code signalling success.
pub const SUCCESS_CODE: i64 = 1;

/// Relation type marking the Android package among a version's files.
pub const APK_RELATION: &str = "apk";

/// Latest-version information for one check cycle.
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDescriptor {
    pub version_id: String,
    pub is_forced_update: bool,
    pub change_log: Option<Vec<String>>,
    /// Opaque file id of the installable package, if one is attached
    pub package_reference: Option<String>,
}

impl VersionDescriptor {
    pub fn new(version_id: impl Into<String>, is_forced_update: bool) -> Self {
        Self {
            version_id: version_id.into(),
            is_forced_update,
            change_log: None,
            package_reference: None,
        }
    }

    pub fn with_package_reference(mut self, file_id: impl Into<String>) -> Self {
        self.package_reference = Some(file_id.into());
        self
    }

    pub fn with_change_log(mut self, entries: Vec<String>) -> Self {
        self.change_log = Some(entries);
        self
    }
}

/// `{code, msg, data}` wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVersionData {
    #[serde(default)]
    pub last_version: Option<LastVersion>,
    #[serde(default)]
    pub file_relation_list: Vec<FileRelation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_forced_update: bool,
    #[serde(default, alias = "changelog")]
    pub change_log: Option<ChangeLog>,
}

/// Change log as either a list of lines or one newline-separated text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChangeLog {
    Lines(Vec<String>),
    Text(String),
}

impl ChangeLog {
    fn into_lines(self) -> Vec<String> {
        match self {
            ChangeLog::Lines(lines) => lines,
            ChangeLog::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRelation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub orig_path: String,
}

#[derive(Debug, Deserialize)]
pub struct VersionListData {
    #[serde(default)]
    pub versions: Vec<VersionHistoryEntry>,
}

/// One published release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistoryEntry {
    pub version: String,
    /// Remaining service fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accepts `1`/`0`, `true`/`false` and `"1"`/`"0"`.
fn deserialize_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Option::<Flag>::deserialize(d)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i == 1,
        Some(Flag::Str(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        None => false,
    })
}

/// Accepts ids sent as strings or numbers.
fn deserialize_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(d)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

impl LatestVersionData {
    /// Convert the wire payload into a descriptor.
    pub fn into_descriptor(self) -> Result<VersionDescriptor, MetadataIssue> {
        let last = self.last_version.ok_or(MetadataIssue::NoLatestVersion)?;
        if last.version.trim().is_empty() {
            return Err(MetadataIssue::Malformed {
                message: "latest version has an empty version id".to_string(),
            });
        }

        // the service may list several packages; the last one wins
        let package_reference = self
            .file_relation_list
            .into_iter()
            .rev()
            .find(|fr| fr.kind == APK_RELATION)
            .map(|fr| fr.file_id);

        Ok(VersionDescriptor {
            version_id: last.version,
            is_forced_update: last.is_forced_update,
            change_log: last.change_log.map(ChangeLog::into_lines),
            package_reference,
        })
    }
}

/// Unwrap an envelope, mapping failure shapes to [`MetadataIssue`].
fn open_envelope<T: serde::de::DeserializeOwned>(response: &Response) -> Result<T, MetadataIssue> {
    let envelope: Envelope<T> = response.json().map_err(|e| MetadataIssue::Malformed {
        message: e.to_string(),
    })?;

    if envelope.code != SUCCESS_CODE {
        return Err(MetadataIssue::Rejected {
            code: envelope.code,
            message: envelope.msg,
        });
    }

    envelope.data.ok_or(MetadataIssue::NoLatestVersion)
}

/// Client for the version and file services.
#[derive(Clone)]
pub struct MetadataClient {
    http: Arc<dyn HttpClient>,
    config: Arc<UpdateConfig>,
}

impl MetadataClient {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<UpdateConfig>) -> Self {
        Self { http, config }
    }

    async fn get(&self, url: &str) -> Result<Response, MetadataIssue> {
        let response = self
            .http
            .get(url, &Headers::new())
            .await
            .map_err(|e| MetadataIssue::RequestFailed {
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(MetadataIssue::RequestFailed {
                message: format!("HTTP {}", response.status),
            });
        }
        Ok(response)
    }

    /// Fetch the latest version descriptor for `identity`.
    pub async fn fetch_latest(&self, identity: &AppIdentity) -> Result<VersionDescriptor, UpdateError> {
        let url = self
            .config
            .metadata_url(&identity.name, identity.platform.as_str());

        let fetch = async {
            let response = self.get(&url).await?;
            open_envelope::<LatestVersionData>(&response)?.into_descriptor()
        };

        fetch
            .await
            .map_err(|reason| UpdateError::MetadataUnavailable { reason })
    }

    /// Resolve a file id to the location the package can be fetched from.
    pub async fn lookup_file(&self, file_id: &str) -> Result<String, UpdateError> {
        let url = self.config.file_info_url(file_id);

        let fetch = async {
            let response = self.get(&url).await?;
            let info: FileInfo = open_envelope(&response)?;
            if info.orig_path.is_empty() {
                return Err(MetadataIssue::Malformed {
                    message: format!("file {} has no stored path", file_id),
                });
            }
            Ok::<_, MetadataIssue>(info.orig_path)
        };

        fetch
            .await
            .map_err(|reason| UpdateError::MetadataUnavailable { reason })
    }

    /// List published releases for `identity`, newest first as served.
    pub async fn version_history(
        &self,
        identity: &AppIdentity,
    ) -> Result<Vec<VersionHistoryEntry>, UpdateError> {
        let url = self
            .config
            .version_list_url(&identity.name, identity.platform.as_str());

        let fetch = async {
            let response = self.get(&url).await?;
            let data: VersionListData = open_envelope(&response)?;
            Ok::<_, MetadataIssue>(data.versions)
        };

        fetch
            .await
            .map_err(|reason| UpdateError::MetadataUnavailable { reason })
    }
}
