//! Mock implementations for test fixtures.
//!
//! Re-exports the doubles from `appup::adapters::mock` together with the
//! payload builders the scenarios share.

pub use appup::adapters::mock::{
    MockDeviceHost, MockFileTransfer, MockHttpClient, MockInstaller, MockPrompter,
    MockResponse, PromptChoice, RecordingObserver, TransferScript,
};
pub use appup::traits::{HttpError, Response, TransferError, TransferProgress};

use std::time::Duration;

/// `getDownloadPageByEName` payload with one apk relation (`fileId` 42).
pub fn latest_version_json(version: &str, forced: bool) -> String {
    format!(
        r#"{{
            "code": 1,
            "data": {{
                "lastVersion": {{
                    "version": "{}",
                    "isForcedUpdate": {},
                    "changeLog": ["Faster sync", "Bug fixes"]
                }},
                "fileRelationList": [{{"type": "apk", "fileId": 42}}]
            }}
        }}"#,
        version,
        if forced { 1 } else { 0 }
    )
}

/// File lookup payload resolving to `orig_path`.
pub fn file_info_json(orig_path: &str) -> String {
    format!(r#"{{"code":1,"data":{{"origPath":"{}"}}}}"#, orig_path)
}

/// Immediate progress events at the given percentages of a 100 byte file.
pub fn progress_steps(percents: &[u64]) -> Vec<(Duration, TransferProgress)> {
    percents
        .iter()
        .map(|p| (Duration::ZERO, TransferProgress::new(*p, 100)))
        .collect()
}
