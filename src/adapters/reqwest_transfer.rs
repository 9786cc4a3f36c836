//! Reqwest-based file transfer adapter.
//!
//! Streams the response body to a temporary file next to the destination,
//! reporting byte counts as chunks arrive, and renames it into place once
//! the body is complete.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::traits::{FileTransfer, ProgressSender, TransferError, TransferProgress};
use crate::update::UpdateConfig;

/// [`FileTransfer`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct ReqwestFileTransfer {
    client: reqwest::Client,
}

impl ReqwestFileTransfer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Transfer with a connect timeout taken from the configuration.
    ///
    /// Only connecting is bounded; a slow body is allowed to take as long
    /// as it needs.
    pub fn from_config(config: &UpdateConfig) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| TransferError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn io_error(err: std::io::Error, path: &Path) -> TransferError {
        TransferError::Io(format!("{}: {}", path.display(), err))
    }

    async fn write_body(
        &self,
        response: reqwest::Response,
        temp_path: &Path,
        progress: &ProgressSender,
    ) -> Result<u64, TransferError> {
        let total = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(temp_path)
            .await
            .map_err(|e| Self::io_error(e, temp_path))?;

        let mut loaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransferError::Connection(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Self::io_error(e, temp_path))?;
            loaded += chunk.len() as u64;
            // the receiver may already be gone; the transfer carries on
            let _ = progress.send(TransferProgress::new(loaded, total));
        }

        file.flush().await.map_err(|e| Self::io_error(e, temp_path))?;
        Ok(loaded)
    }
}

impl Default for ReqwestFileTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileTransfer for ReqwestFileTransfer {
    async fn download(
        &self,
        source_url: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<(), TransferError> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Http {
                status: status.as_u16(),
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(e, parent))?;
        }

        let temp_path = destination.with_extension("part");
        let expected = response.content_length();
        let written = match self.write_body(response, &temp_path, &progress).await {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(err);
            }
        };

        if let Some(expected) = expected {
            if written != expected {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(TransferError::Rejected(format!(
                    "size mismatch: expected {} bytes, got {} bytes",
                    expected, written
                )));
            }
        }

        tokio::fs::rename(&temp_path, destination)
            .await
            .map_err(|e| Self::io_error(e, destination))
    }
}
