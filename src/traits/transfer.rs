//! Background file transfer trait.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::sync::mpsc;

/// Byte counts reported by an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes received so far
    pub loaded: u64,
    /// Total bytes expected (0 when unknown)
    pub total: u64,
}

impl TransferProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Whole percentage complete, floored and capped at 100.
    ///
    /// Returns `None` when the total size is unknown.
    pub fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let pct = self.loaded.saturating_mul(100) / self.total;
        Some(pct.min(100) as u8)
    }
}

/// Sending half of the out-of-band progress stream.
pub type ProgressSender = mpsc::UnboundedSender<TransferProgress>;

/// Errors reported by a transfer implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Server returned HTTP {status}")]
    Http { status: u16 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Downloads a remote file to a local path.
///
/// Progress is reported out of band through `progress`; implementations
/// may send at any frequency. The sender is consumed so the receiving side
/// observes the end of the stream when the transfer returns.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    async fn download(
        &self,
        source_url: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<(), TransferError>;
}
