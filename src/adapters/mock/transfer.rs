//! Scripted file transfer.
//!
//! Each call to `download` consumes the next queued [`TransferScript`]:
//! progress events are sent after their delays, an optional gate holds the
//! transfer open, then the scripted result is returned.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::traits::{FileTransfer, ProgressSender, TransferError, TransferProgress};

/// Behaviour of one scripted transfer.
#[derive(Debug, Clone)]
pub struct TransferScript {
    events: Vec<(Duration, TransferProgress)>,
    result: Result<(), TransferError>,
    gate: Option<Arc<Notify>>,
}

impl TransferScript {
    /// Emit `events` (each after its delay) and succeed.
    pub fn succeed(events: Vec<(Duration, TransferProgress)>) -> Self {
        Self {
            events,
            result: Ok(()),
            gate: None,
        }
    }

    /// Emit `events` and then fail with `error`.
    pub fn fail(events: Vec<(Duration, TransferProgress)>, error: TransferError) -> Self {
        Self {
            events,
            result: Err(error),
            gate: None,
        }
    }
}

/// Holds a gated transfer open until released.
#[derive(Debug, Clone)]
pub struct TransferGate {
    notify: Arc<Notify>,
}

impl TransferGate {
    /// Let the transfer return. Safe to call before the transfer waits.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// A recorded `download` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub source_url: String,
    pub destination: PathBuf,
}

/// [`FileTransfer`] driven by queued scripts.
///
/// With no script queued a call succeeds without reporting progress.
#[derive(Debug, Clone, Default)]
pub struct MockFileTransfer {
    scripts: Arc<Mutex<VecDeque<TransferScript>>>,
    calls: Arc<Mutex<Vec<TransferCall>>>,
}

impl MockFileTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, script: TransferScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    /// Queue a script that blocks after its events until the gate opens.
    pub fn push_gated_script(&self, mut script: TransferScript) -> TransferGate {
        let notify = Arc::new(Notify::new());
        script.gate = Some(notify.clone());
        self.push_script(script);
        TransferGate { notify }
    }

    pub fn calls(&self) -> Vec<TransferCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileTransfer for MockFileTransfer {
    async fn download(
        &self,
        source_url: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<(), TransferError> {
        self.calls.lock().unwrap().push(TransferCall {
            source_url: source_url.to_string(),
            destination: destination.to_path_buf(),
        });

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TransferScript::succeed(Vec::new()));

        for (delay, event) in script.events {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = progress.send(event);
        }

        if let Some(gate) = script.gate {
            gate.notified().await;
        }

        script.result
    }
}
