//! Mock implementations of the collaborator traits for tests.
//!
//! Every mock is cheaply cloneable; clones share recorded state, so a test
//! can keep one clone for assertions and hand another to the code under
//! test.

mod device;
mod http;
mod installer;
mod observer;
mod prompt;
mod transfer;

pub use device::MockDeviceHost;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use installer::MockInstaller;
pub use observer::RecordingObserver;
pub use prompt::{MockPromptHandle, MockPrompter, PromptChoice, RecordedPrompt};
pub use transfer::{MockFileTransfer, TransferCall, TransferGate, TransferScript};
