//! Concrete implementations of the collaborator traits.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - metadata transport using reqwest
//! - [`ReqwestFileTransfer`] - streaming package download using reqwest
//!
//! Device, installer and prompt capabilities belong to the embedding
//! runtime and have no production adapter here.
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for every trait:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::MockDeviceHost`] - Scripted device capabilities
//! - [`mock::MockFileTransfer`] - Scripted progress and results
//! - [`mock::MockInstaller`] - Records installer hand-offs
//! - [`mock::MockPrompter`] - Scripted user choices

pub mod mock;
pub mod reqwest_http;
pub mod reqwest_transfer;

pub use mock::{
    MockDeviceHost, MockFileTransfer, MockHttpClient, MockInstaller, MockPrompter,
    RecordingObserver,
};
pub use reqwest_http::ReqwestHttpClient;
pub use reqwest_transfer::ReqwestFileTransfer;
