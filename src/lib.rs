//! appup - self-update workflow for mobile apps
//!
//! Checks a version service for a newer build, prompts the user, and
//! either downloads and installs the package or opens a hosted download
//! page. Native capabilities are reached through the traits in [`traits`].

pub mod adapters;
pub mod logging;
pub mod traits;
pub mod update;
