//! Version comparison.
//!
//! Decides whether a fetched descriptor represents an update. Identifiers
//! are compared by exact string equality: the service only ever returns
//! the latest build, so any difference means "newer".

use super::metadata::VersionDescriptor;

/// Outcome of comparing the running build with the fetched descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Already on the latest build
    NoUpdate,
    /// A newer build exists and the user may decline it
    OptionalUpdate(VersionDescriptor),
    /// A newer build exists and must be installed
    ForcedUpdate(VersionDescriptor),
    /// No usable descriptor was fetched
    MetadataUnavailable,
}

impl UpdateDecision {
    /// The descriptor being offered, if any.
    pub fn descriptor(&self) -> Option<&VersionDescriptor> {
        match self {
            UpdateDecision::OptionalUpdate(d) | UpdateDecision::ForcedUpdate(d) => Some(d),
            UpdateDecision::NoUpdate | UpdateDecision::MetadataUnavailable => None,
        }
    }

    pub fn is_update(&self) -> bool {
        self.descriptor().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpdateDecision::NoUpdate => "up to date",
            UpdateDecision::OptionalUpdate(_) => "optional update",
            UpdateDecision::ForcedUpdate(_) => "forced update",
            UpdateDecision::MetadataUnavailable => "metadata unavailable",
        }
    }
}

/// Compare `current` against the fetched descriptor.
///
/// An absent descriptor, or one with a blank version id, yields
/// [`UpdateDecision::MetadataUnavailable`].
pub fn decide(current: &str, fetched: Option<VersionDescriptor>) -> UpdateDecision {
    let Some(descriptor) = fetched else {
        return UpdateDecision::MetadataUnavailable;
    };

    if descriptor.version_id.trim().is_empty() {
        return UpdateDecision::MetadataUnavailable;
    }

    if descriptor.version_id == current {
        return UpdateDecision::NoUpdate;
    }

    if descriptor.is_forced_update {
        UpdateDecision::ForcedUpdate(descriptor)
    } else {
        UpdateDecision::OptionalUpdate(descriptor)
    }
}
