//! Adapter warnings
//!
//! Warnings are observable but non-fatal: the page still renders. The main
//! producer is the provider-adapter resolver, which emits a `Fallback`
//! warning whenever a node kind is served by a provider other than the one
//! requested.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Classification of an adapter warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// An implementation was found, but only via the fallback chain.
    Fallback,
    /// A node kind had no entry in the kind catalog.
    NodeNotFound,
    /// A template kind had no entry in the template catalog.
    TemplateNotFound,
}

/// A warning emitted during adapter resolution.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterWarning {
    /// Classification of this warning.
    pub kind: WarningKind,
    /// The node or template kind being resolved.
    pub node_kind: String,
    /// The provider the caller asked for.
    pub requested_provider: String,
    /// The provider that actually served the implementation, if any.
    pub fallback_provider: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// When the warning was emitted.
    pub timestamp: DateTime<Utc>,
}

impl AdapterWarning {
    /// Creates a `Fallback` warning for a kind served by a non-requested
    /// provider.
    pub fn fallback(
        node_kind: impl Into<String>,
        requested: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let node_kind = node_kind.into();
        let requested = requested.into();
        let actual = actual.into();
        Self {
            message: format!(
                "'{}' has no implementation for provider '{}'; fell back to '{}'",
                node_kind, requested, actual
            ),
            kind: WarningKind::Fallback,
            node_kind,
            requested_provider: requested,
            fallback_provider: Some(actual),
            timestamp: Utc::now(),
        }
    }
}
