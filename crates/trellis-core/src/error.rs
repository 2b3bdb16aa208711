//! Render Error Taxonomy
//!
//! Errors fall into two propagation classes:
//!
//! - `Validation` is fatal: it blocks the whole render pass.
//! - Everything else is isolated to the offending node. The renderer
//!   converts it into a labeled placeholder and keeps going; a degraded
//!   page is always preferable to a crashed page.
//!
//! Causes are carried as strings so errors stay `Clone`: one copy lives in
//! the placeholder node, another in the pass-level report sink.

use crate::path::DocPath;
use serde::Serialize;
use thiserror::Error;

/// An error raised during validation or rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The document failed schema validation. Fatal to the pass.
    #[error("validation failed at {path}: {message}")]
    Validation {
        /// Path to the offending field; empty for document-root errors.
        path: DocPath,
        /// Human-readable description.
        message: String,
        /// Stable machine-readable code (`missing_field`, `unknown_kind`, ...).
        code: String,
    },

    /// A node kind is absent from the kind registry. Isolated.
    #[error("unknown node kind '{kind}' at {path}")]
    NodeNotFound {
        /// The requested kind.
        kind: String,
        /// Path to the node.
        path: DocPath,
        /// Depth at which the node was encountered.
        depth: usize,
    },

    /// A template kind is absent from the template registry. Isolated.
    #[error("unknown template kind '{kind}'")]
    TemplateNotFound {
        /// The requested template kind.
        kind: String,
    },

    /// An event binding referenced an unregistered behavior. The binding is
    /// omitted; the node itself still renders.
    #[error("unknown behavior '{behavior}' bound to '{event}' on node '{kind}' at {path}")]
    BehaviorNotFound {
        /// The unresolved behavior key.
        behavior: String,
        /// The event the binding was declared for.
        event: String,
        /// Kind of the node carrying the binding.
        kind: String,
        /// Path to the node.
        path: DocPath,
    },

    /// The depth ceiling was reached; descent stops here. Isolated.
    #[error("maximum render depth {max_depth} reached at {path}")]
    MaxDepth {
        /// Path to the node that would have exceeded the ceiling.
        path: DocPath,
        /// Depth of the node.
        depth: usize,
        /// The configured ceiling.
        max_depth: usize,
    },

    /// The chosen implementation failed during construction, or no provider
    /// in the fallback chain had an implementation. Isolated.
    #[error("failed to render node '{kind}' at {path}: {message}")]
    RenderFailure {
        /// Kind of the failing node.
        kind: String,
        /// Path to the node.
        path: DocPath,
        /// Depth of the node.
        depth: usize,
        /// What went wrong.
        message: String,
        /// Underlying cause, rendered to a string.
        cause: Option<String>,
    },
}

impl RenderError {
    /// Stable uppercase code for the error class, for reporting surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            Self::BehaviorNotFound { .. } => "BEHAVIOR_NOT_FOUND",
            Self::MaxDepth { .. } => "MAX_DEPTH",
            Self::RenderFailure { .. } => "RENDER_FAILURE",
        }
    }

    /// Path to the offending field or node, where one exists.
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            Self::Validation { path, .. }
            | Self::NodeNotFound { path, .. }
            | Self::BehaviorNotFound { path, .. }
            | Self::MaxDepth { path, .. }
            | Self::RenderFailure { path, .. } => Some(path),
            Self::TemplateNotFound { .. } => None,
        }
    }

    /// True if this error blocks the whole render pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<ValidationIssue> for RenderError {
    fn from(issue: ValidationIssue) -> Self {
        Self::Validation {
            path: issue.path,
            message: issue.message,
            code: issue.code.to_string(),
        }
    }
}

/// A single validation finding, tagged with its document path.
///
/// Validation accumulates every issue it finds rather than stopping at the
/// first, so one pass reports the complete set of problems.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Path from the document root; empty for root-level issues.
    pub path: DocPath,
    /// Human-readable description.
    pub message: String,
    /// Stable machine-readable code.
    pub code: &'static str,
}

impl ValidationIssue {
    /// Creates a new issue.
    pub fn new(path: DocPath, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            path,
            message: message.into(),
            code,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.path, self.message)
    }
}

/// Error raised by required registry lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The key is absent from the catalog.
    #[error("'{key}' not found in the {catalog} catalog (known: {})", known.join(", "))]
    NotFound {
        /// Which catalog was consulted.
        catalog: &'static str,
        /// The missing key.
        key: String,
        /// All keys the catalog does hold, sorted.
        known: Vec<String>,
    },
}
