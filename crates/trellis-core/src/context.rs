//! Per-pass render context
//!
//! One context is created per render pass; every descent produces a new,
//! depth-incremented copy. Contexts are never mutated in place, so
//! concurrent subtree renders cannot observe each other's depth.

use serde_json::Value;

/// Immutable context threaded through one render pass.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Current nesting depth; the page's slot roots start at 0.
    pub depth: usize,
    /// Depth ceiling; `depth >= max_depth` forbids further descent.
    pub max_depth: usize,
    /// The provider requested for this pass.
    pub provider: String,
    /// Kind of the parent node, if any.
    pub parent_kind: Option<String>,
    /// Pass-scoped data made available to implementations.
    pub data_bag: serde_json::Map<String, Value>,
}

impl RenderContext {
    /// Creates a fresh context at depth 0.
    pub fn new(provider: impl Into<String>, max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
            provider: provider.into(),
            parent_kind: None,
            data_bag: serde_json::Map::new(),
        }
    }

    /// Attaches pass-scoped data.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Map<String, Value>) -> Self {
        self.data_bag = data;
        self
    }

    /// Returns a copy one level deeper, recording the parent kind.
    #[must_use]
    pub fn descend(&self, parent_kind: &str) -> Self {
        Self {
            depth: self.depth + 1,
            max_depth: self.max_depth,
            provider: self.provider.clone(),
            parent_kind: Some(parent_kind.to_string()),
            data_bag: self.data_bag.clone(),
        }
    }

    /// True once the depth ceiling has been reached.
    pub fn at_ceiling(&self) -> bool {
        self.depth >= self.max_depth
    }
}
