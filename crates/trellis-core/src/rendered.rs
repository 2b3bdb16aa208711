//! The rendered output tree
//!
//! Rendering never fails upward: a node either carries its provider payload
//! or is a placeholder labeled with the [`RenderError`] that stopped it.
//! Placeholders keep the attempted props for diagnostics, so a degraded page
//! can still be inspected.

use crate::error::RenderError;
use crate::traits::Behavior;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Terminal state of one node's render.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// The implementation constructed its payload.
    Rendered,
    /// Rendering this node failed; the error explains why.
    Placeholder(RenderError),
}

/// Children of a rendered node.
///
/// Slot contents are uniformly sequences in the output; a single-node slot
/// renders to a one-element sequence.
#[derive(Debug, Clone, Default)]
pub enum RenderedChildren {
    /// No child content.
    #[default]
    None,
    /// Ordered children, matching the declared order.
    Items(Vec<RenderedNode>),
    /// Named slot regions, each holding its rendered content in declared
    /// order.
    Slots(BTreeMap<String, Vec<RenderedNode>>),
}

/// An event binding resolved against the behavior registry.
#[derive(Clone)]
pub struct BoundEvent {
    /// Event name (`click`, `submit`, ...).
    pub event: String,
    /// The behavior key the binding resolved to.
    pub behavior: String,
    /// Parameters declared in the binding.
    pub params: Vec<Value>,
    handler: Arc<dyn Behavior>,
}

impl BoundEvent {
    /// Creates a bound event from a resolved behavior handle.
    pub fn new(
        event: impl Into<String>,
        behavior: impl Into<String>,
        params: Vec<Value>,
        handler: Arc<dyn Behavior>,
    ) -> Self {
        Self {
            event: event.into(),
            behavior: behavior.into(),
            params,
            handler,
        }
    }

    /// Invokes the bound behavior with the declared parameters.
    pub fn fire(&self) {
        self.handler.invoke(&self.params);
    }
}

impl fmt::Debug for BoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEvent")
            .field("event", &self.event)
            .field("behavior", &self.behavior)
            .field("params", &self.params)
            .finish()
    }
}

/// One node of the rendered output tree.
#[derive(Debug, Clone)]
pub struct RenderedNode {
    /// The kind that was requested for this node.
    pub kind: String,
    /// Provider that served the implementation; `None` for placeholders.
    pub provider: Option<String>,
    /// Stable identity carried over from the declaration.
    pub key: Option<String>,
    /// Provider payload, or the attempted props for placeholders.
    pub payload: Value,
    /// Event bindings resolved against the behavior registry.
    pub events: Vec<BoundEvent>,
    /// Rendered child content.
    pub children: RenderedChildren,
    /// Terminal render state of this node.
    pub outcome: NodeOutcome,
}

impl RenderedNode {
    /// Creates a successfully rendered node.
    pub fn rendered(
        kind: impl Into<String>,
        provider: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            provider: Some(provider.into()),
            key: None,
            payload,
            events: Vec::new(),
            children: RenderedChildren::None,
            outcome: NodeOutcome::Rendered,
        }
    }

    /// Creates a placeholder node carrying the error that stopped it and the
    /// props that were attempted.
    pub fn placeholder(kind: impl Into<String>, error: RenderError, attempted_props: Value) -> Self {
        Self {
            kind: kind.into(),
            provider: None,
            key: None,
            payload: attempted_props,
            events: Vec::new(),
            children: RenderedChildren::None,
            outcome: NodeOutcome::Placeholder(error),
        }
    }

    /// True if this node is a failure placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.outcome, NodeOutcome::Placeholder(_))
    }

    /// The error carried by a placeholder, if any.
    pub fn error(&self) -> Option<&RenderError> {
        match &self.outcome {
            NodeOutcome::Placeholder(error) => Some(error),
            NodeOutcome::Rendered => None,
        }
    }

    /// Ordered children, when this node has sequence children.
    pub fn items(&self) -> Option<&[RenderedNode]> {
        match &self.children {
            RenderedChildren::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Content of a named slot, when this node has slot children.
    pub fn slot(&self, name: &str) -> Option<&[RenderedNode]> {
        match &self.children {
            RenderedChildren::Slots(slots) => slots.get(name).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Total number of direct children.
    pub fn child_count(&self) -> usize {
        match &self.children {
            RenderedChildren::None => 0,
            RenderedChildren::Items(items) => items.len(),
            RenderedChildren::Slots(slots) => slots.values().map(Vec::len).sum(),
        }
    }
}
