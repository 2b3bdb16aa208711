//! Typed configuration document model
//!
//! These types are the output of validation: a `PageConfig`/`ViewNode` tree
//! constructed once from an external document and treated as immutable for
//! the duration of a render pass.
//!
//! On the wire a node is `{kind, props?, children?, on?, key?}` where
//! `children` is either a sequence of nodes or a map from slot name to
//! node-or-sequence, never both. The [`NodeChildren`] enum enforces that
//! invariant in the type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single node of the declarative view hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    /// Symbolic node kind, resolved through the kind registry.
    pub kind: String,

    /// Provider-agnostic properties forwarded to the implementation.
    #[serde(default)]
    pub props: serde_json::Map<String, Value>,

    /// Child content: a sequence, a slot map, or nothing.
    #[serde(default, skip_serializing_if = "NodeChildren::is_none")]
    pub children: NodeChildren,

    /// Declarative event bindings: event name to behavior reference.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, BehaviorRef>,

    /// Optional stable identity for reconciliation by consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ViewNode {
    /// Creates a childless node of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: serde_json::Map::new(),
            children: NodeChildren::None,
            on: BTreeMap::new(),
            key: None,
        }
    }

    /// True if this node's children are a named slot map.
    pub fn is_slotted(&self) -> bool {
        matches!(self.children, NodeChildren::Slots(_))
    }
}

/// Child content of a [`ViewNode`].
///
/// A node has *either* ordered children *or* named slots. A node with slot
/// children is a "slotted" node; its slot names correspond to the regions
/// its implementation expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeChildren {
    /// No child content.
    #[default]
    None,
    /// Ordered child sequence.
    Items(Vec<ViewNode>),
    /// Named slot regions.
    Slots(BTreeMap<String, SlotContent>),
}

impl NodeChildren {
    /// True if there is no child content.
    pub fn is_none(&self) -> bool {
        matches!(self, NodeChildren::None)
    }
}

/// Content of one slot: a single node or a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotContent {
    /// One node fills the slot.
    One(Box<ViewNode>),
    /// A sequence of nodes fills the slot.
    Many(Vec<ViewNode>),
}

impl SlotContent {
    /// The nodes in this slot, in declared order.
    pub fn nodes(&self) -> Vec<&ViewNode> {
        match self {
            SlotContent::One(node) => vec![node],
            SlotContent::Many(nodes) => nodes.iter().collect(),
        }
    }

    /// Number of nodes in this slot.
    pub fn len(&self) -> usize {
        match self {
            SlotContent::One(_) => 1,
            SlotContent::Many(nodes) => nodes.len(),
        }
    }

    /// True if the slot holds no nodes (an empty sequence).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference to a registered behavior: a bare key or a key with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BehaviorRef {
    /// Bare behavior key.
    Key(String),
    /// Behavior key with invocation parameters.
    WithParams {
        /// Behavior key, resolved through the behavior registry.
        behavior: String,
        /// Parameters passed verbatim to the behavior on invocation.
        #[serde(default)]
        params: Vec<Value>,
    },
}

impl BehaviorRef {
    /// The behavior key this reference points at.
    pub fn key(&self) -> &str {
        match self {
            BehaviorRef::Key(key) => key,
            BehaviorRef::WithParams { behavior, .. } => behavior,
        }
    }

    /// The declared parameters (empty for bare references).
    pub fn params(&self) -> &[Value] {
        match self {
            BehaviorRef::Key(_) => &[],
            BehaviorRef::WithParams { params, .. } => params,
        }
    }
}

/// A validated page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    /// Page metadata (title, version, tags).
    pub metadata: PageMetadata,

    /// Template kind; guaranteed present in the template registry at
    /// validation time.
    pub template_kind: String,

    /// Slot name to content, filling the template's named regions.
    pub slots: BTreeMap<String, SlotContent>,

    /// Page-level behavior bindings: name to behavior key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_behaviors: BTreeMap<String, String>,

    /// External data source declarations, passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<DataSource>,
}

/// Descriptive metadata of a page document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Human-readable page title.
    pub title: String,

    /// Longer description.
    #[serde(default)]
    pub description: String,

    /// Declared document version, if any. Absence is handled by the
    /// migrator's missing-version policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A declared external data source.
///
/// The engine carries these through untouched; interpretation belongs to
/// the consuming application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Name the page refers to this source by.
    pub name: String,

    /// Source configuration, uninterpreted.
    #[serde(flatten)]
    pub config: serde_json::Map<String, Value>,
}
