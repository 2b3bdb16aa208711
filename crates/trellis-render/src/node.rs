//! Recursive node rendering with per-node failure isolation
//!
//! `render_node` never fails to its caller: every error becomes a labeled
//! placeholder in the output tree and a report in the sink, and siblings
//! keep rendering. Per node the lifecycle is
//! `PENDING -> RESOLVING_ADAPTER -> (RENDERED | FALLBACK)`; there is no
//! retry, so a failed node stays failed for the rest of the pass.
//!
//! Sibling subtrees are independent futures joined in declared order, so a
//! slow implementation stalls only the subtree that depends on it.

use crate::resolver::{AdapterResolver, ResolveError};
use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use trellis_core::{
    BoundEvent, DocPath, NodeChildren, RegistrySet, RenderContext, RenderError, RenderedChildren,
    RenderedNode, ReportSink, SlotContent, ViewNode,
};

/// Renders single nodes and their subtrees.
pub struct NodeRenderer {
    registries: Arc<RegistrySet>,
    resolver: Arc<AdapterResolver>,
    sink: Arc<dyn ReportSink>,
}

impl NodeRenderer {
    /// Creates a renderer with its dependencies injected.
    pub fn new(
        registries: Arc<RegistrySet>,
        resolver: Arc<AdapterResolver>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            registries,
            resolver,
            sink,
        }
    }

    /// Renders one node and its subtree.
    ///
    /// Failures are isolated here: the returned node is a placeholder when
    /// anything went wrong, and the error has been reported to the sink.
    pub fn render_node<'a>(
        &'a self,
        node: &'a ViewNode,
        path: DocPath,
        ctx: RenderContext,
    ) -> BoxFuture<'a, RenderedNode> {
        Box::pin(async move {
            // Depth guard first: cyclic or pathologically deep documents
            // stop here before any resolution work.
            if ctx.at_ceiling() {
                let error = RenderError::MaxDepth {
                    path,
                    depth: ctx.depth,
                    max_depth: ctx.max_depth,
                };
                self.sink.error(error.clone());
                return self.placeholder(node, error);
            }

            if !self.registries.kinds.contains(&node.kind) {
                let error = RenderError::NodeNotFound {
                    kind: node.kind.clone(),
                    path,
                    depth: ctx.depth,
                };
                self.sink.error(error.clone());
                return self.placeholder(node, error);
            }

            debug!(kind = %node.kind, depth = ctx.depth, "resolving adapter");
            let adapter = match self
                .resolver
                .resolve_kind(&node.kind, &ctx.provider, self.sink.as_ref())
                .await
            {
                Ok(adapter) => adapter,
                Err(err) => {
                    let error = resolve_to_render_error(&node.kind, &path, ctx.depth, err);
                    self.sink.error(error.clone());
                    return self.placeholder(node, error);
                }
            };

            // The implementation itself may fail during construction; that
            // failure belongs to this node only.
            let payload = match adapter.factory.construct(node, &ctx).await {
                Ok(payload) => payload,
                Err(err) => {
                    let error = RenderError::RenderFailure {
                        kind: node.kind.clone(),
                        path,
                        depth: ctx.depth,
                        message: "implementation failed during construction".to_string(),
                        cause: Some(err.to_string()),
                    };
                    self.sink.error(error.clone());
                    return self.placeholder(node, error);
                }
            };

            let events = self.bind_events(node, &path);
            let children = self.render_children(node, &path, &ctx).await;

            RenderedNode {
                kind: node.kind.clone(),
                provider: Some(adapter.provider),
                key: node.key.clone(),
                payload,
                events,
                children,
                outcome: trellis_core::NodeOutcome::Rendered,
            }
        })
    }

    /// Renders the content of one slot in declared order.
    pub fn render_slot<'a>(
        &'a self,
        content: &'a SlotContent,
        path: DocPath,
        ctx: RenderContext,
    ) -> BoxFuture<'a, Vec<RenderedNode>> {
        Box::pin(async move {
            match content {
                SlotContent::One(node) => {
                    vec![self.render_node(node, path, ctx).await]
                }
                SlotContent::Many(nodes) => {
                    let futures = nodes
                        .iter()
                        .enumerate()
                        .map(|(i, node)| self.render_node(node, path.index(i), ctx.clone()));
                    join_all(futures).await
                }
            }
        })
    }

    /// Translates declared event bindings into bound callbacks. An
    /// unresolved behavior key is reported and omitted; the node itself
    /// still renders.
    fn bind_events(&self, node: &ViewNode, path: &DocPath) -> Vec<BoundEvent> {
        let mut events = Vec::with_capacity(node.on.len());
        for (event, reference) in &node.on {
            match self.registries.behaviors.get(reference.key()) {
                Some(handler) => events.push(BoundEvent::new(
                    event.clone(),
                    reference.key(),
                    reference.params().to_vec(),
                    Arc::clone(handler),
                )),
                None => {
                    warn!(
                        behavior = reference.key(),
                        event = %event,
                        kind = %node.kind,
                        "unresolved behavior key; binding omitted"
                    );
                    self.sink.error(RenderError::BehaviorNotFound {
                        behavior: reference.key().to_string(),
                        event: event.clone(),
                        kind: node.kind.clone(),
                        path: path.field("on").field(event),
                    });
                }
            }
        }
        events
    }

    async fn render_children(
        &self,
        node: &ViewNode,
        path: &DocPath,
        ctx: &RenderContext,
    ) -> RenderedChildren {
        match &node.children {
            NodeChildren::None => RenderedChildren::None,
            NodeChildren::Items(items) => {
                let child_ctx = ctx.descend(&node.kind);
                let children_path = path.field("children");
                let futures = items.iter().enumerate().map(|(i, child)| {
                    self.render_node(child, children_path.index(i), child_ctx.clone())
                });
                RenderedChildren::Items(join_all(futures).await)
            }
            NodeChildren::Slots(slots) => {
                let child_ctx = ctx.descend(&node.kind);
                let children_path = path.field("children");
                // One independent future per slot; results attach by slot
                // name regardless of completion order.
                let futures = slots.iter().map(|(name, content)| {
                    let slot_path = children_path.field(name);
                    let slot_ctx = child_ctx.clone();
                    async move { (name.clone(), self.render_slot(content, slot_path, slot_ctx).await) }
                });
                RenderedChildren::Slots(join_all(futures).await.into_iter().collect::<BTreeMap<_, _>>())
            }
        }
    }

    fn placeholder(&self, node: &ViewNode, error: RenderError) -> RenderedNode {
        let mut placeholder =
            RenderedNode::placeholder(&node.kind, error, Value::Object(node.props.clone()));
        placeholder.key = node.key.clone();
        placeholder
    }
}

/// Maps resolver failures onto the render-error taxonomy at a known
/// location.
fn resolve_to_render_error(
    kind: &str,
    path: &DocPath,
    depth: usize,
    err: ResolveError,
) -> RenderError {
    match err {
        ResolveError::NotRegistered { .. } => RenderError::NodeNotFound {
            kind: kind.to_string(),
            path: path.clone(),
            depth,
        },
        err @ (ResolveError::NoProvider { .. } | ResolveError::SourceFailed { .. }) => {
            RenderError::RenderFailure {
                kind: kind.to_string(),
                path: path.clone(),
                depth,
                message: err.to_string(),
                cause: None,
            }
        }
    }
}
