//! Capability traits for external collaborators
//!
//! The engine never depends on concrete visual components, provider
//! libraries, or behavior implementations. It consumes them through the
//! three seams defined here, all registered into a [`RegistrySet`] at
//! process start.
//!
//! ## Threading
//!
//! Implementations run inside concurrent subtree renders and must be
//! `Send + Sync`. Resolution and construction are async so heavy
//! implementations can be loaded on demand without blocking sibling
//! subtrees.
//!
//! [`RegistrySet`]: crate::registry::RegistrySet

use crate::context::RenderContext;
use crate::document::ViewNode;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A concrete, provider-specific implementation of a node or template kind.
///
/// # Error Handling
///
/// A construction error never escapes the node that triggered it: the
/// renderer converts it into a `RENDER_FAILURE` placeholder and continues
/// with siblings.
#[async_trait]
pub trait RenderableFactory: Send + Sync {
    /// Builds the provider-specific payload for one node.
    ///
    /// The factory sees only the node itself; child rendering is the
    /// renderer's job and the results are attached outside the payload.
    async fn construct(&self, node: &ViewNode, ctx: &RenderContext) -> anyhow::Result<Value>;
}

/// An on-demand source of implementations, consulted at resolve time.
///
/// This is the lazy-loading seam: a registry entry may defer to a source
/// instead of holding implementations directly.
#[async_trait]
pub trait ImplementationSource: Send + Sync {
    /// Resolves an implementation of `kind` for `provider`.
    ///
    /// Returns `Ok(None)` when the kind is simply not available for this
    /// provider, in which case the resolver tries the fallback chain.
    /// Returns
    /// `Err` only when the source itself failed; that is a genuine render
    /// failure, not a fallback.
    async fn resolve(
        &self,
        kind: &str,
        provider: &str,
    ) -> anyhow::Result<Option<Arc<dyn RenderableFactory>>>;
}

/// A registered event behavior.
///
/// Declarative event bindings (`on: {click: "navigate"}`) are translated
/// into bound callbacks holding one of these.
pub trait Behavior: Send + Sync {
    /// Invokes the behavior with the parameters declared in the binding.
    fn invoke(&self, params: &[Value]);
}

impl<F> Behavior for F
where
    F: Fn(&[Value]) + Send + Sync,
{
    fn invoke(&self, params: &[Value]) {
        self(params)
    }
}
