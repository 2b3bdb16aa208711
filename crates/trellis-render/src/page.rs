//! Page-level render orchestration
//!
//! [`PageRenderer`] is the single entry point of a render pass. It sequences
//! migration, validation, template resolution, and slot rendering, and
//! gathers everything the pass produced into a [`RenderResult`].
//!
//! Validation failure is the only fail-fast exit: an invalid document yields
//! no tree, only issues. Everything after validation degrades instead of
//! aborting, including a missing template, which renders as a placeholder
//! root with its slots still rendered beneath it.

use crate::node::NodeRenderer;
use crate::resolver::{AdapterResolver, ResolveError, DEFAULT_PROVIDER};
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellis_core::{
    AdapterWarning, BoundEvent, CollectingSink, DocPath, ErrorCallback, NodeChildren, PageConfig,
    RegistrySet, RenderContext, RenderError, RenderedChildren, RenderedNode, ReportSink, ViewNode,
    WarningCallback,
};
use trellis_schema::{Migrator, Validator};

/// Issue code reported when the migration phase fails.
pub const MIGRATION_FAILED: &str = "migration_failed";

/// Tunables for one render pass.
#[derive(Clone)]
pub struct RenderOptions {
    /// Provider to resolve implementations for.
    pub provider: String,
    /// Depth ceiling for node recursion.
    pub max_depth: usize,
    /// Reject unknown extra fields during validation.
    pub strict: bool,
    /// Providers tried, in order, after the requested one.
    pub fallback_chain: Vec<String>,
    /// Version to migrate the document to before validation. Migration is
    /// skipped when this is `None` or the renderer has no migrator.
    pub target_version: Option<String>,
    /// Pass-scoped data made available to implementations.
    pub data: serde_json::Map<String, Value>,
    on_warning: Option<WarningCallback>,
    on_error: Option<ErrorCallback>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            max_depth: 32,
            strict: false,
            fallback_chain: vec![DEFAULT_PROVIDER.to_string()],
            target_version: None,
            data: serde_json::Map::new(),
            on_warning: None,
            on_error: None,
        }
    }
}

impl RenderOptions {
    /// Options for the given provider, everything else at defaults.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    /// Sets the depth ceiling.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables strict validation.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replaces the fallback chain.
    #[must_use]
    pub fn with_fallback_chain(mut self, chain: Vec<String>) -> Self {
        self.fallback_chain = chain;
        self
    }

    /// Requests migration to `version` before validation.
    #[must_use]
    pub fn with_target_version(mut self, version: impl Into<String>) -> Self {
        self.target_version = Some(version.into());
        self
    }

    /// Attaches pass-scoped data.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Streams each warning to `callback` as it is reported, before the
    /// pass completes.
    #[must_use]
    pub fn on_warning(mut self, callback: WarningCallback) -> Self {
        self.on_warning = Some(callback);
        self
    }

    /// Streams each error to `callback` as it is reported.
    #[must_use]
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("provider", &self.provider)
            .field("max_depth", &self.max_depth)
            .field("strict", &self.strict)
            .field("fallback_chain", &self.fallback_chain)
            .field("target_version", &self.target_version)
            .field("streaming", &(self.on_error.is_some() || self.on_warning.is_some()))
            .finish()
    }
}

/// Everything one render pass produced.
#[derive(Debug)]
pub struct RenderResult {
    /// The rendered tree; `None` only when migration or validation failed.
    pub tree: Option<RenderedNode>,
    /// Every error reported during the pass, in report order.
    pub errors: Vec<RenderError>,
    /// Every adapter warning reported during the pass.
    pub warnings: Vec<AdapterWarning>,
}

impl RenderResult {
    /// True when the pass produced a tree with no errors.
    pub fn is_clean(&self) -> bool {
        self.tree.is_some() && self.errors.is_empty()
    }

    fn failed(errors: Vec<RenderError>) -> Self {
        Self {
            tree: None,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Orchestrates a full render pass over a page document.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    registries: Arc<RegistrySet>,
    migrator: Option<Migrator>,
}

impl PageRenderer {
    /// Creates a renderer over the given registries, without migration
    /// support.
    pub fn new(registries: Arc<RegistrySet>) -> Self {
        Self {
            registries,
            migrator: None,
        }
    }

    /// Attaches a migrator so documents can be brought to a target version
    /// before validation.
    #[must_use]
    pub fn with_migrator(mut self, migrator: Migrator) -> Self {
        self.migrator = Some(migrator);
        self
    }

    /// Renders an untyped page document end to end.
    ///
    /// Never returns an `Err`: failures surface in [`RenderResult::errors`],
    /// and only migration or validation failure leaves `tree` empty.
    pub async fn render_page(&self, document: Value, options: &RenderOptions) -> RenderResult {
        let document = match self.migrate(document, options) {
            Ok(document) => document,
            Err(error) => return RenderResult::failed(vec![error]),
        };

        let validator = Validator::new(Arc::clone(&self.registries)).strict(options.strict);
        let config = match validator.validate(&document) {
            Ok(config) => config,
            Err(issues) => {
                return RenderResult::failed(issues.into_iter().map(RenderError::from).collect())
            }
        };

        info!(
            template = %config.template_kind,
            provider = %options.provider,
            slots = config.slots.len(),
            "rendering page"
        );

        let mut sink = CollectingSink::new();
        if let Some(callback) = &options.on_error {
            sink = sink.with_error_callback(Arc::clone(callback));
        }
        if let Some(callback) = &options.on_warning {
            sink = sink.with_warning_callback(Arc::clone(callback));
        }
        let sink = Arc::new(sink);

        let resolver = Arc::new(
            AdapterResolver::new(Arc::clone(&self.registries))
                .with_fallback_chain(options.fallback_chain.clone()),
        );
        let node_renderer = NodeRenderer::new(
            Arc::clone(&self.registries),
            Arc::clone(&resolver),
            Arc::clone(&sink) as Arc<dyn ReportSink>,
        );
        let ctx = RenderContext::new(&options.provider, options.max_depth)
            .with_data(options.data.clone());

        // Slot roots render at depth 0, concurrently and independently.
        let slots_path = DocPath::root().field("slots");
        let slot_futures = config.slots.iter().map(|(name, content)| {
            let slot_path = slots_path.field(name);
            let slot_ctx = ctx.clone();
            let renderer = &node_renderer;
            async move { (name.clone(), renderer.render_slot(content, slot_path, slot_ctx).await) }
        });
        let rendered_slots: BTreeMap<String, Vec<RenderedNode>> =
            join_all(slot_futures).await.into_iter().collect();

        let mut root = self
            .render_template_root(&config, &resolver, &ctx, sink.as_ref())
            .await;
        root.events = self.bind_global_behaviors(&config, sink.as_ref());
        root.children = RenderedChildren::Slots(rendered_slots);

        let (errors, warnings) = sink.take();
        debug!(errors = errors.len(), warnings = warnings.len(), "render pass complete");
        RenderResult {
            tree: Some(root),
            errors,
            warnings,
        }
    }

    fn migrate(&self, document: Value, options: &RenderOptions) -> Result<Value, RenderError> {
        let (Some(migrator), Some(target)) = (&self.migrator, &options.target_version) else {
            return Ok(document);
        };
        migrator.migrate(document, target).map_err(|err| {
            warn!(target = %target, error = %err, "migration failed");
            RenderError::Validation {
                path: DocPath::root().field("metadata").field("version"),
                message: err.to_string(),
                code: MIGRATION_FAILED.to_string(),
            }
        })
    }

    /// Resolves and constructs the template root. Resolution or construction
    /// failure degrades to a placeholder root; the slots render regardless.
    async fn render_template_root(
        &self,
        config: &PageConfig,
        resolver: &AdapterResolver,
        ctx: &RenderContext,
        sink: &CollectingSink,
    ) -> RenderedNode {
        let template_node = synthetic_template_node(config);

        let adapter = match resolver
            .resolve_template(&config.template_kind, &ctx.provider, sink)
            .await
        {
            Ok(adapter) => adapter,
            Err(err) => {
                let error = match err {
                    ResolveError::NotRegistered { .. } => RenderError::TemplateNotFound {
                        kind: config.template_kind.clone(),
                    },
                    err => RenderError::RenderFailure {
                        kind: config.template_kind.clone(),
                        path: DocPath::root().field("templateKind"),
                        depth: 0,
                        message: err.to_string(),
                        cause: None,
                    },
                };
                sink.error(error.clone());
                return RenderedNode::placeholder(
                    &config.template_kind,
                    error,
                    Value::Object(template_node.props),
                );
            }
        };

        match adapter.factory.construct(&template_node, ctx).await {
            Ok(payload) => RenderedNode::rendered(&config.template_kind, adapter.provider, payload),
            Err(err) => {
                let error = RenderError::RenderFailure {
                    kind: config.template_kind.clone(),
                    path: DocPath::root().field("templateKind"),
                    depth: 0,
                    message: "template implementation failed during construction".to_string(),
                    cause: Some(err.to_string()),
                };
                sink.error(error.clone());
                RenderedNode::placeholder(
                    &config.template_kind,
                    error,
                    Value::Object(template_node.props),
                )
            }
        }
    }

    /// Binds page-level behaviors onto the root. Validation guarantees the
    /// keys exist; a miss here is still reported rather than ignored.
    fn bind_global_behaviors(&self, config: &PageConfig, sink: &CollectingSink) -> Vec<BoundEvent> {
        let mut events = Vec::with_capacity(config.global_behaviors.len());
        for (name, key) in &config.global_behaviors {
            match self.registries.behaviors.get(key) {
                Some(handler) => {
                    events.push(BoundEvent::new(name.clone(), key.clone(), Vec::new(), Arc::clone(handler)))
                }
                None => sink.error(RenderError::BehaviorNotFound {
                    behavior: key.clone(),
                    event: name.clone(),
                    kind: config.template_kind.clone(),
                    path: DocPath::root().field("globalBehaviors").field(name),
                }),
            }
        }
        events
    }
}

/// The template renders through the same factory seam as any node; its
/// declaration is synthesized from the page metadata.
fn synthetic_template_node(config: &PageConfig) -> ViewNode {
    let mut props = serde_json::Map::new();
    props.insert("title".to_string(), Value::String(config.metadata.title.clone()));
    if !config.metadata.description.is_empty() {
        props.insert(
            "description".to_string(),
            Value::String(config.metadata.description.clone()),
        );
    }
    ViewNode {
        kind: config.template_kind.clone(),
        props,
        children: NodeChildren::None,
        on: BTreeMap::new(),
        key: None,
    }
}
