//! Provider-adapter resolution with fallback
//!
//! For each node or template kind the resolver asks the registry handle for
//! an implementation under the requested provider, then walks the fallback
//! chain in order. The first hit through a non-requested provider emits
//! exactly one `FALLBACK` warning; an exhausted chain is an error, not a
//! fallback, and emits no warning.
//!
//! Resolution is async so handles backed by an [`ImplementationSource`] can
//! load implementations on demand. Concurrent resolutions for different
//! kinds are independent and may complete in any order.
//!
//! [`ImplementationSource`]: trellis_core::ImplementationSource

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use trellis_core::{
    AdapterWarning, KindHandle, Registry, RegistrySet, RenderableFactory, ReportSink,
};

/// Default canonical provider, tried after the requested one.
pub const DEFAULT_PROVIDER: &str = "default";

/// A successfully resolved implementation, tagged with the provider that
/// actually served it.
#[derive(Clone)]
pub struct ResolvedAdapter {
    /// The implementation to construct the node with.
    pub factory: Arc<dyn RenderableFactory>,
    /// Provider that served the implementation; differs from the requested
    /// provider after a fallback.
    pub provider: String,
}

impl std::fmt::Debug for ResolvedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedAdapter")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Why resolution failed.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The kind has no entry in its catalog at all.
    #[error("'{kind}' is not registered in the {catalog} catalog")]
    NotRegistered {
        /// Catalog that was consulted.
        catalog: &'static str,
        /// The missing kind.
        kind: String,
    },

    /// No provider in the chain had an implementation.
    #[error("no implementation of '{kind}' for any of: {}", tried.join(", "))]
    NoProvider {
        /// The kind being resolved.
        kind: String,
        /// Providers tried, in order.
        tried: Vec<String>,
    },

    /// An implementation source failed while being consulted. This is a
    /// genuine failure, distinct from "not available for this provider".
    #[error("implementation source for '{kind}' failed under provider '{provider}': {message}")]
    SourceFailed {
        /// The kind being resolved.
        kind: String,
        /// Provider the source was asked about.
        provider: String,
        /// The source's error.
        message: String,
    },
}

/// Resolves kinds to provider implementations through the registry set.
#[derive(Debug, Clone)]
pub struct AdapterResolver {
    registries: Arc<RegistrySet>,
    fallback_chain: Vec<String>,
}

impl AdapterResolver {
    /// Creates a resolver whose fallback chain is the canonical default
    /// provider.
    pub fn new(registries: Arc<RegistrySet>) -> Self {
        Self {
            registries,
            fallback_chain: vec![DEFAULT_PROVIDER.to_string()],
        }
    }

    /// Replaces the fallback chain, tried in order after the requested
    /// provider.
    #[must_use]
    pub fn with_fallback_chain(mut self, chain: Vec<String>) -> Self {
        self.fallback_chain = chain;
        self
    }

    /// Resolves a node kind for the requested provider, falling back across
    /// the chain. Fallback hits are reported to `sink`.
    pub async fn resolve_kind(
        &self,
        kind: &str,
        requested: &str,
        sink: &dyn ReportSink,
    ) -> Result<ResolvedAdapter, ResolveError> {
        self.resolve_in(&self.registries.kinds, kind, requested, sink)
            .await
    }

    /// Resolves a template kind; same walk as [`Self::resolve_kind`] over
    /// the template catalog.
    pub async fn resolve_template(
        &self,
        kind: &str,
        requested: &str,
        sink: &dyn ReportSink,
    ) -> Result<ResolvedAdapter, ResolveError> {
        self.resolve_in(&self.registries.templates, kind, requested, sink)
            .await
    }

    async fn resolve_in(
        &self,
        registry: &Registry<KindHandle>,
        kind: &str,
        requested: &str,
        sink: &dyn ReportSink,
    ) -> Result<ResolvedAdapter, ResolveError> {
        let Some(handle) = registry.get(kind) else {
            return Err(ResolveError::NotRegistered {
                catalog: registry.catalog(),
                kind: kind.to_string(),
            });
        };

        let mut tried = Vec::new();
        for provider in self.provider_chain(requested) {
            tried.push(provider.clone());

            let factory = match handle {
                // Provider-agnostic: serves whatever provider asks first,
                // so it never counts as a fallback.
                KindHandle::Fixed(factory) => Some(Arc::clone(factory)),
                KindHandle::PerProvider(map) => map.get(&provider).map(Arc::clone),
                KindHandle::Source(source) => source
                    .resolve(kind, &provider)
                    .await
                    .map_err(|err| ResolveError::SourceFailed {
                        kind: kind.to_string(),
                        provider: provider.clone(),
                        message: err.to_string(),
                    })?,
            };

            if let Some(factory) = factory {
                if provider != requested {
                    debug!(kind, requested, fallback = %provider, "adapter resolved via fallback");
                    sink.warning(AdapterWarning::fallback(kind, requested, &provider));
                }
                return Ok(ResolvedAdapter { factory, provider });
            }
        }

        Err(ResolveError::NoProvider {
            kind: kind.to_string(),
            tried,
        })
    }

    /// The requested provider followed by the fallback chain, deduplicated.
    fn provider_chain(&self, requested: &str) -> Vec<String> {
        let mut chain = vec![requested.to_string()];
        for provider in &self.fallback_chain {
            if !chain.iter().any(|p| p == provider) {
                chain.push(provider.clone());
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use trellis_core::{
        CollectingSink, ImplementationSource, Registry, RenderContext, ViewNode, WarningKind,
    };

    struct TagFactory(&'static str);

    #[async_trait]
    impl RenderableFactory for TagFactory {
        async fn construct(&self, _: &ViewNode, _: &RenderContext) -> anyhow::Result<Value> {
            Ok(json!({"tag": self.0}))
        }
    }

    fn arc(tag: &'static str) -> Arc<dyn RenderableFactory> {
        Arc::new(TagFactory(tag))
    }

    fn registries() -> Arc<RegistrySet> {
        let kinds = Registry::builder("kind")
            .register(
                "Card",
                KindHandle::per_provider([("web", arc("card-web")), ("default", arc("card-default"))]),
            )
            .register("Badge", KindHandle::per_provider([("default", arc("badge-default"))]))
            .register("Spacer", KindHandle::fixed(TagFactory("spacer")))
            .register("Orphan", KindHandle::per_provider([("ios", arc("orphan-ios"))]))
            .build();
        Arc::new(RegistrySet::new(
            kinds,
            Registry::empty("template"),
            Registry::empty("behavior"),
        ))
    }

    #[tokio::test]
    async fn requested_provider_wins_without_warning() {
        let resolver = AdapterResolver::new(registries());
        let sink = CollectingSink::new();
        let adapter = resolver.resolve_kind("Card", "web", &sink).await.unwrap();
        assert_eq!(adapter.provider, "web");
        assert_eq!(sink.warning_count(), 0);
    }

    #[tokio::test]
    async fn fallback_emits_exactly_one_warning() {
        let resolver = AdapterResolver::new(registries());
        let sink = CollectingSink::new();
        let adapter = resolver.resolve_kind("Badge", "web", &sink).await.unwrap();
        assert_eq!(adapter.provider, "default");

        let (_, warnings) = sink.take();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Fallback);
        assert_eq!(warnings[0].requested_provider, "web");
        assert_eq!(warnings[0].fallback_provider.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn fixed_handles_serve_any_provider_without_warning() {
        let resolver = AdapterResolver::new(registries());
        let sink = CollectingSink::new();
        let adapter = resolver.resolve_kind("Spacer", "tv", &sink).await.unwrap();
        assert_eq!(adapter.provider, "tv");
        assert_eq!(sink.warning_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_chain_is_an_error_with_no_warning() {
        let resolver = AdapterResolver::new(registries());
        let sink = CollectingSink::new();
        let err = resolver.resolve_kind("Orphan", "web", &sink).await.unwrap_err();
        match err {
            ResolveError::NoProvider { kind, tried } => {
                assert_eq!(kind, "Orphan");
                assert_eq!(tried, vec!["web".to_string(), "default".to_string()]);
            }
            other => panic!("expected NoProvider, got {:?}", other),
        }
        assert_eq!(sink.warning_count(), 0);
    }

    #[tokio::test]
    async fn unregistered_kind_is_distinguished_from_no_provider() {
        let resolver = AdapterResolver::new(registries());
        let sink = CollectingSink::new();
        let err = resolver.resolve_kind("Sparkline", "web", &sink).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotRegistered { .. }));
    }

    #[tokio::test]
    async fn sources_are_consulted_lazily_and_null_means_try_fallback() {
        struct OnlyDefault;

        #[async_trait]
        impl ImplementationSource for OnlyDefault {
            async fn resolve(
                &self,
                _kind: &str,
                provider: &str,
            ) -> anyhow::Result<Option<Arc<dyn RenderableFactory>>> {
                Ok((provider == "default").then(|| arc("lazy-default")))
            }
        }

        let kinds = Registry::builder("kind")
            .register("Chart", KindHandle::source(OnlyDefault))
            .build();
        let registries = Arc::new(RegistrySet::new(
            kinds,
            Registry::empty("template"),
            Registry::empty("behavior"),
        ));
        let resolver = AdapterResolver::new(registries);
        let sink = CollectingSink::new();

        let adapter = resolver.resolve_kind("Chart", "web", &sink).await.unwrap();
        assert_eq!(adapter.provider, "default");
        assert_eq!(sink.warning_count(), 1);
    }

    #[tokio::test]
    async fn source_failure_is_a_genuine_error() {
        struct Broken;

        #[async_trait]
        impl ImplementationSource for Broken {
            async fn resolve(
                &self,
                _: &str,
                _: &str,
            ) -> anyhow::Result<Option<Arc<dyn RenderableFactory>>> {
                Err(anyhow::anyhow!("bundle download failed"))
            }
        }

        let kinds = Registry::builder("kind")
            .register("Chart", KindHandle::source(Broken))
            .build();
        let registries = Arc::new(RegistrySet::new(
            kinds,
            Registry::empty("template"),
            Registry::empty("behavior"),
        ));
        let resolver = AdapterResolver::new(registries);
        let sink = CollectingSink::new();

        let err = resolver.resolve_kind("Chart", "web", &sink).await.unwrap_err();
        assert!(matches!(err, ResolveError::SourceFailed { .. }));
        assert_eq!(sink.warning_count(), 0);
    }
}
