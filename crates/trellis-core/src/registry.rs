//! Build-once registries for kinds, templates, and behaviors
//!
//! Registries are populated at process start through a builder, then frozen.
//! Rendering code only ever reads them, so they are shared via `Arc` with no
//! locking. Rebuild and swap the set to change contents between passes.
//!
//! The three catalogs are independent: a key collision across catalogs is
//! legal and has no cross-effect.

use crate::error::RegistryError;
use crate::traits::{Behavior, ImplementationSource, RenderableFactory};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A read-only string-keyed catalog.
#[derive(Clone)]
pub struct Registry<T> {
    catalog: &'static str,
    entries: HashMap<String, T>,
}

impl<T> Registry<T> {
    /// Starts a builder for a catalog with the given name. The name appears
    /// in lookup errors ("not found in the template catalog").
    pub fn builder(catalog: &'static str) -> RegistryBuilder<T> {
        RegistryBuilder {
            catalog,
            entries: HashMap::new(),
        }
    }

    /// An empty catalog, mostly useful in tests.
    pub fn empty(catalog: &'static str) -> Self {
        Self::builder(catalog).build()
    }

    /// True if the catalog holds `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Looks up `key`, returning `None` when absent.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Looks up `key`, failing with a `NotFound` error that lists every
    /// valid key; the validator uses this for "must be one of" messages.
    pub fn get_required(&self, key: &str) -> Result<&T, RegistryError> {
        self.entries.get(key).ok_or_else(|| RegistryError::NotFound {
            catalog: self.catalog,
            key: key.to_string(),
            known: self.keys().into_iter().map(String::from).collect(),
        })
    }

    /// All keys in the catalog, sorted for deterministic output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Iterates over key-value pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The catalog name this registry was built with.
    pub fn catalog(&self) -> &'static str {
        self.catalog
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("catalog", &self.catalog)
            .field("keys", &self.keys())
            .finish()
    }
}

/// Accumulates registrations, then freezes into a [`Registry`].
///
/// Later registrations of the same key replace earlier ones.
pub struct RegistryBuilder<T> {
    catalog: &'static str,
    entries: HashMap<String, T>,
}

impl<T> RegistryBuilder<T> {
    /// Registers a key-value pair.
    #[must_use]
    pub fn register(mut self, key: impl Into<String>, value: T) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Freezes the builder into an immutable registry.
    pub fn build(self) -> Registry<T> {
        Registry {
            catalog: self.catalog,
            entries: self.entries,
        }
    }
}

/// The implementation handle stored for each node or template kind.
///
/// A handle is either provider-agnostic, provider-polymorphic, or deferred
/// to an external source asked at resolve time. The resolver selects through
/// this single tagged union rather than ad hoc type checks.
#[derive(Clone)]
pub enum KindHandle {
    /// One implementation serves every provider; never triggers fallback.
    Fixed(Arc<dyn RenderableFactory>),
    /// Provider name to implementation.
    PerProvider(HashMap<String, Arc<dyn RenderableFactory>>),
    /// Deferred to an on-demand source (lazy loading).
    Source(Arc<dyn ImplementationSource>),
}

impl KindHandle {
    /// Wraps a provider-agnostic factory.
    pub fn fixed(factory: impl RenderableFactory + 'static) -> Self {
        Self::Fixed(Arc::new(factory))
    }

    /// Builds a provider-polymorphic handle from `(provider, factory)` pairs.
    pub fn per_provider<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Arc<dyn RenderableFactory>)>,
        K: Into<String>,
    {
        Self::PerProvider(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wraps an on-demand implementation source.
    pub fn source(source: impl ImplementationSource + 'static) -> Self {
        Self::Source(Arc::new(source))
    }
}

// Handles hold trait objects, so Debug shows only the variant shape.
impl fmt::Debug for KindHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindHandle::Fixed(_) => f.write_str("KindHandle::Fixed"),
            KindHandle::PerProvider(map) => {
                let mut providers: Vec<&str> = map.keys().map(String::as_str).collect();
                providers.sort_unstable();
                f.debug_tuple("KindHandle::PerProvider")
                    .field(&providers)
                    .finish()
            }
            KindHandle::Source(_) => f.write_str("KindHandle::Source"),
        }
    }
}

/// The three independent catalogs consulted during validation and rendering.
#[derive(Debug, Clone)]
pub struct RegistrySet {
    /// View-node kinds.
    pub kinds: Registry<KindHandle>,
    /// Layout templates.
    pub templates: Registry<KindHandle>,
    /// Event behaviors.
    pub behaviors: Registry<Arc<dyn Behavior>>,
}

impl RegistrySet {
    /// Assembles a set from three built registries.
    pub fn new(
        kinds: Registry<KindHandle>,
        templates: Registry<KindHandle>,
        behaviors: Registry<Arc<dyn Behavior>>,
    ) -> Self {
        Self {
            kinds,
            templates,
            behaviors,
        }
    }

    /// An entirely empty set, mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            kinds: Registry::empty("kind"),
            templates: Registry::empty("template"),
            behaviors: Registry::empty("behavior"),
        }
    }
}
