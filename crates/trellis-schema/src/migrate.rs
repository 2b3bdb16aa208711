//! Version migration over a declared migration graph
//!
//! Migrations form a directed graph (`from` version -> `to` version, each
//! edge carrying a transform). Path search is breadth-first, so the shortest
//! chain wins; applying a path is a left-fold of transforms over the
//! document. Any transform failure aborts the whole migration with the
//! causing error attached.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// A single document transform, applied when migrating across one edge.
pub trait DocumentTransform: Send + Sync {
    /// Transforms a document from this edge's `from` version to its `to`
    /// version.
    fn apply(&self, document: Value) -> anyhow::Result<Value>;
}

impl<F> DocumentTransform for F
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    fn apply(&self, document: Value) -> anyhow::Result<Value> {
        self(document)
    }
}

/// One edge of the migration graph.
#[derive(Clone)]
pub struct Migration {
    /// Version this migration upgrades from.
    pub from: String,
    /// Version this migration upgrades to.
    pub to: String,
    transform: Arc<dyn DocumentTransform>,
}

impl Migration {
    /// Creates a migration edge.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        transform: impl DocumentTransform + 'static,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transform: Arc::new(transform),
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Migration({} -> {})", self.from, self.to)
    }
}

/// Errors raised by [`Migrator::migrate`].
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The declared and target versions are in disconnected components.
    #[error("no migration path from version '{from}' to '{to}'")]
    NoPath {
        /// The document's declared version.
        from: String,
        /// The requested target version.
        to: String,
    },

    /// A transform along the path failed; the chain is aborted.
    #[error("migration '{from}' -> '{to}' failed")]
    TransformFailed {
        /// Edge start.
        from: String,
        /// Edge end.
        to: String,
        /// The causing error.
        #[source]
        source: anyhow::Error,
    },

    /// The document declares no version and the policy is `Reject`.
    #[error("document declares no version and the missing-version policy rejects it")]
    MissingVersion,
}

/// What to do with a document that declares no version.
///
/// Treating an unversioned document as current is deliberate leniency for
/// forward compatibility; deployments that want rejection instead opt into
/// `Reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingVersionPolicy {
    /// Assume the document is already at the target version and stamp it.
    #[default]
    AssumeCurrent,
    /// Fail with [`MigrateError::MissingVersion`].
    Reject,
}

/// Builds a [`Migrator`] from individual migration edges.
#[derive(Debug, Default)]
pub struct MigratorBuilder {
    migrations: Vec<Migration>,
    policy: MissingVersionPolicy,
}

impl MigratorBuilder {
    /// Registers a migration edge.
    #[must_use]
    pub fn register(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Sets the missing-version policy.
    #[must_use]
    pub fn missing_version_policy(mut self, policy: MissingVersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Freezes the builder into a migrator.
    pub fn build(self) -> Migrator {
        let mut edges: HashMap<String, Vec<Migration>> = HashMap::new();
        for migration in self.migrations {
            edges.entry(migration.from.clone()).or_default().push(migration);
        }
        Migrator {
            edges,
            policy: self.policy,
        }
    }
}

/// Finds and applies migration chains between document versions.
#[derive(Debug, Clone)]
pub struct Migrator {
    edges: HashMap<String, Vec<Migration>>,
    policy: MissingVersionPolicy,
}

impl Migrator {
    /// Starts an empty builder.
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::default()
    }

    /// Finds the shortest ordered chain of migrations from `from` to `to`.
    ///
    /// Returns an empty chain when `from == to` and `None` when the versions
    /// are in disconnected components of the graph.
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<&Migration>> {
        if from == to {
            return Some(Vec::new());
        }

        // BFS, tracking the edge that first reached each version.
        let mut visited: HashMap<&str, &Migration> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(version) = queue.pop_front() {
            for edge in self.edges.get(version).map(Vec::as_slice).unwrap_or(&[]) {
                if edge.to == to {
                    let mut path = vec![edge];
                    let mut back = version;
                    while back != from {
                        let edge = visited[back];
                        path.push(edge);
                        back = &edge.from;
                    }
                    path.reverse();
                    return Some(path);
                }
                if !visited.contains_key(edge.to.as_str()) && edge.to != from {
                    visited.insert(edge.to.as_str(), edge);
                    queue.push_back(edge.to.as_str());
                }
            }
        }
        None
    }

    /// Migrates `document` to `target`, returning the transformed document
    /// stamped with the target version.
    ///
    /// A document already at the target version is returned unchanged apart
    /// from the stamp, which makes migration idempotent.
    pub fn migrate(&self, document: Value, target: &str) -> Result<Value, MigrateError> {
        let declared = document
            .get("metadata")
            .and_then(|m| m.get("version"))
            .and_then(Value::as_str)
            .map(String::from);

        let from = match declared {
            Some(version) => version,
            None => match self.policy {
                MissingVersionPolicy::AssumeCurrent => {
                    debug!(target, "document declares no version; assuming current");
                    return Ok(stamp_version(document, target));
                }
                MissingVersionPolicy::Reject => return Err(MigrateError::MissingVersion),
            },
        };

        if from == target {
            return Ok(stamp_version(document, target));
        }

        let path = self
            .find_path(&from, target)
            .ok_or_else(|| MigrateError::NoPath {
                from: from.clone(),
                to: target.to_string(),
            })?;

        info!(from = %from, to = %target, steps = path.len(), "migrating document");

        let mut document = document;
        for edge in path {
            document =
                edge.transform
                    .apply(document)
                    .map_err(|source| MigrateError::TransformFailed {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        source,
                    })?;
        }

        Ok(stamp_version(document, target))
    }
}

/// Sets `metadata.version`, creating the metadata object if needed.
fn stamp_version(mut document: Value, version: &str) -> Value {
    if let Some(root) = document.as_object_mut() {
        let metadata = root
            .entry("metadata")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Some(metadata) = metadata.as_object_mut() {
            metadata.insert("version".to_string(), Value::String(version.to_string()));
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rename_field(from: &'static str, to: &'static str) -> impl DocumentTransform {
        move |mut document: Value| -> anyhow::Result<Value> {
            if let Some(root) = document.as_object_mut() {
                if let Some(value) = root.remove(from) {
                    root.insert(to.to_string(), value);
                }
            }
            Ok(document)
        }
    }

    fn sample_migrator() -> Migrator {
        Migrator::builder()
            .register(Migration::new("1.0", "1.1", rename_field("layout", "templateKind")))
            .register(Migration::new("1.1", "2.0", rename_field("regions", "slots")))
            // A longer detour that BFS should not take.
            .register(Migration::new("1.0", "1.5", rename_field("a", "b")))
            .register(Migration::new("1.5", "1.6", rename_field("b", "c")))
            .register(Migration::new("1.6", "2.0", rename_field("c", "d")))
            .build()
    }

    #[test]
    fn find_path_prefers_the_shortest_chain() {
        let migrator = sample_migrator();
        let path = migrator.find_path("1.0", "2.0").expect("path should exist");
        let hops: Vec<(&str, &str)> = path.iter().map(|m| (m.from.as_str(), m.to.as_str())).collect();
        assert_eq!(hops, vec![("1.0", "1.1"), ("1.1", "2.0")]);
    }

    #[test]
    fn find_path_returns_none_for_disconnected_versions() {
        let migrator = sample_migrator();
        assert!(migrator.find_path("2.0", "1.0").is_none());
        assert!(migrator.find_path("0.1", "2.0").is_none());
    }

    #[test]
    fn migrate_applies_transforms_in_order_and_stamps_version() {
        let migrator = sample_migrator();
        let doc = json!({
            "metadata": {"title": "Home", "version": "1.0"},
            "layout": "Dashboard",
            "regions": {}
        });
        let migrated = migrator.migrate(doc, "2.0").unwrap();
        assert_eq!(migrated["templateKind"], json!("Dashboard"));
        assert!(migrated.get("layout").is_none());
        assert!(migrated.get("slots").is_some());
        assert_eq!(migrated["metadata"]["version"], json!("2.0"));
    }

    #[test]
    fn migrate_is_idempotent() {
        let migrator = sample_migrator();
        let doc = json!({
            "metadata": {"title": "Home", "version": "1.0"},
            "layout": "Dashboard"
        });
        let once = migrator.migrate(doc, "2.0").unwrap();
        let twice = migrator.migrate(once.clone(), "2.0").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn disconnected_graph_is_an_error_not_a_noop() {
        let migrator = sample_migrator();
        let doc = json!({"metadata": {"title": "T", "version": "0.9"}});
        let err = migrator.migrate(doc, "2.0").unwrap_err();
        assert!(matches!(err, MigrateError::NoPath { .. }));
    }

    #[test]
    fn transform_failure_aborts_with_cause() {
        let migrator = Migrator::builder()
            .register(Migration::new("1.0", "2.0", |_: Value| -> anyhow::Result<Value> {
                Err(anyhow::anyhow!("upgrade script rejected the document"))
            }))
            .build();
        let doc = json!({"metadata": {"version": "1.0"}});
        let err = migrator.migrate(doc, "2.0").unwrap_err();
        match err {
            MigrateError::TransformFailed { from, to, source } => {
                assert_eq!(from, "1.0");
                assert_eq!(to, "2.0");
                assert!(source.to_string().contains("rejected"));
            }
            other => panic!("expected TransformFailed, got {:?}", other),
        }
    }

    #[test]
    fn missing_version_follows_policy() {
        let doc = json!({"metadata": {"title": "T"}});

        let lenient = sample_migrator();
        let stamped = lenient.migrate(doc.clone(), "2.0").unwrap();
        assert_eq!(stamped["metadata"]["version"], json!("2.0"));

        let strict = Migrator::builder()
            .missing_version_policy(MissingVersionPolicy::Reject)
            .build();
        let err = strict.migrate(doc, "2.0").unwrap_err();
        assert!(matches!(err, MigrateError::MissingVersion));
    }
}
