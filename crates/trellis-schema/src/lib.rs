//! Document-level concerns: schema validation and version migration
//!
//! ## Pipeline position
//!
//! ```text
//! raw document (serde_json::Value)
//!       │
//!       ▼
//! Migrator ── finds and applies a migration chain to the current version
//!       │
//!       ▼
//! Validator ── checks structure and registry membership, all errors at once
//!       │
//!       ▼
//! PageConfig (typed, immutable for the rest of the pass)
//! ```
//!
//! Validation is all-or-nothing: a typed tree comes back only when zero
//! issues were found, but issue collection inside a pass is exhaustive so
//! callers see every problem at once.

pub mod migrate;
pub mod validate;

pub use migrate::{
    DocumentTransform, MigrateError, Migration, Migrator, MigratorBuilder, MissingVersionPolicy,
};
pub use validate::{codes, Validator};
