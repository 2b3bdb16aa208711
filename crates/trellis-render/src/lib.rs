//! Page Rendering Layer
//!
//! This crate turns a validated page document into a rendered output tree.
//!
//! ## Architecture
//!
//! The render pass coordinates four phases:
//! 1. **Migrate** (optional): bring the document to the current version via
//!    `trellis-schema`'s migration graph
//! 2. **Validate**: check the document against the registries; validation
//!    failure is the only fail-fast exit
//! 3. **Resolve**: locate a provider implementation for each kind, walking
//!    the fallback chain and emitting warnings on fallback
//! 4. **Render**: recursively build the output tree with per-node failure
//!    isolation and a depth ceiling
//!
//! ## Clear Separation of Concerns
//!
//! Infrastructure crates (DO NOT orchestrate):
//! - `trellis-core`: types, registries, capability traits, sinks
//! - `trellis-schema`: validation and migration only
//!
//! This crate (trellis-render):
//! - Coordinates the phases in the right order
//! - Owns the fallback and isolation policies
//! - Provides the single entry point ([`PageRenderer`]) for callers

pub mod node;
pub mod page;
pub mod resolver;

pub use node::NodeRenderer;
pub use page::{PageRenderer, RenderOptions, RenderResult};
pub use resolver::{AdapterResolver, ResolveError, ResolvedAdapter};
