//! Core types and traits for the Trellis rendering engine
//!
//! Trellis turns a declarative, serialized description of a view hierarchy
//! into a tree of live, provider-specific implementation payloads. This crate
//! defines the shared vocabulary; it performs no orchestration itself.
//!
//! ## Architecture
//!
//! - **Document model** ([`document`]): the typed configuration tree
//!   (`PageConfig`, `ViewNode`) produced by validation.
//! - **Registries** ([`registry`]): three independent, build-once catalogs
//!   (node kinds, templates, behaviors) that are read-only during rendering.
//! - **Capability traits** ([`traits`]): the seams through which concrete
//!   visual components, providers, and behaviors are consumed. The engine
//!   never sees their internals.
//! - **Report sinks** ([`sink`]): append-only accumulation of errors and
//!   warnings for the lifetime of one render pass.
//!
//! Higher-level crates depend on this one: `trellis-schema` validates and
//! migrates documents, `trellis-render` resolves adapters and renders trees.

pub mod context;
pub mod document;
pub mod error;
pub mod path;
pub mod registry;
pub mod rendered;
pub mod sink;
pub mod traits;
pub mod warning;

pub use context::RenderContext;
pub use document::{
    BehaviorRef, DataSource, NodeChildren, PageConfig, PageMetadata, SlotContent, ViewNode,
};
pub use error::{RegistryError, RenderError, ValidationIssue};
pub use path::{DocPath, PathSegment};
pub use registry::{KindHandle, Registry, RegistryBuilder, RegistrySet};
pub use rendered::{BoundEvent, NodeOutcome, RenderedChildren, RenderedNode};
pub use sink::{CollectingSink, ErrorCallback, ReportSink, WarningCallback};
pub use traits::{Behavior, ImplementationSource, RenderableFactory};
pub use warning::{AdapterWarning, WarningKind};
