//! Linkguard Domain Layer
//!
//! This crate contains the model of the resource relation graph: typed,
//! directed edges between content resources and the descriptors used to
//! query them. It defines the trait boundary to the persisted graph and
//! carries no storage or validation logic of its own.
//!
//! ## Key Concepts
//!
//! - **Relation**: A typed, directed edge from a source resource to a target resource
//! - **Relation Type**: Classification of an edge (strong/weak, defined in
//!   content, system or user-defined)
//! - **Relation Filter**: An immutable query descriptor selecting edges by
//!   direction, endpoint, type and subtree
//! - **Online / Offline**: The published snapshot of the resource tree vs. the working snapshot
//! - **Structure Id**: Stable identifier of a resource, independent of its current path
//!
//! ## Architecture
//!
//! - Pure domain values only
//! - The relation type registry is an explicit object, never a global
//! - Infrastructure implementations of [`traits::RelationStore`] live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod filter;
pub mod id;
pub mod relation;
pub mod relation_type;
pub mod resource;
pub mod site;
pub mod traits;

// Re-exports for convenience
pub use context::{ContextGuard, Project, RequestContext};
pub use filter::{FilterMode, RelationFilter};
pub use id::StructureId;
pub use relation::Relation;
pub use relation_type::{CopyBehavior, RegistryError, RelationType, RelationTypeRegistry};
pub use resource::{PublishList, Resource, ResourceFilter, ResourceRef, ResourceState, ResourceType};
pub use site::{Site, SiteRegistry};
pub use traits::RelationStore;
