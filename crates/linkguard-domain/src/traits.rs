//! Trait definitions for external interactions
//!
//! The relation graph and the resource tree are persisted elsewhere. These
//! traits define the boundary; implementations live in other crates.

use crate::{
    Relation, RelationFilter, RequestContext, Resource, ResourceFilter, ResourceRef, ResourceType,
};

/// Persisted relation graph and resource tree
///
/// Every call is blocking and authoritative for the project and site root
/// the context carries at call time. Paths passed in are site paths,
/// resolved against `ctx.site_root()`; paths returned are root paths.
///
/// Implemented by the infrastructure layer (linkguard-store)
pub trait RelationStore {
    /// Error type for store operations
    type Error;

    /// Read one resource by structure id or path
    ///
    /// A resource that does not exist, or does not pass `filter`, is `None`.
    fn read_resource(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef<'_>,
        filter: &ResourceFilter,
    ) -> Result<Option<Resource>, Self::Error>;

    /// Read the resources below the folder `path`
    ///
    /// Direct children only, unless `recursive` is set. The folder itself is
    /// not included.
    fn read_resources(
        &self,
        ctx: &RequestContext,
        path: &str,
        filter: &ResourceFilter,
        recursive: bool,
    ) -> Result<Vec<Resource>, Self::Error>;

    /// Read every resource sharing content with `path`, including itself
    fn read_siblings(
        &self,
        ctx: &RequestContext,
        path: &str,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, Self::Error>;

    /// All configured resource types
    fn resource_types(&self) -> Result<Vec<ResourceType>, Self::Error>;

    /// Relations of `resource` matching `filter`
    fn find_relations(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, Self::Error>;

    /// Add a relation between two resources, by site path and type name
    fn add_relation(
        &mut self,
        ctx: &RequestContext,
        source_path: &str,
        target_path: &str,
        type_name: &str,
    ) -> Result<Relation, Self::Error>;

    /// Delete the relations of `resource` matching `filter`
    ///
    /// Returns the number of deleted relations.
    fn delete_relations(
        &mut self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<usize, Self::Error>;
}
