//! Relations: typed, directed edges between resources

use crate::{
    RelationStore, RelationType, RequestContext, Resource, ResourceFilter, ResourceRef, StructureId,
};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An edge of the relation graph
///
/// Endpoints are never absent: a missing id is [`StructureId::NULL`], a
/// missing path is the empty string.
///
/// Two relations are equal when their types are equal and each endpoint
/// agrees either by non-empty path or by non-null structure id.
#[derive(Debug, Clone)]
pub struct Relation {
    source_id: StructureId,
    source_path: String,
    target_id: StructureId,
    target_path: String,
    relation_type: RelationType,
}

impl Relation {
    /// Create a relation, normalizing missing endpoint fields
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::{Relation, RelationType, StructureId};
    ///
    /// let relation =
    ///     Relation::new(None, Some("/a.html".into()), None, None, RelationType::HYPERLINK);
    /// assert!(relation.target_id().is_null());
    /// assert_eq!(relation.target_path(), "");
    /// ```
    pub fn new(
        source_id: Option<StructureId>,
        source_path: Option<String>,
        target_id: Option<StructureId>,
        target_path: Option<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            source_id: source_id.unwrap_or(StructureId::NULL),
            source_path: source_path.unwrap_or_default(),
            target_id: target_id.unwrap_or(StructureId::NULL),
            target_path: target_path.unwrap_or_default(),
            relation_type,
        }
    }

    /// Create a relation between two known resources
    pub fn between(source: &Resource, target: &Resource, relation_type: RelationType) -> Self {
        Self {
            source_id: source.structure_id,
            source_path: source.root_path.clone(),
            target_id: target.structure_id,
            target_path: target.root_path.clone(),
            relation_type,
        }
    }

    /// Structure id of the source
    pub fn source_id(&self) -> StructureId {
        self.source_id
    }

    /// Root path of the source
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Structure id of the target
    pub fn target_id(&self) -> StructureId {
        self.target_id
    }

    /// Root path of the target
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Type of the edge
    pub fn relation_type(&self) -> &RelationType {
        &self.relation_type
    }

    /// Read the source resource
    ///
    /// Tries the structure id first. On a miss, reads the source path in the
    /// root site, since relation paths are root paths.
    pub fn source<S: RelationStore>(
        &self,
        store: &S,
        ctx: &mut RequestContext,
        filter: &ResourceFilter,
    ) -> Result<Option<Resource>, S::Error> {
        resolve_endpoint(store, ctx, filter, self.source_id, &self.source_path)
    }

    /// Read the target resource
    ///
    /// Same lookup order as [`source`](Self::source).
    pub fn target<S: RelationStore>(
        &self,
        store: &S,
        ctx: &mut RequestContext,
        filter: &ResourceFilter,
    ) -> Result<Option<Resource>, S::Error> {
        resolve_endpoint(store, ctx, filter, self.target_id, &self.target_path)
    }
}

fn resolve_endpoint<S: RelationStore>(
    store: &S,
    ctx: &mut RequestContext,
    filter: &ResourceFilter,
    id: StructureId,
    root_path: &str,
) -> Result<Option<Resource>, S::Error> {
    if !id.is_null() {
        if let Some(resource) = store.read_resource(ctx, ResourceRef::Id(id), filter)? {
            return Ok(Some(resource));
        }
        tracing::debug!("Relation endpoint {} not found by id, trying path {}", id, root_path);
    }
    if root_path.is_empty() {
        return Ok(None);
    }
    let root_ctx = ctx.switch_site_root(RequestContext::ROOT_SITE);
    store.read_resource(&root_ctx, ResourceRef::Path(root_path), filter)
}

// Empty paths and null ids never match anything but another absent endpoint
fn endpoint_matches(id: StructureId, path: &str, other_id: StructureId, other_path: &str) -> bool {
    if id.is_null() && path.is_empty() {
        return other_id.is_null() && other_path.is_empty();
    }
    (!path.is_empty() && path == other_path) || (!id.is_null() && id == other_id)
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.relation_type == other.relation_type
            && endpoint_matches(
                self.source_id,
                &self.source_path,
                other.source_id,
                &other.source_path,
            )
            && endpoint_matches(
                self.target_id,
                &self.target_path,
                other.target_id,
                &other.target_path,
            )
    }
}

impl Eq for Relation {}

// Equality may hold through either the id or the path of an endpoint, so only
// the type can take part in the hash.
impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation_type.hash(state);
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.source_path, self.relation_type, self.target_path
        )
    }
}
