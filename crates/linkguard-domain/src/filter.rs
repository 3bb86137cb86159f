//! Relation filters: immutable query descriptors over the relation graph
//!
//! A filter is always applied relative to an anchor resource. The mode says
//! which end of the edge the caller wants to learn about:
//!
//! - [`RelationFilter::SOURCES`]: the anchor is the target, the caller wants
//!   the sources (who points at the anchor)
//! - [`RelationFilter::TARGETS`]: the anchor is the source, the caller wants
//!   the targets (what the anchor points at)
//! - [`RelationFilter::ALL`]: both
//!
//! Path and structure id restrictions apply to the wanted end. An empty type
//! set matches every type.

use crate::{Relation, RelationType, RelationTypeRegistry, Resource, StructureId};
use std::collections::BTreeSet;
use std::fmt;

/// Which end of the edge a filter is after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Sources of relations targeting the anchor
    Sources,

    /// Targets of relations originating at the anchor
    Targets,

    /// Both directions
    All,
}

impl FilterMode {
    /// Whether sources are wanted
    pub fn is_source(&self) -> bool {
        matches!(self, FilterMode::Sources | FilterMode::All)
    }

    /// Whether targets are wanted
    pub fn is_target(&self) -> bool {
        matches!(self, FilterMode::Targets | FilterMode::All)
    }

    fn label(&self) -> &'static str {
        match self {
            FilterMode::Sources => "source",
            FilterMode::Targets => "target",
            FilterMode::All => "both",
        }
    }
}

/// Immutable query descriptor for relations
///
/// Every `filter_*` method returns a new filter carrying the receiver's
/// restrictions plus the new one.
///
/// # Examples
///
/// ```
/// use linkguard_domain::{RelationFilter, RelationType};
///
/// let filter = RelationFilter::SOURCES
///     .filter_path("/sites/default/")
///     .filter_include_children()
///     .filter_type(RelationType::HYPERLINK);
///
/// assert!(filter.match_type(&RelationType::HYPERLINK));
/// assert!(!filter.match_type(&RelationType::EMBEDDED_IMAGE));
/// // The preset itself is untouched
/// assert!(RelationFilter::SOURCES.match_type(&RelationType::EMBEDDED_IMAGE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationFilter {
    mode: FilterMode,
    structure_id: Option<StructureId>,
    path: Option<String>,
    include_children: bool,
    types: BTreeSet<RelationType>,
}

impl RelationFilter {
    /// Who points at the anchor
    pub const SOURCES: RelationFilter = Self::preset(FilterMode::Sources);

    /// What the anchor points at
    pub const TARGETS: RelationFilter = Self::preset(FilterMode::Targets);

    /// Both directions
    pub const ALL: RelationFilter = Self::preset(FilterMode::All);

    const fn preset(mode: FilterMode) -> Self {
        Self {
            mode,
            structure_id: None,
            path: None,
            include_children: false,
            types: BTreeSet::new(),
        }
    }

    /// Restrict to one more relation type
    pub fn filter_type(&self, relation_type: RelationType) -> Self {
        let mut filter = self.clone();
        filter.types.insert(relation_type);
        filter
    }

    /// Restrict to several more relation types
    pub fn filter_types(&self, types: impl IntoIterator<Item = RelationType>) -> Self {
        let mut filter = self.clone();
        filter.types.extend(types);
        filter
    }

    /// Restrict the wanted end to a path
    pub fn filter_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..self.clone()
        }
    }

    /// Restrict the wanted end to a structure id
    pub fn filter_structure_id(&self, structure_id: StructureId) -> Self {
        Self {
            structure_id: Some(structure_id),
            ..self.clone()
        }
    }

    /// Let the path restriction also match everything below the path
    pub fn filter_include_children(&self) -> Self {
        Self {
            include_children: true,
            ..self.clone()
        }
    }

    /// Restrict to strong types
    ///
    /// With no types selected yet, selects every strong type; otherwise keeps
    /// only the strong ones among those already selected.
    pub fn filter_strong(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(registry.all_strong(), RelationType::is_strong)
    }

    /// Restrict to weak types
    pub fn filter_weak(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(registry.all_weak(), RelationType::is_weak)
    }

    /// Restrict to system types
    pub fn filter_internal(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(registry.all_internal(), RelationType::is_internal)
    }

    /// Restrict to user-defined types
    pub fn filter_user_defined(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(registry.all_user_defined(), RelationType::is_user_defined)
    }

    /// Restrict to types defined in content
    pub fn filter_defined_in_content(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(
            registry.all_defined_in_content(),
            RelationType::is_defined_in_content,
        )
    }

    /// Restrict to types not defined in content
    pub fn filter_not_defined_in_content(&self, registry: &RelationTypeRegistry) -> Self {
        self.narrow(registry.all_not_defined_in_content(), |t| {
            !t.is_defined_in_content()
        })
    }

    // NOTE: narrowing a non-empty selection down to nothing leaves an empty
    // set, which matches every type again.
    fn narrow(
        &self,
        when_empty: Vec<RelationType>,
        keep: fn(&RelationType) -> bool,
    ) -> Self {
        let mut filter = self.clone();
        filter.types = if self.types.is_empty() {
            when_empty.into_iter().collect()
        } else {
            self.types.iter().filter(|t| keep(t)).cloned().collect()
        };
        filter
    }

    /// Direction
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Whether sources are wanted
    pub fn is_source(&self) -> bool {
        self.mode.is_source()
    }

    /// Whether targets are wanted
    pub fn is_target(&self) -> bool {
        self.mode.is_target()
    }

    /// Structure id restriction
    pub fn structure_id(&self) -> Option<StructureId> {
        self.structure_id
    }

    /// Path restriction
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether the path restriction covers the subtree
    pub fn includes_children(&self) -> bool {
        self.include_children
    }

    /// Selected types; empty means all
    pub fn types(&self) -> &BTreeSet<RelationType> {
        &self.types
    }

    /// Whether relations of `relation_type` pass
    pub fn match_type(&self, relation_type: &RelationType) -> bool {
        self.types.is_empty() || self.types.contains(relation_type)
    }

    /// Whether `path` passes the path restriction
    pub fn match_path(&self, path: &str) -> bool {
        match &self.path {
            None => true,
            Some(filter_path) if filter_path.is_empty() => true,
            Some(filter_path) if self.include_children => path.starts_with(filter_path.as_str()),
            Some(filter_path) => path == filter_path,
        }
    }

    /// Whether `structure_id` passes the id restriction
    pub fn match_structure_id(&self, structure_id: StructureId) -> bool {
        self.structure_id.map_or(true, |id| id == structure_id)
    }

    /// Evaluate the filter against a relation, relative to `anchor`
    ///
    /// Used by in-memory stores and tests; persistent stores translate the
    /// same rules into their query language.
    pub fn matches(&self, relation: &Relation, anchor: Option<&Resource>) -> bool {
        let either = |source: bool, target: bool| match self.mode {
            FilterMode::Sources => source,
            FilterMode::Targets => target,
            FilterMode::All => source || target,
        };

        // The anchor sits at the opposite end of the wanted one
        if let Some(anchor) = anchor {
            let is_anchor = |id: StructureId, path: &str| {
                id == anchor.structure_id || (id.is_null() && path == anchor.root_path)
            };
            if !either(
                is_anchor(relation.target_id(), relation.target_path()),
                is_anchor(relation.source_id(), relation.source_path()),
            ) {
                return false;
            }
        }
        if !either(
            self.match_structure_id(relation.source_id()),
            self.match_structure_id(relation.target_id()),
        ) {
            return false;
        }
        if !either(
            self.match_path(relation.source_path()),
            self.match_path(relation.target_path()),
        ) {
            return false;
        }
        self.match_type(relation.relation_type())
    }
}

impl From<FilterMode> for RelationFilter {
    fn from(mode: FilterMode) -> Self {
        Self::preset(mode)
    }
}

impl fmt::Display for RelationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<&str> = self.types.iter().map(RelationType::name).collect();
        write!(
            f,
            "[{}, {}, [{}], {}]",
            self.mode.label(),
            self.path.as_deref().unwrap_or("*"),
            types.join(", "),
            self.include_children
        )
    }
}
