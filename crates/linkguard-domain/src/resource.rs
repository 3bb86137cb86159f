//! Resources of the content tree, as far as relation validation sees them

use crate::StructureId;
use std::fmt;

/// Release date meaning "always released"
pub const DATE_RELEASED_DEFAULT: u64 = 0;

/// Expiration date meaning "never expires"
pub const DATE_EXPIRED_DEFAULT: u64 = u64::MAX;

/// Type name used for folders
pub const FOLDER_TYPE: &str = "folder";

/// Lifecycle state of a resource in the working tree relative to the published tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Identical to the published version
    Unchanged,

    /// Modified since the last publish
    Changed,

    /// Never published
    New,

    /// Marked for deletion, removed from the published tree on the next publish
    Deleted,
}

impl ResourceState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Unchanged => "unchanged",
            ResourceState::Changed => "changed",
            ResourceState::New => "new",
            ResourceState::Deleted => "deleted",
        }
    }

    /// Parse a state from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unchanged" => Some(ResourceState::Unchanged),
            "changed" => Some(ResourceState::Changed),
            "new" => Some(ResourceState::New),
            "deleted" => Some(ResourceState::Deleted),
            _ => None,
        }
    }

    /// Whether the resource is marked for deletion
    pub fn is_deleted(&self) -> bool {
        matches!(self, ResourceState::Deleted)
    }

    /// Whether the resource was never published
    pub fn is_new(&self) -> bool {
        matches!(self, ResourceState::New)
    }

    /// Whether the resource differs from its published version
    pub fn is_changed(&self) -> bool {
        matches!(self, ResourceState::Changed)
    }

    /// Whether the resource equals its published version
    pub fn is_unchanged(&self) -> bool {
        matches!(self, ResourceState::Unchanged)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource (file or folder) of the content tree
///
/// Siblings are distinct resources (own structure id and path) sharing the
/// same content, recognised by an equal `resource_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Stable identifier of this resource
    pub structure_id: StructureId,

    /// Identifier of the content, shared between siblings
    pub resource_id: StructureId,

    /// Fully qualified path
    pub root_path: String,

    /// Name of the resource type
    pub type_name: String,

    /// Whether this is a folder
    pub folder: bool,

    /// Lifecycle state
    pub state: ResourceState,

    /// Number of resources sharing this content, including this one
    pub sibling_count: u32,

    /// Not visible before this time (seconds since Unix epoch)
    pub date_released: u64,

    /// Not visible after this time (seconds since Unix epoch)
    pub date_expired: u64,
}

impl Resource {
    /// Create a new, unpublished file
    pub fn file(root_path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            structure_id: StructureId::new(),
            resource_id: StructureId::new(),
            root_path: root_path.into(),
            type_name: type_name.into(),
            folder: false,
            state: ResourceState::New,
            sibling_count: 1,
            date_released: DATE_RELEASED_DEFAULT,
            date_expired: DATE_EXPIRED_DEFAULT,
        }
    }

    /// Create a new, unpublished folder
    ///
    /// The path is stored with a trailing slash.
    pub fn folder(root_path: impl Into<String>) -> Self {
        let mut root_path = root_path.into();
        if !root_path.ends_with('/') {
            root_path.push('/');
        }
        Self {
            folder: true,
            ..Self::file(root_path, FOLDER_TYPE)
        }
    }

    /// Create a sibling of this resource at another path
    pub fn sibling(&self, root_path: impl Into<String>) -> Self {
        Self {
            structure_id: StructureId::new(),
            root_path: root_path.into(),
            ..self.clone()
        }
    }

    /// Replace the lifecycle state
    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    /// Replace the release and expiration dates
    pub fn with_time_range(mut self, date_released: u64, date_expired: u64) -> Self {
        self.date_released = date_released;
        self.date_expired = date_expired;
        self
    }

    /// Whether this is a folder
    pub fn is_folder(&self) -> bool {
        self.folder
    }

    /// Whether this is a file
    pub fn is_file(&self) -> bool {
        !self.folder
    }

    /// Whether the resource is visible at `time`
    pub fn is_released_and_not_expired(&self, time: u64) -> bool {
        self.date_released <= time && time < self.date_expired
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.root_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Path of the parent folder, with trailing slash
    pub fn parent_path(&self) -> Option<&str> {
        let trimmed = self.root_path.trim_end_matches('/');
        trimmed.rfind('/').map(|index| &self.root_path[..=index])
    }
}

/// Handle to a resource: by structure id or by path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef<'a> {
    /// Look up by structure id
    Id(StructureId),

    /// Look up by path, relative to the current site
    Path(&'a str),
}

impl fmt::Display for ResourceRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Id(id) => write!(f, "{}", id),
            ResourceRef::Path(path) => f.write_str(path),
        }
    }
}

/// A resource type known to the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    /// Type name
    pub name: String,

    /// Whether content of this type is parsed for links
    pub link_parseable: bool,
}

impl ResourceType {
    /// Create a resource type
    pub fn new(name: impl Into<String>, link_parseable: bool) -> Self {
        Self {
            name: name.into(),
            link_parseable,
        }
    }
}

/// Criteria applied when reading resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    include_deleted: bool,
    ignore_expiration: bool,
    required_type: Option<String>,
    files_only: bool,
}

impl ResourceFilter {
    /// Released, unexpired, not deleted
    pub const DEFAULT: ResourceFilter = ResourceFilter {
        include_deleted: false,
        ignore_expiration: false,
        required_type: None,
        files_only: false,
    };

    /// Everything, including deleted and expired resources
    pub const ALL: ResourceFilter = ResourceFilter {
        include_deleted: true,
        ignore_expiration: true,
        required_type: None,
        files_only: false,
    };

    /// Not deleted, regardless of release and expiration
    pub const IGNORE_EXPIRATION: ResourceFilter = ResourceFilter {
        include_deleted: false,
        ignore_expiration: true,
        required_type: None,
        files_only: false,
    };

    /// Restrict to one resource type
    pub fn with_required_type(&self, type_name: impl Into<String>) -> Self {
        Self {
            required_type: Some(type_name.into()),
            ..self.clone()
        }
    }

    /// Restrict to files
    pub fn with_files_only(&self) -> Self {
        Self {
            files_only: true,
            ..self.clone()
        }
    }

    /// Whether deleted resources pass
    pub fn includes_deleted(&self) -> bool {
        self.include_deleted
    }

    /// Whether release and expiration are ignored
    pub fn ignores_expiration(&self) -> bool {
        self.ignore_expiration
    }

    /// Required type, if any
    pub fn required_type(&self) -> Option<&str> {
        self.required_type.as_deref()
    }

    /// Evaluate the filter against `resource` at `time`
    pub fn matches(&self, resource: &Resource, time: u64) -> bool {
        if !self.include_deleted && resource.state.is_deleted() {
            return false;
        }
        if !self.ignore_expiration && !resource.is_released_and_not_expired(time) {
            return false;
        }
        if self.files_only && resource.is_folder() {
            return false;
        }
        match &self.required_type {
            Some(type_name) => resource.type_name == *type_name,
            None => true,
        }
    }
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Resources proposed to move from the offline to the online tree in one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishList {
    resources: Vec<Resource>,
}

impl PublishList {
    /// Create a publish list
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Add a resource
    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// All resources, in the order they were added
    pub fn all_resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resources marked for deletion
    pub fn deleted_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.state.is_deleted())
    }

    /// Whether a resource with this root path is part of the list
    pub fn contains_path(&self, root_path: &str) -> bool {
        self.resources.iter().any(|r| r.root_path == root_path)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<Resource> for PublishList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
