//! Relation types and the registry that resolves them
//!
//! System types are fixed and occupy ids `1..=N`. User-defined types are
//! registered from configuration during startup and are numbered from
//! [`USER_TYPE_ID_OFFSET`] so they can never collide with a system id.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Offset added to the index of user-defined relation types to form their id
pub const USER_TYPE_ID_OFFSET: u32 = 100;

const PREFIX_XML: &str = "XML_";
const PREFIX_JSP: &str = "JSP_";
const VALUE_STRONG: &str = "STRONG";
const VALUE_WEAK: &str = "WEAK";

/// Deprecated names still accepted on lookup, mapped to system type ids
const LEGACY_ALIASES: [(&str, u32); 2] = [("REFERENCE", 4), ("ATTACHMENT", 3)];

/// Errors raised by the relation type registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A user-defined type was registered after initialization finished
    #[error("Relation type registry is frozen, cannot register '{0}' after initialization")]
    Frozen(String),

    /// A user-defined type reuses the name of an existing type
    #[error("Relation type '{0}' is already defined")]
    Duplicate(String),

    /// Strength keyword was neither `strong` nor `weak`
    #[error("Invalid relation strength '{0}', expected 'strong' or 'weak'")]
    InvalidStrength(String),

    /// No type with this name
    #[error("Unknown relation type: {0}")]
    UnknownName(String),

    /// No type with this id
    #[error("Unknown relation type id: {0}")]
    UnknownId(u32),
}

/// What happens to a relation when its source resource is copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyBehavior {
    /// The relation is copied along with the resource
    Copy,

    /// The relation is dropped from the copy
    Ignore,
}

/// Kind of a relation edge
///
/// Two types are equal when their ids are equal; ids are unique across
/// system and user-defined types.
#[derive(Debug, Clone)]
pub struct RelationType {
    id: u32,
    name: Cow<'static, str>,
    strong: bool,
    defined_in_content: bool,
    copy_behavior: CopyBehavior,
}

impl RelationType {
    /// Strong link from a JSP macro
    pub const JSP_STRONG: RelationType =
        Self::system(1, "JSP_STRONG", true, true, CopyBehavior::Copy);
    /// Weak link from a JSP macro
    pub const JSP_WEAK: RelationType = Self::system(2, "JSP_WEAK", false, true, CopyBehavior::Copy);
    /// Strong reference from structured XML content
    pub const XML_STRONG: RelationType =
        Self::system(3, "XML_STRONG", true, true, CopyBehavior::Copy);
    /// Weak reference from structured XML content
    pub const XML_WEAK: RelationType = Self::system(4, "XML_WEAK", false, true, CopyBehavior::Copy);
    /// Embedded image
    pub const EMBEDDED_IMAGE: RelationType = Self::system(5, "IMG", true, true, CopyBehavior::Copy);
    /// Plain hyperlink
    pub const HYPERLINK: RelationType = Self::system(6, "A", false, true, CopyBehavior::Copy);
    /// Embedded object
    pub const EMBEDDED_OBJECT: RelationType =
        Self::system(7, "OBJECT", true, true, CopyBehavior::Copy);
    /// Category membership
    pub const CATEGORY: RelationType =
        Self::system(8, "CATEGORY", false, false, CopyBehavior::Copy);
    /// Reference to an XML schema definition
    pub const XSD: RelationType = Self::system(9, "XSD", true, true, CopyBehavior::Copy);
    /// Link between locale variants of the same content
    pub const LOCALE_VARIANT: RelationType =
        Self::system(10, "LOCALE_VARIANT", false, false, CopyBehavior::Ignore);
    /// Content pulled into the search index of another resource
    pub const INDEX_CONTENT: RelationType =
        Self::system(11, "INDEX_CONTENT", false, true, CopyBehavior::Copy);

    const fn system(
        id: u32,
        name: &'static str,
        strong: bool,
        defined_in_content: bool,
        copy_behavior: CopyBehavior,
    ) -> Self {
        Self {
            id,
            name: Cow::Borrowed(name),
            strong,
            defined_in_content,
            copy_behavior,
        }
    }

    fn user_defined(id: u32, name: String, strong: bool) -> Self {
        Self {
            id,
            name: Cow::Owned(name),
            strong,
            defined_in_content: false,
            copy_behavior: CopyBehavior::Copy,
        }
    }

    /// Numeric id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Full type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used when serializing into XML content
    ///
    /// The XML and JSP strong/weak types collapse to bare `STRONG`/`WEAK`;
    /// every other type serializes as its full name.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::RelationType;
    ///
    /// assert_eq!(RelationType::JSP_WEAK.name_for_xml(), "WEAK");
    /// assert_eq!(RelationType::HYPERLINK.name_for_xml(), "A");
    /// ```
    pub fn name_for_xml(&self) -> &str {
        match self.id {
            1 | 3 => VALUE_STRONG,
            2 | 4 => VALUE_WEAK,
            _ => self.name(),
        }
    }

    /// Whether the target is required by the source
    pub fn is_strong(&self) -> bool {
        self.strong
    }

    /// Whether the target is merely referenced by the source
    pub fn is_weak(&self) -> bool {
        !self.strong
    }

    /// Whether relations of this type are derived from the resource content
    ///
    /// Such relations are maintained by content parsing and can not be
    /// added or removed by hand.
    pub fn is_defined_in_content(&self) -> bool {
        self.defined_in_content
    }

    /// Copy behavior
    pub fn copy_behavior(&self) -> CopyBehavior {
        self.copy_behavior
    }

    /// Whether this is a system type
    pub fn is_internal(&self) -> bool {
        self.id < USER_TYPE_ID_OFFSET
    }

    /// Whether this type was registered from configuration
    pub fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    /// Subset of `types` that are strong
    pub fn filter_strong<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
    ) -> Vec<RelationType> {
        Self::partition(types, RelationType::is_strong)
    }

    /// Subset of `types` that are weak
    pub fn filter_weak<'a>(types: impl IntoIterator<Item = &'a RelationType>) -> Vec<RelationType> {
        Self::partition(types, RelationType::is_weak)
    }

    /// Subset of `types` that are system types
    pub fn filter_internal<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
    ) -> Vec<RelationType> {
        Self::partition(types, RelationType::is_internal)
    }

    /// Subset of `types` that are user-defined
    pub fn filter_user_defined<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
    ) -> Vec<RelationType> {
        Self::partition(types, RelationType::is_user_defined)
    }

    /// Subset of `types` that are defined in content
    pub fn filter_defined_in_content<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
    ) -> Vec<RelationType> {
        Self::partition(types, RelationType::is_defined_in_content)
    }

    /// Subset of `types` that are not defined in content
    pub fn filter_not_defined_in_content<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
    ) -> Vec<RelationType> {
        Self::partition(types, |t| !t.is_defined_in_content())
    }

    fn partition<'a>(
        types: impl IntoIterator<Item = &'a RelationType>,
        predicate: impl Fn(&RelationType) -> bool,
    ) -> Vec<RelationType> {
        types.into_iter().filter(|t| predicate(*t)).cloned().collect()
    }
}

impl PartialEq for RelationType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RelationType {}

impl Hash for RelationType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for RelationType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelationType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// All system types, ordered by id
static SYSTEM_TYPES: [RelationType; 11] = [
    RelationType::JSP_STRONG,
    RelationType::JSP_WEAK,
    RelationType::XML_STRONG,
    RelationType::XML_WEAK,
    RelationType::EMBEDDED_IMAGE,
    RelationType::HYPERLINK,
    RelationType::EMBEDDED_OBJECT,
    RelationType::CATEGORY,
    RelationType::XSD,
    RelationType::LOCALE_VARIANT,
    RelationType::INDEX_CONTENT,
];

/// Registry of all known relation types
///
/// Constructed once during startup, populated with the user-defined types
/// from configuration and then frozen. After [`freeze`](Self::freeze) any
/// registration attempt is a configuration error.
///
/// # Examples
///
/// ```
/// use linkguard_domain::{RelationType, RelationTypeRegistry};
///
/// let mut registry = RelationTypeRegistry::new();
/// let requires = registry.add_user_defined("REQUIRES", true).unwrap();
/// registry.freeze();
///
/// assert_eq!(registry.value_of_id(3).unwrap(), RelationType::XML_STRONG);
/// assert_eq!(registry.value_of("requires").unwrap(), requires);
/// assert!(registry.add_user_defined("LATE", false).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelationTypeRegistry {
    user_defined: Vec<RelationType>,
    frozen: bool,
}

impl RelationTypeRegistry {
    /// Create a registry holding only the system types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user-defined relation type
    ///
    /// # Errors
    ///
    /// [`RegistryError::Frozen`] once the registry is frozen,
    /// [`RegistryError::Duplicate`] if the name resolves to an existing type.
    pub fn add_user_defined(
        &mut self,
        name: &str,
        strong: bool,
    ) -> Result<RelationType, RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen(name.to_string()));
        }
        if self.find(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        let id = USER_TYPE_ID_OFFSET + self.user_defined.len() as u32;
        let relation_type = RelationType::user_defined(id, name.to_string(), strong);
        tracing::debug!("Registered relation type {} (id {})", name, id);
        self.user_defined.push(relation_type.clone());
        Ok(relation_type)
    }

    /// Register a user-defined type with a `strong`/`weak` keyword
    pub fn add_user_defined_with_strength(
        &mut self,
        name: &str,
        strength: &str,
    ) -> Result<RelationType, RegistryError> {
        let strong = if strength.eq_ignore_ascii_case(VALUE_STRONG) {
            true
        } else if strength.eq_ignore_ascii_case(VALUE_WEAK) {
            false
        } else {
            return Err(RegistryError::InvalidStrength(strength.to_string()));
        };
        self.add_user_defined(name, strong)
    }

    /// Mark initialization as finished
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether registration is closed
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Look up a type by id
    pub fn value_of_id(&self, id: u32) -> Result<RelationType, RegistryError> {
        if id >= 1 && (id as usize) <= SYSTEM_TYPES.len() {
            return Ok(SYSTEM_TYPES[id as usize - 1].clone());
        }
        id.checked_sub(USER_TYPE_ID_OFFSET)
            .and_then(|index| self.user_defined.get(index as usize))
            .cloned()
            .ok_or(RegistryError::UnknownId(id))
    }

    /// Look up a type by name, case-insensitively
    ///
    /// Exact system names win over the legacy aliases, which win over
    /// user-defined names.
    pub fn value_of(&self, name: &str) -> Result<RelationType, RegistryError> {
        self.find(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))
    }

    /// Look up a type by the name used in XML content
    ///
    /// Bare `STRONG`/`WEAK` expand to the `XML_` types when nothing matches
    /// the name as given.
    pub fn value_of_xml(&self, name: &str) -> Result<RelationType, RegistryError> {
        self.value_of_prefixed(name, PREFIX_XML)
    }

    /// Look up a type by the name used in JSP macros
    ///
    /// Bare `STRONG`/`WEAK` expand to the `JSP_` types when nothing matches
    /// the name as given.
    pub fn value_of_jsp(&self, name: &str) -> Result<RelationType, RegistryError> {
        self.value_of_prefixed(name, PREFIX_JSP)
    }

    fn value_of_prefixed(&self, name: &str, prefix: &str) -> Result<RelationType, RegistryError> {
        self.find(name)
            .or_else(|| self.find(&format!("{}{}", prefix, name)))
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))
    }

    fn find(&self, name: &str) -> Option<RelationType> {
        SYSTEM_TYPES
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .or_else(|| {
                LEGACY_ALIASES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .map(|(_, id)| &SYSTEM_TYPES[*id as usize - 1])
            })
            .or_else(|| {
                self.user_defined
                    .iter()
                    .find(|t| t.name().eq_ignore_ascii_case(name))
            })
            .cloned()
    }

    /// System types, ordered by id
    pub fn system_types(&self) -> &'static [RelationType] {
        &SYSTEM_TYPES
    }

    /// User-defined types, in registration order
    pub fn user_defined(&self) -> &[RelationType] {
        &self.user_defined
    }

    /// Every known type, system types first
    pub fn all(&self) -> Vec<RelationType> {
        SYSTEM_TYPES.iter().chain(&self.user_defined).cloned().collect()
    }

    /// Every strong type
    pub fn all_strong(&self) -> Vec<RelationType> {
        RelationType::filter_strong(&self.all())
    }

    /// Every weak type
    pub fn all_weak(&self) -> Vec<RelationType> {
        RelationType::filter_weak(&self.all())
    }

    /// Every system type
    pub fn all_internal(&self) -> Vec<RelationType> {
        SYSTEM_TYPES.to_vec()
    }

    /// Every user-defined type
    pub fn all_user_defined(&self) -> Vec<RelationType> {
        self.user_defined.clone()
    }

    /// Every type defined in content
    pub fn all_defined_in_content(&self) -> Vec<RelationType> {
        RelationType::filter_defined_in_content(&self.all())
    }

    /// Every type not defined in content
    pub fn all_not_defined_in_content(&self) -> Vec<RelationType> {
        RelationType::filter_not_defined_in_content(&self.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[(&str, bool)]) -> RelationTypeRegistry {
        let mut registry = RelationTypeRegistry::new();
        for (name, strong) in names {
            registry.add_user_defined(name, *strong).unwrap();
        }
        registry.freeze();
        registry
    }

    #[test]
    fn test_value_of_id() {
        let registry = RelationTypeRegistry::new();
        assert_eq!(registry.value_of_id(3).unwrap(), RelationType::XML_STRONG);
        assert_eq!(registry.value_of_id(1).unwrap(), RelationType::JSP_STRONG);
        assert_eq!(registry.value_of_id(11).unwrap(), RelationType::INDEX_CONTENT);
        assert_eq!(registry.value_of_id(0), Err(RegistryError::UnknownId(0)));
        assert_eq!(registry.value_of_id(12), Err(RegistryError::UnknownId(12)));
        assert_eq!(registry.value_of_id(100), Err(RegistryError::UnknownId(100)));
    }

    #[test]
    fn test_user_defined_ids_are_offset() {
        let registry = registry_with(&[("REQUIRES", true), ("MENTIONS", false)]);
        let requires = registry.value_of_id(100).unwrap();
        let mentions = registry.value_of_id(101).unwrap();
        assert_eq!(requires.name(), "REQUIRES");
        assert!(requires.is_strong());
        assert!(requires.is_user_defined());
        assert!(!requires.is_defined_in_content());
        assert_eq!(mentions.name(), "MENTIONS");
        assert!(mentions.is_weak());
    }

    #[test]
    fn test_value_of_name_is_case_insensitive() {
        let registry = RelationTypeRegistry::new();
        assert_eq!(registry.value_of("xml_strong").unwrap(), RelationType::XML_STRONG);
        assert_eq!(registry.value_of("img").unwrap(), RelationType::EMBEDDED_IMAGE);
        assert!(matches!(
            registry.value_of("NOPE"),
            Err(RegistryError::UnknownName(_))
        ));
    }

    #[test]
    fn test_legacy_aliases() {
        let registry = RelationTypeRegistry::new();
        assert_eq!(registry.value_of("REFERENCE").unwrap(), RelationType::XML_WEAK);
        assert_eq!(registry.value_of("attachment").unwrap(), RelationType::XML_STRONG);
    }

    #[test]
    fn test_alias_beats_user_defined() {
        // The alias is consulted before the user list, so a user type can
        // never shadow it; registration of the name is rejected outright.
        let mut registry = RelationTypeRegistry::new();
        assert_eq!(
            registry.add_user_defined("reference", false),
            Err(RegistryError::Duplicate("reference".to_string()))
        );
    }

    #[test]
    fn test_value_of_xml_and_jsp() {
        let registry = RelationTypeRegistry::new();
        assert_eq!(registry.value_of_xml("WEAK").unwrap(), RelationType::XML_WEAK);
        assert_eq!(registry.value_of_xml("strong").unwrap(), RelationType::XML_STRONG);
        assert_eq!(registry.value_of_jsp("WEAK").unwrap(), RelationType::JSP_WEAK);
        assert_eq!(registry.value_of_jsp("STRONG").unwrap(), RelationType::JSP_STRONG);
        // Exact names take precedence over prefix expansion
        assert_eq!(registry.value_of_xml("A").unwrap(), RelationType::HYPERLINK);
        assert!(registry.value_of_xml("MISSING").is_err());
    }

    #[test]
    fn test_name_for_xml() {
        assert_eq!(RelationType::XML_STRONG.name_for_xml(), "STRONG");
        assert_eq!(RelationType::JSP_STRONG.name_for_xml(), "STRONG");
        assert_eq!(RelationType::XML_WEAK.name_for_xml(), "WEAK");
        assert_eq!(RelationType::JSP_WEAK.name_for_xml(), "WEAK");

        let registry = registry_with(&[("REQUIRES", true)]);
        for t in registry.all() {
            if ![1, 2, 3, 4].contains(&t.id()) {
                assert_eq!(t.name_for_xml(), t.name());
            }
        }
    }

    #[test]
    fn test_frozen_registry_rejects_registration() {
        let mut registry = RelationTypeRegistry::new();
        registry.freeze();
        assert!(registry.is_frozen());
        assert_eq!(
            registry.add_user_defined("LATE", true),
            Err(RegistryError::Frozen("LATE".to_string()))
        );
    }

    #[test]
    fn test_strength_keyword() {
        let mut registry = RelationTypeRegistry::new();
        assert!(registry.add_user_defined_with_strength("A1", "Strong").unwrap().is_strong());
        assert!(registry.add_user_defined_with_strength("A2", "weak").unwrap().is_weak());
        assert_eq!(
            registry.add_user_defined_with_strength("A3", "medium"),
            Err(RegistryError::InvalidStrength("medium".to_string()))
        );
    }

    #[test]
    fn test_partitioners() {
        let registry = registry_with(&[("REQUIRES", true), ("MENTIONS", false)]);
        let all = registry.all();
        assert_eq!(all.len(), 13);

        let strong = RelationType::filter_strong(&all);
        assert!(strong.iter().all(RelationType::is_strong));
        assert!(strong.contains(&RelationType::EMBEDDED_IMAGE));

        let weak = RelationType::filter_weak(&all);
        assert_eq!(strong.len() + weak.len(), all.len());

        assert_eq!(RelationType::filter_internal(&all).len(), 11);
        assert_eq!(RelationType::filter_user_defined(&all).len(), 2);

        let in_content = RelationType::filter_defined_in_content(&all);
        assert!(!in_content.contains(&RelationType::CATEGORY));
        assert!(!in_content.contains(&RelationType::LOCALE_VARIANT));
        let not_in_content = registry.all_not_defined_in_content();
        assert_eq!(in_content.len() + not_in_content.len(), all.len());
    }

    #[test]
    fn test_copy_behavior() {
        assert_eq!(RelationType::LOCALE_VARIANT.copy_behavior(), CopyBehavior::Ignore);
        assert_eq!(RelationType::HYPERLINK.copy_behavior(), CopyBehavior::Copy);
    }
}
