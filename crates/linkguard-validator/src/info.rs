//! Query surface shared by the delete and publish validators

use crate::BrokenRelations;
use linkguard_domain::{Relation, SiteRegistry};

/// Separator of composite keys for resources that joined a delete set as siblings
///
/// A composite key reads `<origin root path><SIBLING_MARKER><sibling root path>`.
pub const SIBLING_MARKER: &str = "@sibling:";

/// Details of one entry of a validation result, for presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    /// Key of the entry in the result
    pub entry_name: String,

    /// Path of the resource, relative to its site
    pub resource_name: String,

    /// Title of the site containing the resource, empty outside every site
    pub site_name: String,

    /// Root of the site containing the resource, empty outside every site
    pub site_root: String,

    /// The broken relations of the entry
    pub relations: Vec<Relation>,
}

impl InfoEntry {
    /// Build an entry for `key`, locating its resource among `sites`
    ///
    /// For a composite sibling key the sibling is the resource described.
    pub fn new(key: &str, relations: Vec<Relation>, sites: &SiteRegistry) -> Self {
        let root_path = key
            .split_once(SIBLING_MARKER)
            .map_or(key, |(_, sibling)| sibling);
        let (site_name, site_root, resource_name) = match sites.site_for_root_path(root_path) {
            Some(site) => {
                let relative = &root_path[site.root.len()..];
                let relative = if relative.is_empty() { "/" } else { relative };
                (site.title.clone(), site.root.clone(), relative.to_string())
            }
            None => (String::new(), String::new(), root_path.to_string()),
        };
        Self {
            entry_name: key.to_string(),
            resource_name,
            site_name,
            site_root,
            relations,
        }
    }

    /// Whether the entry stands for a sibling of a resource in the delete set
    pub fn is_sibling(&self) -> bool {
        self.entry_name.contains(SIBLING_MARKER)
    }
}

/// Common query surface over the broken relations a validator found
pub trait RelationValidator {
    /// The broken relations, keyed by resource
    fn broken_relations(&self) -> &BrokenRelations;

    /// Whether nothing would break
    fn is_empty(&self) -> bool {
        self.broken_relations().is_empty()
    }

    /// Keys of the resources with broken relations, sorted
    fn key_set(&self) -> Vec<&str> {
        self.broken_relations().keys().map(String::as_str).collect()
    }

    /// Broken relations per resource, in key order
    fn values(&self) -> Vec<&[Relation]> {
        self.broken_relations().values().map(Vec::as_slice).collect()
    }

    /// Details of the entry with `key`, if it has broken relations
    fn info_entry(&self, key: &str, sites: &SiteRegistry) -> Option<InfoEntry> {
        self.broken_relations()
            .get(key)
            .map(|relations| InfoEntry::new(key, relations.clone(), sites))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> SiteRegistry {
        let mut sites = SiteRegistry::new();
        sites.add("/sites/shop", "Shop");
        sites
    }

    #[test]
    fn test_entry_inside_site() {
        let entry = InfoEntry::new("/sites/shop/cart.html", Vec::new(), &sites());
        assert_eq!(entry.resource_name, "/cart.html");
        assert_eq!(entry.site_name, "Shop");
        assert_eq!(entry.site_root, "/sites/shop");
        assert!(!entry.is_sibling());
    }

    #[test]
    fn test_entry_outside_sites() {
        let entry = InfoEntry::new("/shared/logo.png", Vec::new(), &sites());
        assert_eq!(entry.resource_name, "/shared/logo.png");
        assert_eq!(entry.site_name, "");
        assert_eq!(entry.site_root, "");
    }

    #[test]
    fn test_entry_for_sibling_key() {
        let key = format!("/shared/doc.pdf{}/sites/shop/doc.pdf", SIBLING_MARKER);
        let entry = InfoEntry::new(&key, Vec::new(), &sites());
        assert!(entry.is_sibling());
        assert_eq!(entry.entry_name, key);
        assert_eq!(entry.resource_name, "/doc.pdf");
        assert_eq!(entry.site_name, "Shop");
    }
}
