//! Expansion of resource names into the full set of affected resources

use linkguard_domain::{RelationStore, RequestContext, Resource, ResourceFilter, ResourceRef};
use std::collections::HashSet;
use std::fmt::Display;

/// Resources selected by a list of names, folders expanded
#[derive(Debug, Default)]
pub(crate) struct Expansion {
    /// Selected resources with their result keys, in selection order
    pub resources: Vec<(String, Resource)>,

    /// Root paths of every selected resource
    pub paths: HashSet<String>,
}

impl Expansion {
    fn insert(&mut self, key: String, resource: Resource) {
        if self.paths.insert(resource.root_path.clone()) {
            self.resources.push((key, resource));
        }
    }
}

/// Resolve `root_paths` and add every descendant of the folders among them
///
/// `ctx` must read in the root site. Read failures are logged and the name
/// is left out.
pub(crate) fn expand<S>(store: &S, ctx: &RequestContext, root_paths: &[String]) -> Expansion
where
    S: RelationStore,
    S::Error: Display,
{
    let mut expansion = Expansion::default();
    for root_path in root_paths {
        let found = store.read_resource(ctx, ResourceRef::Path(root_path), &ResourceFilter::ALL);
        let resource = match found {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                tracing::warn!("Resource {} not found, left out of validation", root_path);
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", root_path, e);
                continue;
            }
        };

        if resource.is_folder() {
            let filter = &ResourceFilter::IGNORE_EXPIRATION;
            match store.read_resources(ctx, &resource.root_path, filter, true) {
                Ok(children) => {
                    for child in children {
                        expansion.insert(child.root_path.clone(), child);
                    }
                }
                Err(e) => tracing::error!(
                    "Failed to read the contents of {}: {}",
                    resource.root_path,
                    e
                ),
            }
        }
        expansion.insert(resource.root_path.clone(), resource);
    }
    expansion
}

/// Add the siblings of every multiply-linked file in the expansion
///
/// Each sibling not yet selected is keyed by its origin, the sibling marker
/// and its own root path.
pub(crate) fn add_siblings<S>(store: &S, ctx: &RequestContext, expansion: &mut Expansion)
where
    S: RelationStore,
    S::Error: Display,
{
    let origins: Vec<Resource> = expansion
        .resources
        .iter()
        .map(|(_, resource)| resource)
        .filter(|resource| resource.is_file() && resource.sibling_count > 1)
        .cloned()
        .collect();

    for origin in origins {
        let siblings = match store.read_siblings(ctx, &origin.root_path, &ResourceFilter::ALL) {
            Ok(siblings) => siblings,
            Err(e) => {
                tracing::error!("Failed to read the siblings of {}: {}", origin.root_path, e);
                continue;
            }
        };
        for sibling in siblings {
            if !expansion.paths.contains(&sibling.root_path) {
                let key =
                    format!("{}{}{}", origin.root_path, crate::SIBLING_MARKER, sibling.root_path);
                expansion.insert(key, sibling);
            }
        }
    }
}
