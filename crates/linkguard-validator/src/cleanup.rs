//! Removal of manually maintained relations before a deletion

use crate::expand::expand;
use linkguard_domain::{RelationFilter, RelationStore, RelationTypeRegistry, RequestContext};
use std::fmt::Display;

/// Remove the relations of `names` that are not defined in content
///
/// Relations extracted from content disappear with their source. The others
/// (categories and user-defined types) would dangle once the resources are
/// deleted, in either direction. Folders are expanded recursively. Failures
/// on single resources are logged and skipped.
///
/// Returns the number of relations removed.
pub fn remove_dangling_user_relations<S>(
    store: &mut S,
    ctx: &mut RequestContext,
    registry: &RelationTypeRegistry,
    names: &[String],
) -> usize
where
    S: RelationStore,
    S::Error: Display,
{
    let root_paths: Vec<String> = names.iter().map(|name| ctx.add_site_root(name)).collect();
    let root_ctx = ctx.switch_site_root(RequestContext::ROOT_SITE);
    let expansion = expand(&*store, &root_ctx, &root_paths);

    let filters = [
        RelationFilter::SOURCES.filter_not_defined_in_content(registry),
        RelationFilter::TARGETS.filter_not_defined_in_content(registry),
    ];
    let mut removed = 0;
    for (_, resource) in &expansion.resources {
        for filter in &filters {
            match store.delete_relations(&root_ctx, resource, filter) {
                Ok(count) => removed += count,
                Err(e) => tracing::error!(
                    "Failed to remove relations {} of {}: {}",
                    filter,
                    resource.root_path,
                    e
                ),
            }
        }
    }
    tracing::info!(
        "Removed {} relations not defined in content from {} resources",
        removed,
        expansion.resources.len()
    );
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;
    use linkguard_domain::{Project, Relation, RelationType, Resource};

    #[test]
    fn test_only_relations_outside_content_are_removed() {
        let mut store = MockStore::new();
        let tagged = store.registry.add_user_defined("TAGGED", false).unwrap();
        let doomed = Resource::file("/sites/a/d.html", "xmlpage");
        let other = Resource::file("/sites/a/o.html", "xmlpage");
        let category = Resource::folder("/system/categories/news");
        store.add(Project::Offline, &doomed);
        store.add(Project::Offline, &other);
        store.relate(Project::Offline, Relation::between(&other, &doomed, tagged.clone()));
        store.relate(Project::Offline, Relation::between(&doomed, &other, tagged));
        store.relate(
            Project::Offline,
            Relation::between(&doomed, &category, RelationType::CATEGORY),
        );
        store.relate(Project::Offline, Relation::between(&other, &doomed, RelationType::HYPERLINK));

        let registry = store.registry.clone();
        let mut ctx = RequestContext::new("admin", Project::Offline, "/sites/a");
        let doomed_paths = ["/d.html".to_string()];
        let removed =
            remove_dangling_user_relations(&mut store, &mut ctx, &registry, &doomed_paths);
        assert_eq!(removed, 3);
        assert_eq!(ctx.site_root(), "/sites/a");

        let remaining = store.find_relations(&ctx, &doomed, &RelationFilter::ALL).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(*remaining[0].relation_type(), RelationType::HYPERLINK);
    }

    #[test]
    fn test_failures_are_skipped() {
        let mut store = MockStore::new();
        let doomed = Resource::file("/d.html", "xmlpage");
        store.add(Project::Offline, &doomed);
        store.fail_relations_for("/d.html");

        let registry = RelationTypeRegistry::new();
        let mut ctx = RequestContext::new("admin", Project::Offline, "");
        assert_eq!(
            remove_dangling_user_relations(
                &mut store,
                &mut ctx,
                &registry,
                &["/d.html".to_string()]
            ),
            0
        );
    }
}
