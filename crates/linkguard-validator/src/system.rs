//! Validation of publish operations and of the whole resource tree
//!
//! The system validator compares two snapshots. Resources about to be
//! published are checked against the online project: their outgoing links
//! must resolve there, or point at something published in the same batch.
//! Resources about to be deleted online are checked the other way round:
//! everything still linking to them online must go away in the same batch.
//!
//! Without a publish list the validator scans every link-parseable resource
//! of the context's project and checks its links against that same project.

use crate::progress::{band, checkpoint};
use crate::{
    ProgressMonitor, ResourceOutcome, ValidationReport, ValidationRun, ValidatorConfig,
    ValidatorError,
};
use linkguard_domain::{
    Project, PublishList, Relation, RelationFilter, RelationStore, RequestContext, Resource,
    ResourceFilter, StructureId,
};
use std::collections::HashMap;
use std::fmt::Display;

/// Progress at the end of resource collection
const COLLECTED: u8 = 10;

/// Progress at the end of lookup table construction
const INDEXED: u8 = 20;

/// Progress at the end of the run
const DONE: u8 = 100;

/// Validator for publish lists and whole-tree consistency checks
///
/// # Examples
///
/// ```no_run
/// use linkguard_domain::{Project, PublishList, RelationTypeRegistry, RequestContext};
/// use linkguard_store::SqliteStore;
/// use linkguard_validator::{SystemValidator, TextReport};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new("linkguard.db", Arc::new(RelationTypeRegistry::new()))?;
/// let mut ctx = RequestContext::new("admin", Project::Offline, "");
/// let mut report = TextReport::new();
///
/// let run = SystemValidator::default_config()
///     .validate_resources(&store, &mut ctx, None, Some(&mut report), None)?;
/// println!("{}", run.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SystemValidator {
    config: ValidatorConfig,
}

impl SystemValidator {
    /// Create a validator with the given configuration
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Create a validator with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidatorConfig::default())
    }

    /// Validate the links of a publish list, or of the whole tree
    ///
    /// # Arguments
    ///
    /// * `publish_list` - resources about to be published; `None` validates
    ///   every link-parseable resource of the context's project
    /// * `report` - optional side channel receiving progress lines
    /// * `monitor` - optional progress receiver, polled for cancellation
    ///
    /// # Errors
    ///
    /// [`ValidatorError::Interrupted`] when cancelled, [`ValidatorError::Store`]
    /// when the resource types can not be read. Failures on single
    /// resources are recorded as skipped outcomes instead.
    pub fn validate_resources<S>(
        &self,
        store: &S,
        ctx: &mut RequestContext,
        publish_list: Option<&PublishList>,
        mut report: Option<&mut dyn ValidationReport>,
        monitor: Option<&dyn ProgressMonitor>,
    ) -> Result<ValidationRun, ValidatorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let target_project = if publish_list.is_some() {
            Project::Online
        } else {
            ctx.project()
        };
        let mut ctx = ctx.switch_site_root(RequestContext::ROOT_SITE);

        checkpoint(monitor, 0)?;
        let resources = match publish_list {
            Some(list) => list.all_resources().to_vec(),
            None => collect_link_parseable(store, &ctx, monitor)?,
        };
        checkpoint(monitor, COLLECTED)?;

        let lookup: HashMap<&str, &Resource> =
            resources.iter().map(|r| (r.root_path.as_str(), r)).collect();
        checkpoint(monitor, INDEXED)?;

        tracing::info!(
            "Validating links of {} resources against the {} project",
            resources.len(),
            target_project
        );
        if let Some(report) = report.as_deref_mut() {
            report.start(resources.len(), target_project);
        }

        let total = resources.len();
        let mut run = ValidationRun::new();
        for (index, resource) in resources.iter().enumerate() {
            checkpoint(monitor, band(INDEXED, DONE, index, total))?;
            if let Some(report) = report.as_deref_mut() {
                report.resource(index + 1, total, &resource.root_path);
            }

            let checked = if resource.state.is_deleted() {
                let mut online = ctx.switch_project(target_project);
                self.check_incoming(store, &mut online, resource, &lookup)
            } else {
                self.check_outgoing(store, &mut ctx, resource, &lookup, target_project)
            };

            let outcome = match checked {
                Ok(broken) => {
                    if let Some(report) = report.as_deref_mut() {
                        self.report_broken(report, resource, &broken);
                    }
                    ResourceOutcome::Checked(broken)
                }
                Err(reason) => {
                    tracing::error!("Failed to validate {}: {}", resource.root_path, reason);
                    if let Some(report) = report.as_deref_mut() {
                        report.resource_skipped(&reason);
                    }
                    ResourceOutcome::Skipped(reason)
                }
            };
            run.record(resource.root_path.clone(), outcome);
        }
        checkpoint(monitor, DONE)?;

        let broken_resources = run.broken_relations().len();
        if let Some(report) = report.as_deref_mut() {
            report.finish(run.checked_count(), broken_resources, run.broken_link_count());
        }
        tracing::info!(
            "Link validation finished: {} broken links in {} resources",
            run.broken_link_count(),
            broken_resources
        );
        Ok(run)
    }

    /// Outgoing links of a resource that is not being deleted
    ///
    /// A link is valid if its target resolves in the target project and is
    /// not deleted by the same publish operation, or if the target does not
    /// resolve but is published by the same operation.
    fn check_outgoing<S>(
        &self,
        store: &S,
        ctx: &mut RequestContext,
        resource: &Resource,
        lookup: &HashMap<&str, &Resource>,
        target_project: Project,
    ) -> Result<Vec<Relation>, String>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let relations = store
            .find_relations(ctx, resource, &RelationFilter::TARGETS)
            .map_err(|e| e.to_string())?;

        // Keyed by id and path, since links stored without a path share ""
        let mut cache: HashMap<(StructureId, String), bool> = HashMap::new();
        let mut broken = Vec::new();
        for relation in relations {
            let target_path = relation.target_path();
            let cache_key = (relation.target_id(), target_path.to_string());
            let valid = match cache.get(&cache_key) {
                Some(valid) => *valid,
                None => {
                    let mut target_ctx = ctx.switch_project(target_project);
                    let found = relation.target(store, &mut target_ctx, &ResourceFilter::ALL);
                    let valid = match found {
                        Ok(Some(target)) => {
                            let resolved_path = target.root_path.as_str();
                            !lookup.get(resolved_path).is_some_and(|r| r.state.is_deleted())
                        }
                        Ok(None) => lookup.get(target_path).is_some_and(|r| !r.state.is_deleted()),
                        Err(e) => {
                            tracing::debug!("Failed to resolve link target {}: {}", target_path, e);
                            lookup.get(target_path).is_some_and(|r| !r.state.is_deleted())
                        }
                    };
                    cache.insert(cache_key, valid);
                    valid
                }
            };
            if !valid {
                broken.push(relation);
            }
        }
        Ok(broken)
    }

    /// Incoming links of a resource that is being deleted
    ///
    /// `ctx` reads from the target project. A link is valid only if its
    /// source goes away in the same operation.
    fn check_incoming<S>(
        &self,
        store: &S,
        ctx: &mut RequestContext,
        resource: &Resource,
        lookup: &HashMap<&str, &Resource>,
    ) -> Result<Vec<Relation>, String>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let relations = store
            .find_relations(ctx, resource, &RelationFilter::SOURCES)
            .map_err(|e| e.to_string())?;

        let mut cache: HashMap<String, bool> = HashMap::new();
        let mut broken = Vec::new();
        for relation in relations {
            let source_path = relation.source_path();
            let valid = *cache
                .entry(source_path.to_string())
                .or_insert_with(|| lookup.contains_key(source_path));
            if !valid {
                broken.push(relation);
            }
        }
        Ok(broken)
    }

    fn report_broken(
        &self,
        report: &mut dyn ValidationReport,
        resource: &Resource,
        broken: &[Relation],
    ) {
        if broken.is_empty() {
            report.resource_ok();
            return;
        }
        report.broken_links_found(&resource.root_path);
        if self.config.report_broken_links {
            let incoming = resource.state.is_deleted();
            for relation in broken.iter().take(self.config.max_listed_links) {
                report.broken_link(relation, incoming);
            }
        }
    }
}

/// Every resource of a link-parseable type in the context's project
///
/// Progress runs from 0 to [`COLLECTED`]. Failures reading one type are
/// logged and that type is skipped.
fn collect_link_parseable<S>(
    store: &S,
    ctx: &RequestContext,
    monitor: Option<&dyn ProgressMonitor>,
) -> Result<Vec<Resource>, ValidatorError>
where
    S: RelationStore,
    S::Error: Display,
{
    let types = store
        .resource_types()
        .map_err(|e| ValidatorError::Store(e.to_string()))?;
    let parseable: Vec<_> = types.into_iter().filter(|t| t.link_parseable).collect();

    let mut resources = Vec::new();
    for (index, resource_type) in parseable.iter().enumerate() {
        checkpoint(monitor, band(0, COLLECTED, index, parseable.len()))?;
        let filter =
            ResourceFilter::IGNORE_EXPIRATION.with_required_type(resource_type.name.as_str());
        match store.read_resources(ctx, "/", &filter, true) {
            Ok(found) => {
                tracing::debug!("Found {} resources of type {}", found.len(), resource_type.name);
                resources.extend(found);
            }
            Err(e) => {
                tracing::error!("Failed to read resources of type {}: {}", resource_type.name, e)
            }
        }
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;
    use crate::{CancellationFlag, TextReport};
    use linkguard_domain::{RelationType, ResourceState};

    fn offline() -> RequestContext {
        RequestContext::new("admin", Project::Offline, "/sites/a")
    }

    fn validate(store: &MockStore, list: Option<&PublishList>) -> ValidationRun {
        SystemValidator::default_config()
            .validate_resources(store, &mut offline(), list, None, None)
            .unwrap()
    }

    #[test]
    fn test_target_online_is_valid() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage").with_state(ResourceState::Changed);
        let b = store.add_published(&Resource::file("/b.html", "xmlpage"));
        store.add(Project::Offline, &a);
        store.relate(Project::Offline, Relation::between(&a, &b, RelationType::HYPERLINK));

        let list = PublishList::new(vec![a]);
        let run = validate(&store, Some(&list));
        assert!(run.broken_relations().is_empty());
        assert_eq!(run.checked_count(), 1);
    }

    #[test]
    fn test_target_nowhere_is_broken() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage").with_state(ResourceState::Changed);
        let c = Resource::file("/c.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.add(Project::Offline, &c);
        let link = Relation::between(&a, &c, RelationType::HYPERLINK);
        store.relate(Project::Offline, link.clone());

        let list = PublishList::new(vec![a]);
        let broken = validate(&store, Some(&list)).broken_relations();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken["/a.html"], vec![link]);
    }

    #[test]
    fn test_target_published_together_is_valid() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        let c = Resource::file("/c.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.add(Project::Offline, &c);
        store.relate(Project::Offline, Relation::between(&a, &c, RelationType::HYPERLINK));

        let list = PublishList::new(vec![a, c]);
        assert!(validate(&store, Some(&list)).broken_relations().is_empty());
    }

    #[test]
    fn test_target_deleted_together_is_broken() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage").with_state(ResourceState::Changed);
        let b = store.add_published(&Resource::file("/b.html", "xmlpage"));
        store.add(Project::Offline, &a);
        store.relate(Project::Offline, Relation::between(&a, &b, RelationType::HYPERLINK));

        let list = PublishList::new(vec![a, b.with_state(ResourceState::Deleted)]);
        let broken = validate(&store, Some(&list)).broken_relations();
        assert_eq!(broken.keys().collect::<Vec<_>>(), vec!["/a.html"]);
    }

    #[test]
    fn test_target_moved_online_resolves_by_id() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage").with_state(ResourceState::Changed);
        let b = Resource::file("/b.html", "xmlpage");
        let mut moved = b.clone();
        moved.root_path = "/moved/b.html".to_string();
        store.add(Project::Offline, &a);
        store.add(Project::Online, &moved);
        store.relate(Project::Offline, Relation::between(&a, &b, RelationType::HYPERLINK));

        // Deleting the target under its online path breaks the link
        let list =
            PublishList::new(vec![a.clone(), moved.clone().with_state(ResourceState::Deleted)]);
        assert_eq!(validate(&store, Some(&list)).broken_relations().len(), 1);

        // Deleting something at the stale path does not
        let stale = Resource::file("/b.html", "xmlpage").with_state(ResourceState::Deleted);
        let list = PublishList::new(vec![a, stale]);
        assert!(validate(&store, Some(&list)).broken_relations().is_empty());
    }

    #[test]
    fn test_deleted_resource_with_remaining_source_is_broken() {
        let mut store = MockStore::new();
        let page = store.add_published(&Resource::file("/page.html", "xmlpage"));
        let image = store.add_published(&Resource::file("/img.png", "image"));
        let link = Relation::between(&page, &image, RelationType::EMBEDDED_IMAGE);
        store.relate(Project::Online, link.clone());

        let doomed = image.clone().with_state(ResourceState::Deleted);
        let list = PublishList::new(vec![doomed.clone()]);
        let broken = validate(&store, Some(&list)).broken_relations();
        assert_eq!(broken["/img.png"], vec![link]);

        // Deleting the source in the same batch resolves it
        let list = PublishList::new(vec![doomed, page.with_state(ResourceState::Deleted)]);
        assert!(validate(&store, Some(&list)).broken_relations().is_empty());
    }

    #[test]
    fn test_repeated_targets_are_all_recorded() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        let c = Resource::file("/c.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.relate(Project::Offline, Relation::between(&a, &c, RelationType::HYPERLINK));
        store.relate(Project::Offline, Relation::between(&a, &c, RelationType::EMBEDDED_IMAGE));

        let list = PublishList::new(vec![a]);
        let broken = validate(&store, Some(&list)).broken_relations();
        assert_eq!(broken["/a.html"].len(), 2);
    }

    #[test]
    fn test_links_without_path_are_checked_by_id() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage").with_state(ResourceState::Changed);
        let logo = store.add_published(&Resource::file("/logo.png", "image"));
        store.add(Project::Offline, &a);
        let to_logo = Relation::new(
            Some(a.structure_id),
            Some(a.root_path.clone()),
            Some(logo.structure_id),
            None,
            RelationType::EMBEDDED_IMAGE,
        );
        let to_nowhere = Relation::new(
            Some(a.structure_id),
            Some(a.root_path.clone()),
            Some(StructureId::new()),
            None,
            RelationType::HYPERLINK,
        );
        store.relate(Project::Offline, to_logo);
        store.relate(Project::Offline, to_nowhere.clone());

        let list = PublishList::new(vec![a]);
        let broken = validate(&store, Some(&list)).broken_relations();
        assert_eq!(broken["/a.html"].len(), 1);
        assert_eq!(broken["/a.html"][0].target_id(), to_nowhere.target_id());
    }

    #[test]
    fn test_whole_tree_scan() {
        let mut store = MockStore::new();
        store.add_type("xmlpage", true);
        store.add_type("image", false);
        let a = Resource::file("/sites/a/a.html", "xmlpage");
        let img = Resource::file("/sites/a/logo.png", "image");
        let gone = Resource::file("/sites/a/gone.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.add(Project::Offline, &img);
        store.relate(Project::Offline, Relation::between(&a, &img, RelationType::EMBEDDED_IMAGE));
        store.relate(Project::Offline, Relation::between(&a, &gone, RelationType::HYPERLINK));

        let run = validate(&store, None);
        assert_eq!(run.outcomes().len(), 1, "only link-parseable types are scanned");
        let broken = run.broken_relations();
        assert_eq!(broken["/sites/a/a.html"].len(), 1);
        assert_eq!(broken["/sites/a/a.html"][0].target_path(), "/sites/a/gone.html");
    }

    #[test]
    fn test_resource_types_failure_aborts() {
        let mut store = MockStore::new();
        store.fail_resource_types();
        let result = SystemValidator::default_config().validate_resources(
            &store,
            &mut offline(),
            None,
            None,
            None,
        );
        assert!(matches!(result, Err(ValidatorError::Store(_))));
    }

    #[test]
    fn test_relation_failure_is_skipped() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.fail_relations_for("/a.html");

        let list = PublishList::new(vec![a]);
        let run = validate(&store, Some(&list));
        assert_eq!(run.skipped_count(), 1);
        assert!(run.broken_relations().is_empty());
    }

    #[test]
    fn test_cancellation_returns_no_result() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        store.add(Project::Offline, &a);
        let flag = CancellationFlag::new();
        flag.cancel();

        let mut ctx = offline();
        let list = PublishList::new(vec![a]);
        let result = SystemValidator::default_config().validate_resources(
            &store,
            &mut ctx,
            Some(&list),
            None,
            Some(&flag),
        );
        assert_eq!(result, Err(ValidatorError::Interrupted));
        assert_eq!(ctx.site_root(), "/sites/a");
        assert_eq!(ctx.project(), Project::Offline);
    }

    #[test]
    fn test_progress_reaches_completion() {
        let store = MockStore::new();
        let flag = CancellationFlag::new();
        let list = PublishList::default();
        SystemValidator::default_config()
            .validate_resources(&store, &mut offline(), Some(&list), None, Some(&flag))
            .unwrap();
        assert_eq!(flag.progress(), 100);
    }

    #[test]
    fn test_report_does_not_change_result() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        let b = Resource::file("/b.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.relate(Project::Offline, Relation::between(&a, &b, RelationType::HYPERLINK));
        let list = PublishList::new(vec![a]);

        let mut report = TextReport::new();
        let with_report = SystemValidator::default_config()
            .validate_resources(&store, &mut offline(), Some(&list), Some(&mut report), None)
            .unwrap();
        let without = validate(&store, Some(&list));
        assert_eq!(with_report, without);
        assert!(report.text().contains("Broken links found in /a.html"));
        assert!(report.text().contains("Link to /b.html (A)"));
    }

    #[test]
    fn test_lenient_report_lists_no_links() {
        let mut store = MockStore::new();
        let a = Resource::file("/a.html", "xmlpage");
        let b = Resource::file("/b.html", "xmlpage");
        store.add(Project::Offline, &a);
        store.relate(Project::Offline, Relation::between(&a, &b, RelationType::HYPERLINK));
        let list = PublishList::new(vec![a]);

        let mut report = TextReport::new();
        SystemValidator::new(ValidatorConfig::lenient())
            .validate_resources(&store, &mut offline(), Some(&list), Some(&mut report), None)
            .unwrap();
        assert!(report.text().contains("Broken links found in /a.html"));
        assert!(!report.text().contains("Link to"));
    }
}
