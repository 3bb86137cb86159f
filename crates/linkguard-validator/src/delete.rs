//! Validation of deletions

use crate::expand::{add_siblings, expand};
use crate::{BrokenRelations, RelationValidator, ResourceOutcome, ValidationRun};
use linkguard_domain::{RelationFilter, RelationStore, RequestContext};
use std::fmt::Display;

/// Relations that would dangle if a set of resources were deleted
///
/// Every resource in the set (folders expanded, optionally siblings added) is
/// checked for incoming relations. A relation whose source lies outside the
/// set is broken. A set that only references itself yields an empty result.
///
/// # Examples
///
/// ```no_run
/// use linkguard_domain::{Project, RelationTypeRegistry, RequestContext};
/// use linkguard_store::SqliteStore;
/// use linkguard_validator::{DeleteValidator, RelationValidator};
/// use std::sync::Arc;
///
/// let store = SqliteStore::new("linkguard.db", Arc::new(RelationTypeRegistry::new())).unwrap();
/// let mut ctx = RequestContext::new("editor", Project::Offline, "/sites/default");
///
/// let validator = DeleteValidator::new(&store, &mut ctx, ["/news/"], false);
/// for key in validator.key_set() {
///     println!("{} is still referenced", key);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DeleteValidator {
    run: ValidationRun,
    broken: BrokenRelations,
}

impl DeleteValidator {
    /// Validate the deletion of `names`, site paths in the context's site
    ///
    /// Failures reading a resource or its relations are logged; that resource
    /// then contributes no findings.
    pub fn new<S, I>(store: &S, ctx: &mut RequestContext, names: I, include_siblings: bool) -> Self
    where
        S: RelationStore,
        S::Error: Display,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let root_paths: Vec<String> = names
            .into_iter()
            .map(|name| ctx.add_site_root(name.as_ref()))
            .collect();
        let root_ctx = ctx.switch_site_root(RequestContext::ROOT_SITE);

        let mut expansion = expand(store, &root_ctx, &root_paths);
        if include_siblings {
            add_siblings(store, &root_ctx, &mut expansion);
        }
        tracing::debug!(
            "Validating deletion of {} resources ({} requested)",
            expansion.resources.len(),
            root_paths.len()
        );

        let mut run = ValidationRun::new();
        for (key, resource) in &expansion.resources {
            let found = store.find_relations(&root_ctx, resource, &RelationFilter::SOURCES);
            let outcome = match found {
                Ok(relations) => ResourceOutcome::Checked(
                    relations
                        .into_iter()
                        .filter(|relation| !expansion.paths.contains(relation.source_path()))
                        .collect(),
                ),
                Err(e) => {
                    tracing::error!(
                        "Failed to read the relations of {}: {}",
                        resource.root_path,
                        e
                    );
                    ResourceOutcome::Skipped(e.to_string())
                }
            };
            run.record(key.clone(), outcome);
        }

        let broken = run.broken_relations();
        if !broken.is_empty() {
            tracing::info!(
                "Deleting {} would break {} links into {} resources",
                root_paths.join(", "),
                run.broken_link_count(),
                broken.len()
            );
        }
        Self { run, broken }
    }

    /// Per-resource outcomes
    pub fn run(&self) -> &ValidationRun {
        &self.run
    }
}

impl RelationValidator for DeleteValidator {
    fn broken_relations(&self) -> &BrokenRelations {
        &self.broken
    }
}
