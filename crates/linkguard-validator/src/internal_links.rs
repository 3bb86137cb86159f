//! Pre-check of links inside a set of resources
//!
//! Used before presenting the impact of a deletion to an operator: finds the
//! links of the selected resources whose targets no longer resolve, and
//! hides the resources the operator can not see in their current site.

use crate::expand::expand;
use linkguard_domain::{
    Relation, RelationFilter, RelationStore, RequestContext, ResourceFilter, ResourceRef,
};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Dangling links among a set of resources, grouped by linking resource
pub struct InternalLinksValidator<'a, S> {
    store: &'a S,
    ctx: RequestContext,
    broken: BTreeMap<String, Vec<Relation>>,
    visible: OnceCell<(Vec<String>, usize)>,
}

impl<'a, S> InternalLinksValidator<'a, S>
where
    S: RelationStore,
    S::Error: Display,
{
    /// Collect the dangling links of `names`, site paths in the context's site
    ///
    /// Folders are expanded recursively. A link dangles if its target id is
    /// null or does not resolve; the stored path is not consulted. Read
    /// failures are logged and contribute no findings.
    pub fn new<I>(store: &'a S, ctx: &RequestContext, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut root_ctx = ctx.clone();
        root_ctx.set_site_root(RequestContext::ROOT_SITE);
        let root_paths: Vec<String> =
            names.into_iter().map(|name| ctx.add_site_root(name.as_ref())).collect();

        let expansion = expand(store, &root_ctx, &root_paths);
        let mut broken: BTreeMap<String, Vec<Relation>> = BTreeMap::new();
        for (_, resource) in &expansion.resources {
            let found = store.find_relations(&root_ctx, resource, &RelationFilter::TARGETS);
            let relations = match found {
                Ok(relations) => relations,
                Err(e) => {
                    tracing::error!("Failed to read the links of {}: {}", resource.root_path, e);
                    continue;
                }
            };
            for relation in relations {
                let target_id = relation.target_id();
                let dangling = if target_id.is_null() {
                    true
                } else {
                    let target = ResourceRef::Id(target_id);
                    match store.read_resource(&root_ctx, target, &ResourceFilter::ALL) {
                        Ok(found) => found.is_none(),
                        Err(e) => {
                            tracing::error!("Failed to resolve the target of {}: {}", relation, e);
                            continue;
                        }
                    }
                };
                if dangling {
                    broken
                        .entry(relation.source_path().to_string())
                        .or_default()
                        .push(relation);
                }
            }
        }
        tracing::debug!(
            "Found dangling links in {} of {} resources",
            broken.len(),
            expansion.resources.len()
        );

        Self {
            store,
            ctx: ctx.clone(),
            broken,
            visible: OnceCell::new(),
        }
    }

    /// Whether no dangling link was found
    pub fn is_empty(&self) -> bool {
        self.broken.is_empty()
    }

    /// Dangling links of one resource, by site path or root path
    pub fn broken_links_for_resource(&self, name: &str) -> &[Relation] {
        self.broken
            .get(&self.ctx.add_site_root(name))
            .or_else(|| self.broken.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Site paths of the visible resources with dangling links, sorted
    pub fn resources_with_broken_links(&self) -> &[String] {
        &self.visibility().0
    }

    /// Number of resources with dangling links hidden from the actor
    pub fn not_visible_resources_count(&self) -> usize {
        self.visibility().1
    }

    fn visibility(&self) -> &(Vec<String>, usize) {
        self.visible.get_or_init(|| {
            let mut visible = Vec::new();
            let mut hidden = 0;
            for root_path in self.broken.keys() {
                let site_path = self.ctx.remove_site_root(root_path);
                match self
                    .store
                    .read_resource(
                        &self.ctx,
                        ResourceRef::Path(&site_path),
                        &ResourceFilter::DEFAULT,
                    )
                {
                    Ok(Some(_)) => visible.push(site_path),
                    Ok(None) => hidden += 1,
                    Err(e) => {
                        tracing::debug!(
                            "{} is not readable by {}: {}",
                            root_path,
                            self.ctx.user(),
                            e
                        );
                        hidden += 1;
                    }
                }
            }
            visible.sort();
            (visible, hidden)
        })
    }
}
