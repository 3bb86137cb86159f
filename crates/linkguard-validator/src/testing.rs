//! In-memory RelationStore for unit tests

use linkguard_domain::{
    Project, Relation, RelationFilter, RelationStore, RelationTypeRegistry, RequestContext,
    Resource, ResourceFilter, ResourceRef, ResourceType,
};
use std::collections::{HashMap, HashSet};

/// Mock store keeping both projects in memory
#[derive(Default)]
pub(crate) struct MockStore {
    resources: HashMap<Project, Vec<Resource>>,
    relations: HashMap<Project, Vec<Relation>>,
    types: Vec<ResourceType>,
    failing: HashSet<String>,
    fail_types: bool,
    pub registry: RelationTypeRegistry,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, project: Project, resource: &Resource) {
        self.resources.entry(project).or_default().push(resource.clone());
    }

    /// Add to both projects, as an unchanged resource
    pub fn add_published(&mut self, resource: &Resource) -> Resource {
        let published = resource
            .clone()
            .with_state(linkguard_domain::ResourceState::Unchanged);
        self.add(Project::Offline, &published);
        self.add(Project::Online, &published);
        published
    }

    pub fn relate(&mut self, project: Project, relation: Relation) {
        self.relations.entry(project).or_default().push(relation);
    }

    pub fn add_type(&mut self, name: &str, link_parseable: bool) {
        self.types.push(ResourceType::new(name, link_parseable));
    }

    /// Make relation queries for `root_path` fail
    pub fn fail_relations_for(&mut self, root_path: &str) {
        self.failing.insert(root_path.to_string());
    }

    pub fn fail_resource_types(&mut self) {
        self.fail_types = true;
    }

    fn project(&self, ctx: &RequestContext) -> &[Resource] {
        self.resources.get(&ctx.project()).map(Vec::as_slice).unwrap_or_default()
    }

    fn find(&self, ctx: &RequestContext, resource: ResourceRef<'_>) -> Option<&Resource> {
        match resource {
            ResourceRef::Id(id) => self.project(ctx).iter().find(|r| r.structure_id == id),
            ResourceRef::Path(path) => {
                let root_path = ctx.add_site_root(path);
                let as_folder = format!("{}/", root_path.trim_end_matches('/'));
                self.project(ctx)
                    .iter()
                    .find(|r| r.root_path == root_path || r.root_path == as_folder)
            }
        }
    }
}

impl RelationStore for MockStore {
    type Error = String;

    fn read_resource(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef<'_>,
        filter: &ResourceFilter,
    ) -> Result<Option<Resource>, Self::Error> {
        Ok(self
            .find(ctx, resource)
            .filter(|r| filter.matches(r, ctx.request_time()))
            .cloned())
    }

    fn read_resources(
        &self,
        ctx: &RequestContext,
        path: &str,
        filter: &ResourceFilter,
        recursive: bool,
    ) -> Result<Vec<Resource>, Self::Error> {
        let mut prefix = ctx.add_site_root(path);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let mut found: Vec<Resource> = self
            .project(ctx)
            .iter()
            .filter(|r| r.root_path.starts_with(&prefix) && r.root_path != prefix)
            .filter(|r| {
                recursive || !r.root_path[prefix.len()..].trim_end_matches('/').contains('/')
            })
            .filter(|r| filter.matches(r, ctx.request_time()))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.root_path.cmp(&b.root_path));
        Ok(found)
    }

    fn read_siblings(
        &self,
        ctx: &RequestContext,
        path: &str,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, Self::Error> {
        let origin = self
            .find(ctx, ResourceRef::Path(path))
            .ok_or_else(|| format!("not found: {}", path))?;
        Ok(self
            .project(ctx)
            .iter()
            .filter(|r| r.resource_id == origin.resource_id)
            .filter(|r| filter.matches(r, ctx.request_time()))
            .cloned()
            .collect())
    }

    fn resource_types(&self) -> Result<Vec<ResourceType>, Self::Error> {
        if self.fail_types {
            return Err("resource types unavailable".to_string());
        }
        Ok(self.types.clone())
    }

    fn find_relations(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, Self::Error> {
        if self.failing.contains(&resource.root_path) {
            return Err(format!("relations of {} unavailable", resource.root_path));
        }
        Ok(self
            .relations
            .get(&ctx.project())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|r| filter.matches(r, Some(resource)))
            .cloned()
            .collect())
    }

    fn add_relation(
        &mut self,
        ctx: &RequestContext,
        source_path: &str,
        target_path: &str,
        type_name: &str,
    ) -> Result<Relation, Self::Error> {
        let relation_type = self.registry.value_of(type_name).map_err(|e| e.to_string())?;
        let source = self
            .find(ctx, ResourceRef::Path(source_path))
            .ok_or_else(|| format!("not found: {}", source_path))?;
        let target = self
            .find(ctx, ResourceRef::Path(target_path))
            .ok_or_else(|| format!("not found: {}", target_path))?;
        let relation = Relation::between(source, target, relation_type);
        self.relate(ctx.project(), relation.clone());
        Ok(relation)
    }

    fn delete_relations(
        &mut self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<usize, Self::Error> {
        if self.failing.contains(&resource.root_path) {
            return Err(format!("relations of {} unavailable", resource.root_path));
        }
        let relations = self.relations.entry(ctx.project()).or_default();
        let before = relations.len();
        relations.retain(|r| !filter.matches(r, Some(resource)));
        Ok(before - relations.len())
    }
}
