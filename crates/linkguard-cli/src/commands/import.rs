//! Import command implementation.

use crate::cli::ImportArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use linkguard_domain::{
    Project, Relation, RelationStore, RequestContext, Resource, ResourceFilter, ResourceRef,
    ResourceState,
    ResourceType,
};
use linkguard_store::SqliteStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};

/// Execute the import command.
pub fn execute_import(
    args: ImportArgs,
    store: &mut SqliteStore,
    formatter: &Formatter,
) -> Result<()> {
    // Read the document from file or stdin
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either --file or --stdin".to_string(),
        ));
    };

    let document: ImportDocument = serde_json::from_str(&json_data)?;
    let summary = import(store, document)?;
    println!("{}", formatter.success(&summary.to_string()));
    Ok(())
}

/// Resource types, resources and relations to load, with root paths.
#[derive(Debug, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    resource_types: Vec<ResourceTypeDefinition>,
    #[serde(default)]
    resources: Vec<ResourceDefinition>,
    #[serde(default)]
    relations: Vec<RelationDefinition>,
}

#[derive(Debug, Deserialize)]
struct ResourceTypeDefinition {
    name: String,
    #[serde(default)]
    link_parseable: bool,
}

#[derive(Debug, Deserialize)]
struct ResourceDefinition {
    path: String,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(default)]
    folder: bool,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    released: Option<u64>,
    #[serde(default)]
    expired: Option<u64>,
    /// Path of an earlier resource sharing the same content
    #[serde(default)]
    sibling_of: Option<String>,
    /// Publish after all relations are loaded
    #[serde(default)]
    published: bool,
}

#[derive(Debug, Deserialize)]
struct RelationDefinition {
    source: String,
    target: String,
    #[serde(rename = "type")]
    type_name: String,
}

/// Counts of an import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Resource types written
    pub resource_types: usize,
    /// Resources written
    pub resources: usize,
    /// Relations written
    pub relations: usize,
    /// Resources published
    pub published: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} resource type(s), {} resource(s), {} relation(s); published {}",
            self.resource_types, self.resources, self.relations, self.published
        )
    }
}

/// Load `document` into the offline project.
///
/// A relation whose target does not exist is stored without target id.
pub fn import(store: &mut SqliteStore, document: ImportDocument) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for definition in &document.resource_types {
        store.add_resource_type(&ResourceType::new(&definition.name, definition.link_parseable))?;
        summary.resource_types += 1;
    }

    let mut written: HashMap<String, Resource> = HashMap::new();
    let mut to_publish = Vec::new();
    for definition in document.resources {
        let resource = definition.to_resource(&written)?;
        store.write_resource(Project::Offline, &resource)?;
        if definition.published {
            to_publish.push(resource.structure_id);
        }
        written.insert(resource.root_path.clone(), resource);
        summary.resources += 1;
    }

    let ctx = RequestContext::new("import", Project::Offline, RequestContext::ROOT_SITE);
    for definition in &document.relations {
        let relation_type = store.registry().value_of(&definition.type_name)?;
        let source = lookup(store, &ctx, &written, &definition.source)?
            .ok_or_else(|| CliError::NotFound(definition.source.clone()))?;
        let relation = match lookup(store, &ctx, &written, &definition.target)? {
            Some(target) => Relation::between(&source, &target, relation_type),
            None => {
                tracing::warn!(
                    "Target {} does not exist, importing a dangling relation",
                    definition.target
                );
                Relation::new(
                    Some(source.structure_id),
                    Some(source.root_path.clone()),
                    None,
                    Some(definition.target.clone()),
                    relation_type,
                )
            }
        };
        store.write_relation(Project::Offline, &relation)?;
        summary.relations += 1;
    }

    for structure_id in to_publish {
        store.publish_resource(structure_id)?;
        summary.published += 1;
    }
    tracing::info!("{}", summary);
    Ok(summary)
}

fn lookup(
    store: &SqliteStore,
    ctx: &RequestContext,
    written: &HashMap<String, Resource>,
    path: &str,
) -> Result<Option<Resource>> {
    if let Some(resource) = written.get(path) {
        return Ok(Some(resource.clone()));
    }
    Ok(store.read_resource(ctx, ResourceRef::Path(path), &ResourceFilter::ALL)?)
}

impl ResourceDefinition {
    fn to_resource(&self, written: &HashMap<String, Resource>) -> Result<Resource> {
        let mut resource = if self.folder {
            Resource::folder(self.path.as_str())
        } else {
            let type_name = self
                .type_name
                .as_deref()
                .ok_or_else(|| {
                    CliError::InvalidInput(format!("Resource {} has no type", self.path))
                })?;
            match &self.sibling_of {
                Some(origin) => written
                    .get(origin)
                    .ok_or_else(|| CliError::NotFound(origin.clone()))?
                    .sibling(self.path.as_str()),
                None => Resource::file(self.path.as_str(), type_name),
            }
        };

        if let Some(state) = &self.state {
            let state = ResourceState::parse(state)
                .ok_or_else(|| {
                    CliError::InvalidInput(format!("Unknown state '{}' of {}", state, self.path))
                })?;
            resource = resource.with_state(state);
        }
        if self.released.is_some() || self.expired.is_some() {
            let released = self.released.unwrap_or(resource.date_released);
            let expired = self.expired.unwrap_or(resource.date_expired);
            resource = resource.with_time_range(released, expired);
        }
        Ok(resource)
    }
}
