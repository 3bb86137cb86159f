//! Linkguard Storage Layer
//!
//! Implements the RelationStore trait using SQLite.
//!
//! # Architecture
//!
//! - One SQLite database holds both snapshots of the resource tree; every row
//!   carries the project (`offline` / `online`) it belongs to
//! - Relations are stored per project, keyed by source id, target and type
//! - Relation type ids are resolved through the shared [`RelationTypeRegistry`]
//!
//! # Examples
//!
//! ```no_run
//! use linkguard_domain::RelationTypeRegistry;
//! use linkguard_store::SqliteStore;
//! use std::sync::Arc;
//!
//! let store = SqliteStore::new(":memory:", Arc::new(RelationTypeRegistry::new())).unwrap();
//! // Store is now ready for resource and relation operations
//! ```

#![warn(missing_docs)]

use linkguard_domain::{
    FilterMode, Project, RegistryError, Relation, RelationFilter, RelationStore,
    RelationTypeRegistry, RequestContext, Resource, ResourceFilter, ResourceRef, ResourceState,
    ResourceType, StructureId,
};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unknown relation type
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Relations of this type are maintained by content parsing
    #[error("Relation type '{0}' is defined in content and can not be changed by hand")]
    DefinedInContent(String),
}

const RESOURCE_COLUMNS: &str = "r.structure_id, r.resource_id, r.root_path, r.type_name, \
     r.folder, r.state, r.date_released, r.date_expired, \
     (SELECT COUNT(*) FROM resources s \
      WHERE s.project = r.project AND s.resource_id = r.resource_id)";

const RELATION_COLUMNS: &str = "source_id, source_path, target_id, target_path, type_id";

/// SQLite-based implementation of RelationStore
///
/// Holds the offline and the online snapshot of the resource tree together
/// with the relations of each.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
    registry: Arc<RelationTypeRegistry>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(
        path: P,
        registry: Arc<RelationTypeRegistry>,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn, registry };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// The relation type registry used to resolve stored type ids
    pub fn registry(&self) -> &RelationTypeRegistry {
        &self.registry
    }

    /// Register a resource type, replacing an existing one with the same name
    pub fn add_resource_type(&mut self, resource_type: &ResourceType) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO resource_types (name, link_parseable) VALUES (?1, ?2)",
            params![&resource_type.name, resource_type.link_parseable],
        )?;
        Ok(())
    }

    /// Write a resource into a project, replacing any resource with the same id or path
    pub fn write_resource(
        &mut self,
        project: Project,
        resource: &Resource,
    ) -> Result<(), StoreError> {
        insert_resource(&self.conn, project, resource)
    }

    /// Write a relation into a project as-is
    ///
    /// Unlike [`RelationStore::add_relation`] this accepts every type; it is
    /// the path taken by link parsing, which maintains the relations defined
    /// in content.
    pub fn write_relation(
        &mut self,
        project: Project,
        relation: &Relation,
    ) -> Result<(), StoreError> {
        insert_relation(&self.conn, project, relation)
    }

    /// Publish one offline resource
    ///
    /// The online copy and its outgoing relations are replaced by the offline
    /// ones and the offline state becomes unchanged. A resource marked for
    /// deletion is removed from both projects instead. Relations pointing at
    /// it from other resources are left in place.
    pub fn publish_resource(&mut self, structure_id: StructureId) -> Result<(), StoreError> {
        let offline = read_resource_row(&self.conn, Project::Offline, structure_id)?
            .ok_or_else(|| StoreError::NotFound(structure_id.to_string()))?;
        let id = id_to_bytes(structure_id);

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM relations WHERE project = ?1 AND source_id = ?2",
            params![Project::Online.as_str(), &id],
        )?;
        if offline.state.is_deleted() {
            for project in [Project::Online, Project::Offline] {
                tx.execute(
                    "DELETE FROM resources WHERE project = ?1 AND structure_id = ?2",
                    params![project.as_str(), &id],
                )?;
            }
            tx.execute(
                "DELETE FROM relations WHERE project = ?1 AND source_id = ?2",
                params![Project::Offline.as_str(), &id],
            )?;
        } else {
            let published = offline.clone().with_state(ResourceState::Unchanged);
            insert_resource(&tx, Project::Online, &published)?;
            tx.execute(
                &format!(
                    "INSERT OR IGNORE INTO relations (project, {cols}) \
                     SELECT ?1, {cols} FROM relations WHERE project = ?2 AND source_id = ?3",
                    cols = RELATION_COLUMNS
                ),
                params![Project::Online.as_str(), Project::Offline.as_str(), &id],
            )?;
            tx.execute(
                "UPDATE resources SET state = ?1 WHERE project = ?2 AND structure_id = ?3",
                params![ResourceState::Unchanged.as_str(), Project::Offline.as_str(), &id],
            )?;
        }
        tx.commit()?;

        tracing::info!("Published {} ({})", offline.root_path, offline.state);
        Ok(())
    }

    fn query_resources(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<Resource>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let resources = stmt
            .query_map(params, row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(resources)
    }

    fn row_to_relation(&self, row: &Row<'_>) -> rusqlite::Result<Relation> {
        let type_id: u32 = row.get(4)?;
        let relation_type = self
            .registry
            .value_of_id(type_id)
            .map_err(|e| conversion_error(4, rusqlite::types::Type::Integer, e))?;
        Ok(Relation::new(
            Some(blob_column(row, 0)?),
            Some(row.get(1)?),
            Some(blob_column(row, 2)?),
            Some(row.get(3)?),
            relation_type,
        ))
    }
}

impl RelationStore for SqliteStore {
    type Error = StoreError;

    fn read_resource(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef<'_>,
        filter: &ResourceFilter,
    ) -> Result<Option<Resource>, Self::Error> {
        let found = match resource {
            ResourceRef::Id(id) => read_resource_row(&self.conn, ctx.project(), id)?,
            ResourceRef::Path(path) => {
                let root_path = ctx.add_site_root(path);
                let as_folder = format!("{}/", root_path.trim_end_matches('/'));
                let sql = format!(
                    "SELECT {} FROM resources r WHERE r.project = ?1 AND r.root_path IN (?2, ?3)",
                    RESOURCE_COLUMNS
                );
                self.query_resources(&sql, params![ctx.project().as_str(), &root_path, &as_folder])?
                    .into_iter()
                    .next()
            }
        };
        Ok(found.filter(|r| filter.matches(r, ctx.request_time())))
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
        let sql = format!(
            "SELECT {} FROM resources r WHERE r.project = ?1 \
             AND substr(r.root_path, 1, length(?2)) = ?2 AND r.root_path != ?2 \
             ORDER BY r.root_path",
            RESOURCE_COLUMNS
        );
        let resources = self.query_resources(&sql, params![ctx.project().as_str(), &prefix])?;
        Ok(resources
            .into_iter()
            .filter(|r| recursive || is_direct_child(&r.root_path, &prefix))
            .filter(|r| filter.matches(r, ctx.request_time()))
            .collect())
    }

    fn read_siblings(
        &self,
        ctx: &RequestContext,
        path: &str,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, Self::Error> {
        let resource = self
            .read_resource(ctx, ResourceRef::Path(path), &ResourceFilter::ALL)?
            .ok_or_else(|| StoreError::NotFound(ctx.add_site_root(path)))?;
        let sql = format!(
            "SELECT {} FROM resources r WHERE r.project = ?1 AND r.resource_id = ?2 \
             ORDER BY r.root_path",
            RESOURCE_COLUMNS
        );
        let siblings = self.query_resources(
            &sql,
            params![ctx.project().as_str(), id_to_bytes(resource.resource_id)],
        )?;
        Ok(siblings
            .into_iter()
            .filter(|r| filter.matches(r, ctx.request_time()))
            .collect())
    }

    fn resource_types(&self) -> Result<Vec<ResourceType>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, link_parseable FROM resource_types ORDER BY name")?;
        let types = stmt
            .query_map([], |row| Ok(ResourceType::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }

    fn find_relations(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, Self::Error> {
        let (conditions, params) = relation_conditions(ctx.project(), resource, filter);
        let sql = format!(
            "SELECT {} FROM relations WHERE {} ORDER BY rowid",
            RELATION_COLUMNS, conditions
        );
        tracing::trace!("Reading relations of {} with filter {}", resource.root_path, filter);

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let relations = stmt
            .query_map(&param_refs[..], |row| self.row_to_relation(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(relations)
    }

    fn add_relation(
        &mut self,
        ctx: &RequestContext,
        source_path: &str,
        target_path: &str,
        type_name: &str,
    ) -> Result<Relation, Self::Error> {
        let relation_type = self.registry.value_of(type_name)?;
        if relation_type.is_defined_in_content() {
            return Err(StoreError::DefinedInContent(relation_type.name().to_string()));
        }
        let source = self
            .read_resource(ctx, ResourceRef::Path(source_path), &ResourceFilter::ALL)?
            .ok_or_else(|| StoreError::NotFound(ctx.add_site_root(source_path)))?;
        let target = self
            .read_resource(ctx, ResourceRef::Path(target_path), &ResourceFilter::ALL)?
            .ok_or_else(|| StoreError::NotFound(ctx.add_site_root(target_path)))?;

        let relation = Relation::between(&source, &target, relation_type);
        insert_relation(&self.conn, ctx.project(), &relation)?;
        tracing::info!("Added relation {}", relation);
        Ok(relation)
    }

    fn delete_relations(
        &mut self,
        ctx: &RequestContext,
        resource: &Resource,
        filter: &RelationFilter,
    ) -> Result<usize, Self::Error> {
        let (conditions, params) = relation_conditions(ctx.project(), resource, filter);
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM relations WHERE {}", conditions), &param_refs[..])?;
        tracing::debug!(
            "Deleted {} relations of {} with filter {}",
            deleted,
            resource.root_path,
            filter
        );
        Ok(deleted)
    }
}

/// Build the WHERE clause selecting the relations of `anchor` that pass `filter`
///
/// The anchor is matched by structure id, or by path where the stored id is
/// the null id. Id and path restrictions apply to the wanted end, the type set
/// to the relation itself.
fn relation_conditions(
    project: Project,
    anchor: &Resource,
    filter: &RelationFilter,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions = vec!["project = ?".to_string()];
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(project.as_str().to_string())];

    // The anchor sits at the end opposite to the wanted one
    let anchor_id = id_to_bytes(anchor.structure_id);
    let null_id = id_to_bytes(StructureId::NULL);
    push_either(&mut conditions, &mut params, filter.mode(), true, |end| {
        (
            format!("({end}_id = ? OR ({end}_id = ? AND {end}_path = ?))"),
            vec![
                Box::new(anchor_id.clone()) as Box<dyn ToSql>,
                Box::new(null_id.clone()),
                Box::new(anchor.root_path.clone()),
            ],
        )
    });

    if let Some(id) = filter.structure_id() {
        let id = id_to_bytes(id);
        push_either(&mut conditions, &mut params, filter.mode(), false, |end| {
            (format!("{end}_id = ?"), vec![Box::new(id.clone()) as Box<dyn ToSql>])
        });
    }

    if let Some(path) = filter.path().filter(|p| !p.is_empty()) {
        let children = filter.includes_children();
        push_either(&mut conditions, &mut params, filter.mode(), false, |end| {
            if children {
                (
                    format!("substr({end}_path, 1, length(?)) = ?"),
                    vec![
                        Box::new(path.to_string()) as Box<dyn ToSql>,
                        Box::new(path.to_string()),
                    ],
                )
            } else {
                (format!("{end}_path = ?"), vec![Box::new(path.to_string()) as Box<dyn ToSql>])
            }
        });
    }

    if !filter.types().is_empty() {
        let placeholders = vec!["?"; filter.types().len()].join(", ");
        conditions.push(format!("type_id IN ({})", placeholders));
        params.extend(
            filter
                .types()
                .iter()
                .map(|t| Box::new(t.id()) as Box<dyn ToSql>),
        );
    }

    (conditions.join(" AND "), params)
}

/// Push one condition evaluated at the end(s) selected by `mode`
///
/// With `anchor` set the anchor end is used, otherwise the wanted end.
fn push_either<F>(
    conditions: &mut Vec<String>,
    params: &mut Vec<Box<dyn ToSql>>,
    mode: FilterMode,
    anchor: bool,
    condition: F,
) where
    F: Fn(&str) -> (String, Vec<Box<dyn ToSql>>),
{
    let (wanted_source, wanted_target) = if anchor {
        ("target", "source")
    } else {
        ("source", "target")
    };
    let ends = match mode {
        FilterMode::Sources => vec![wanted_source],
        FilterMode::Targets => vec![wanted_target],
        FilterMode::All => vec![wanted_source, wanted_target],
    };
    let mut alternatives = Vec::with_capacity(ends.len());
    for end in ends {
        let (sql, values) = condition(end);
        alternatives.push(sql);
        params.extend(values);
    }
    conditions.push(format!("({})", alternatives.join(" OR ")));
}

fn insert_resource(
    conn: &Connection,
    project: Project,
    resource: &Resource,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO resources
         (project, structure_id, resource_id, root_path, type_name, folder, state,
          date_released, date_expired)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            project.as_str(),
            id_to_bytes(resource.structure_id),
            id_to_bytes(resource.resource_id),
            &resource.root_path,
            &resource.type_name,
            resource.folder,
            resource.state.as_str(),
            time_to_sql(resource.date_released),
            time_to_sql(resource.date_expired),
        ],
    )?;
    Ok(())
}

fn insert_relation(
    conn: &Connection,
    project: Project,
    relation: &Relation,
) -> Result<(), StoreError> {
    conn.execute(
        &format!(
            "INSERT OR IGNORE INTO relations (project, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            RELATION_COLUMNS
        ),
        params![
            project.as_str(),
            id_to_bytes(relation.source_id()),
            relation.source_path(),
            id_to_bytes(relation.target_id()),
            relation.target_path(),
            relation.relation_type().id(),
        ],
    )?;
    Ok(())
}

fn read_resource_row(
    conn: &Connection,
    project: Project,
    structure_id: StructureId,
) -> Result<Option<Resource>, StoreError> {
    let sql = format!(
        "SELECT {} FROM resources r WHERE r.project = ?1 AND r.structure_id = ?2",
        RESOURCE_COLUMNS
    );
    let resource = conn
        .query_row(&sql, params![project.as_str(), id_to_bytes(structure_id)], row_to_resource)
        .optional()?;
    Ok(resource)
}

fn row_to_resource(row: &Row<'_>) -> rusqlite::Result<Resource> {
    let state: String = row.get(5)?;
    let state = ResourceState::parse(&state).ok_or_else(|| {
        conversion_error(
            5,
            rusqlite::types::Type::Text,
            StoreError::InvalidData(format!("Unknown resource state: {}", state)),
        )
    })?;
    Ok(Resource {
        structure_id: blob_column(row, 0)?,
        resource_id: blob_column(row, 1)?,
        root_path: row.get(2)?,
        type_name: row.get(3)?,
        folder: row.get(4)?,
        state,
        date_released: time_from_sql(row.get(6)?),
        date_expired: time_from_sql(row.get(7)?),
        sibling_count: row.get(8)?,
    })
}

/// Whether `root_path` lies directly inside the folder `prefix`
fn is_direct_child(root_path: &str, prefix: &str) -> bool {
    !root_path[prefix.len()..].trim_end_matches('/').contains('/')
}

fn conversion_error<E>(column: usize, ty: rusqlite::types::Type, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(error))
}

/// Convert StructureId to bytes for storage
fn id_to_bytes(id: StructureId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

/// Convert bytes to StructureId
fn bytes_to_id(bytes: &[u8]) -> Result<StructureId, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for StructureId, got {}", bytes.len()))
    })?;
    Ok(StructureId::from_value(u128::from_be_bytes(arr)))
}

fn blob_column(row: &Row<'_>, index: usize) -> rusqlite::Result<StructureId> {
    let bytes: Vec<u8> = row.get(index)?;
    bytes_to_id(&bytes).map_err(|e| conversion_error(index, rusqlite::types::Type::Blob, e))
}

// SQLite integers are signed; "never expires" is stored as i64::MAX
fn time_to_sql(time: u64) -> i64 {
    i64::try_from(time).unwrap_or(i64::MAX)
}

fn time_from_sql(time: i64) -> u64 {
    if time == i64::MAX {
        u64::MAX
    } else {
        u64::try_from(time).unwrap_or(0)
    }
}
