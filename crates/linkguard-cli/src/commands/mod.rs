//! Command implementations.

pub mod add_relation;
pub mod check;
pub mod cleanup;
pub mod import;
pub mod publish;
pub mod relations;
pub mod types;

pub use self::add_relation::execute_add_relation;
pub use self::check::{
    execute_check_delete, execute_check_links, execute_check_publish, execute_check_system,
};
pub use self::cleanup::execute_cleanup;
pub use self::import::execute_import;
pub use self::publish::execute_publish;
pub use self::relations::execute_relations;
pub use self::types::execute_types;

use crate::error::{CliError, Result};
use linkguard_domain::{RelationStore, RequestContext, Resource, ResourceFilter, ResourceRef};
use linkguard_store::SqliteStore;

/// Read a resource by site path, deleted and expired ones included.
pub(crate) fn read_existing(
    store: &SqliteStore,
    ctx: &RequestContext,
    path: &str,
) -> Result<Resource> {
    store
        .read_resource(ctx, ResourceRef::Path(path), &ResourceFilter::ALL)?
        .ok_or_else(|| CliError::NotFound(ctx.add_site_root(path)))
}
