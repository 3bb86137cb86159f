//! Publish command implementation.

use super::read_existing;
use crate::cli::NamesArgs;
use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::{RelationStore, RequestContext, Resource, ResourceFilter};
use linkguard_store::SqliteStore;

/// Execute the publish command.
///
/// Folders are published with their whole contents, parents first.
pub fn execute_publish(
    args: NamesArgs,
    store: &mut SqliteStore,
    ctx: &RequestContext,
    formatter: &Formatter,
) -> Result<()> {
    let resources = collect(store, ctx, &args.names)?;
    for resource in &resources {
        store.publish_resource(resource.structure_id)?;
    }
    println!("{}", formatter.success(&format!("Published {} resource(s)", resources.len())));
    Ok(())
}

fn collect(store: &SqliteStore, ctx: &RequestContext, names: &[String]) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for name in names {
        let resource = read_existing(store, ctx, name)?;
        if resource.is_folder() {
            resources.extend(store.read_resources(ctx, name, &ResourceFilter::ALL, true)?);
        }
        resources.push(resource);
    }
    resources.sort_by(|a, b| a.root_path.cmp(&b.root_path));
    resources.dedup_by(|a, b| a.root_path == b.root_path);
    Ok(resources)
}
