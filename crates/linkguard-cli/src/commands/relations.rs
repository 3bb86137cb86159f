//! Relations command implementation.

use super::read_existing;
use crate::cli::RelationsArgs;
use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::{FilterMode, RelationFilter, RelationStore, RequestContext};
use linkguard_store::SqliteStore;

/// Execute the relations command.
pub fn execute_relations(
    args: RelationsArgs,
    store: &SqliteStore,
    ctx: &RequestContext,
    formatter: &Formatter,
) -> Result<()> {
    let resource = read_existing(store, ctx, &args.path)?;
    let filter = build_filter(&args, store, ctx)?;
    tracing::debug!("Reading relations of {} with filter {}", resource.root_path, filter);

    let relations = store.find_relations(ctx, &resource, &filter)?;
    println!("{}", formatter.format_relations(&relations)?);
    Ok(())
}

/// Translate the arguments into a relation filter.
fn build_filter(
    args: &RelationsArgs,
    store: &SqliteStore,
    ctx: &RequestContext,
) -> Result<RelationFilter> {
    let mut filter = RelationFilter::from(FilterMode::from(args.direction));
    for name in &args.types {
        filter = filter.filter_type(store.registry().value_of(name)?);
    }
    if let Some(other) = &args.other {
        filter = filter.filter_path(ctx.add_site_root(other));
        if args.children {
            filter = filter.filter_include_children();
        }
    }
    Ok(filter)
}
