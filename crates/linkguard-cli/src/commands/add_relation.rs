//! Add-relation command implementation.

use crate::cli::AddRelationArgs;
use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::{RelationStore, RequestContext};
use linkguard_store::SqliteStore;

/// Execute the add-relation command.
pub fn execute_add_relation(
    args: AddRelationArgs,
    store: &mut SqliteStore,
    ctx: &RequestContext,
    formatter: &Formatter,
) -> Result<()> {
    let relation = store.add_relation(ctx, &args.source, &args.target, &args.relation_type)?;
    println!("{}", formatter.success(&format!("Relation added: {}", relation)));
    Ok(())
}
