//! Cleanup command implementation.

use crate::cli::CleanupArgs;
use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::RequestContext;
use linkguard_store::SqliteStore;
use linkguard_validator::remove_dangling_user_relations;
use std::io::{self, Write};

/// Execute the cleanup command.
pub fn execute_cleanup(
    args: CleanupArgs,
    store: &mut SqliteStore,
    ctx: &mut RequestContext,
    formatter: &Formatter,
) -> Result<()> {
    // Confirm removal unless --yes is specified
    if !args.yes {
        println!("About to remove relations not defined in content from:");
        for name in &args.names {
            println!("  - {}", ctx.add_site_root(name));
        }
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    let registry = store.registry().clone();
    let removed = remove_dangling_user_relations(store, ctx, &registry, &args.names);
    println!("{}", formatter.success(&format!("Removed {} relation(s)", removed)));
    Ok(())
}
