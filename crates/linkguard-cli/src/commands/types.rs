//! Types command implementation.

use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::RelationTypeRegistry;

/// Execute the types command.
pub fn execute_types(registry: &RelationTypeRegistry, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_relation_types(&registry.all())?);
    Ok(())
}
