//! Linkguard CLI - Relation graph inspection and link integrity checks.

use clap::Parser;
use linkguard_cli::commands;
use linkguard_cli::{Cli, Command, Config, Formatter};
use linkguard_domain::RequestContext;
use linkguard_store::SqliteStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, honouring RUST_LOG when set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> linkguard_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let registry = Arc::new(config.relation_types()?);
    if let Command::Types = cli.command {
        return commands::execute_types(&registry, &formatter);
    }

    let mut store = SqliteStore::new(&config.database, registry)?;
    let site_root = cli.site.as_deref().unwrap_or(&config.site_root);
    let mut ctx = RequestContext::new(config.user.as_str(), cli.project(), site_root);
    tracing::debug!(
        "Using {} as {} in project {} under '{}'",
        config.database.display(),
        ctx.user(),
        ctx.project(),
        ctx.site_root()
    );

    match cli.command {
        Command::Types => commands::execute_types(store.registry(), &formatter),
        Command::Relations(args) => commands::execute_relations(args, &store, &ctx, &formatter),
        Command::CheckDelete(args) => {
            commands::execute_check_delete(args, &store, &mut ctx, &config, &formatter)
        }
        Command::CheckPublish(args) => {
            commands::execute_check_publish(args, &store, &mut ctx, &config, &formatter)
        }
        Command::CheckSystem => {
            commands::execute_check_system(&store, &mut ctx, &config, &formatter)
        }
        Command::CheckLinks(args) => commands::execute_check_links(args, &store, &ctx, &formatter),
        Command::AddRelation(args) => {
            commands::execute_add_relation(args, &mut store, &ctx, &formatter)
        }
        Command::Cleanup(args) => commands::execute_cleanup(args, &mut store, &mut ctx, &formatter),
        Command::Import(args) => commands::execute_import(args, &mut store, &formatter),
        Command::Publish(args) => commands::execute_publish(args, &mut store, &ctx, &formatter),
    }
}
