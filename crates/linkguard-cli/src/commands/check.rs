//! Link check command implementations.

use super::read_existing;
use crate::cli::{CheckDeleteArgs, NamesArgs};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use linkguard_domain::{PublishList, RelationStore, RequestContext, ResourceFilter, SiteRegistry};
use linkguard_store::SqliteStore;
use linkguard_validator::{
    DeleteValidator, InfoEntry, InternalLinksValidator, RelationValidator, SystemValidator,
    TextReport, ValidationRun,
};

/// Execute the check-delete command.
pub fn execute_check_delete(
    args: CheckDeleteArgs,
    store: &SqliteStore,
    ctx: &mut RequestContext,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let include_siblings = args.siblings || config.validation.include_siblings;
    let validator = DeleteValidator::new(store, ctx, &args.names, include_siblings);

    let entries = info_entries(&validator, &config.site_registry());
    println!("{}", formatter.format_broken(&entries)?);
    if formatter.format() == OutputFormat::Table {
        println!("{}", formatter.format_run(validator.run())?);
    }
    Ok(())
}

/// Execute the check-publish command.
pub fn execute_check_publish(
    args: NamesArgs,
    store: &SqliteStore,
    ctx: &mut RequestContext,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let publish_list = collect_publish_list(store, ctx, &args.names)?;
    tracing::info!("Checking the publish of {} resources", publish_list.len());
    run_system_check(store, ctx, Some(&publish_list), config, formatter)
}

/// Execute the check-system command.
pub fn execute_check_system(
    store: &SqliteStore,
    ctx: &mut RequestContext,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    run_system_check(store, ctx, None, config, formatter)
}

/// Execute the check-links command.
pub fn execute_check_links(
    args: NamesArgs,
    store: &SqliteStore,
    ctx: &RequestContext,
    formatter: &Formatter,
) -> Result<()> {
    let validator = InternalLinksValidator::new(store, ctx, &args.names);
    let resources: Vec<_> = validator
        .resources_with_broken_links()
        .iter()
        .map(|path| (path.clone(), validator.broken_links_for_resource(path).to_vec()))
        .collect();
    println!(
        "{}",
        formatter.format_dangling(&resources, validator.not_visible_resources_count())?
    );
    Ok(())
}

fn run_system_check(
    store: &SqliteStore,
    ctx: &mut RequestContext,
    publish_list: Option<&PublishList>,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let mut report = TextReport::new();
    let run = SystemValidator::new(config.validation.clone()).validate_resources(
        store,
        ctx,
        publish_list,
        Some(&mut report),
        None,
    )?;
    for line in report.lines() {
        tracing::debug!("{}", line);
    }

    let entries = run_entries(&run, &config.site_registry());
    println!("{}", formatter.format_broken(&entries)?);
    if formatter.format() == OutputFormat::Table {
        println!("{}", formatter.format_run(&run)?);
    }
    Ok(())
}

/// Offline resources named for publishing, with the changed contents of folders.
fn collect_publish_list(
    store: &SqliteStore,
    ctx: &RequestContext,
    names: &[String],
) -> Result<PublishList> {
    let mut publish_list = PublishList::default();
    for name in names {
        let resource = read_existing(store, ctx, name)?;
        if resource.is_folder() {
            for child in store.read_resources(ctx, name, &ResourceFilter::ALL, true)? {
                if !child.state.is_unchanged() && !publish_list.contains_path(&child.root_path) {
                    publish_list.push(child);
                }
            }
        }
        if !publish_list.contains_path(&resource.root_path) {
            publish_list.push(resource);
        }
    }
    Ok(publish_list)
}

fn info_entries(validator: &impl RelationValidator, sites: &SiteRegistry) -> Vec<InfoEntry> {
    validator
        .key_set()
        .into_iter()
        .filter_map(|key| validator.info_entry(key, sites))
        .collect()
}

fn run_entries(run: &ValidationRun, sites: &SiteRegistry) -> Vec<InfoEntry> {
    run.broken_relations()
        .into_iter()
        .map(|(key, relations)| InfoEntry::new(&key, relations, sites))
        .collect()
}
