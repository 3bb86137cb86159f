//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use linkguard_domain::{FilterMode, Project};
use std::path::PathBuf;

/// Linkguard CLI - Inspect the relation graph of a resource tree and check link integrity.
#[derive(Debug, Parser)]
#[command(name = "linkguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LINKGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site root that overrides the configured one
    #[arg(short, long, global = true)]
    pub site: Option<String>,

    /// Work on the online project instead of the offline one
    #[arg(long, global = true)]
    pub online: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (paths only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the relation types
    Types,

    /// Show the relations of a resource
    Relations(RelationsArgs),

    /// Check which links would break if resources were deleted
    CheckDelete(CheckDeleteArgs),

    /// Check which links would break online if resources were published
    CheckPublish(NamesArgs),

    /// Check the links of every link-parseable resource
    CheckSystem,

    /// Find links of resources that point at nothing
    CheckLinks(NamesArgs),

    /// Add a relation of a type that is not defined in content
    AddRelation(AddRelationArgs),

    /// Remove relations not defined in content from resources about to be deleted
    Cleanup(CleanupArgs),

    /// Load resource types, resources and relations from a JSON file
    Import(ImportArgs),

    /// Publish offline resources to the online project
    Publish(NamesArgs),
}

/// Arguments naming resources.
#[derive(Debug, Parser)]
pub struct NamesArgs {
    /// Resource or folder paths, relative to the site
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Arguments for the relations command.
#[derive(Debug, Parser)]
pub struct RelationsArgs {
    /// Resource path, relative to the site
    pub path: String,

    /// Which relations to show
    #[arg(short, long, value_enum, default_value = "all")]
    pub direction: DirectionArg,

    /// Restrict to relation types (repeatable)
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,

    /// Restrict the other end to this path
    #[arg(long)]
    pub other: Option<String>,

    /// Match the other end's path as a prefix
    #[arg(long, requires = "other")]
    pub children: bool,
}

/// Arguments for the check-delete command.
#[derive(Debug, Parser)]
pub struct CheckDeleteArgs {
    /// Resource or folder paths, relative to the site
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Also check the siblings of the resources
    #[arg(long)]
    pub siblings: bool,
}

/// Arguments for the add-relation command.
#[derive(Debug, Parser)]
pub struct AddRelationArgs {
    /// Source path, relative to the site
    pub source: String,

    /// Target path, relative to the site
    pub target: String,

    /// Relation type name
    pub relation_type: String,
}

/// Arguments for the cleanup command.
#[derive(Debug, Parser)]
pub struct CleanupArgs {
    /// Resource or folder paths, relative to the site
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file to import
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Read the JSON document from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Direction argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DirectionArg {
    /// Relations pointing at the resource
    Sources,
    /// Relations starting at the resource
    Targets,
    /// Both
    All,
}

impl Cli {
    /// Project selected by the flags.
    pub fn project(&self) -> Project {
        if self.online {
            Project::Online
        } else {
            Project::Offline
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<DirectionArg> for FilterMode {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Sources => FilterMode::Sources,
            DirectionArg::Targets => FilterMode::Targets,
            DirectionArg::All => FilterMode::All,
        }
    }
}
