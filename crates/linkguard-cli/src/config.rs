//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use linkguard_domain::{RelationTypeRegistry, SiteRegistry};
use linkguard_validator::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite database
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// User the requests are made for
    #[serde(default = "default_user")]
    pub user: String,

    /// Site root that site paths are resolved against
    #[serde(default)]
    pub site_root: String,

    /// User-defined relation types, registered at startup
    #[serde(default)]
    pub relation_types: Vec<RelationTypeConfig>,

    /// Known sites, used to present results
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Link validation settings
    #[serde(default)]
    pub validation: ValidatorConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// A user-defined relation type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationTypeConfig {
    /// Type name
    pub name: String,

    /// `strong` or `weak`
    #[serde(default = "default_strength")]
    pub strength: String,
}

/// A site of the resource tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root path of the site
    pub root: String,

    /// Display title
    pub title: String,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".linkguard").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicitly given file must exist; a missing default file yields
    /// the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::path()?, false),
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validation.validate()?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else if explicit {
            Err(CliError::Config(format!("Config file {} does not exist", path.display())))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Build the relation type registry, frozen after the configured types.
    pub fn relation_types(&self) -> Result<RelationTypeRegistry> {
        let mut registry = RelationTypeRegistry::new();
        for relation_type in &self.relation_types {
            registry.add_user_defined_with_strength(&relation_type.name, &relation_type.strength)?;
        }
        registry.freeze();
        Ok(registry)
    }

    /// Build the site registry.
    pub fn site_registry(&self) -> SiteRegistry {
        let mut sites = SiteRegistry::new();
        for site in &self.sites {
            sites.add(&site.root, site.title.clone());
        }
        sites
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            user: default_user(),
            site_root: String::new(),
            relation_types: Vec::new(),
            sites: Vec::new(),
            validation: ValidatorConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("linkguard.db")
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_strength() -> String {
    "weak".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
