//! Validator configuration

use crate::ValidatorError;
use serde::{Deserialize, Serialize};

/// Configuration for validation runs
///
/// # Examples
///
/// ```
/// use linkguard_validator::ValidatorConfig;
///
/// let config = ValidatorConfig::default();
/// assert!(!config.include_siblings);
/// assert_eq!(config.max_listed_links, 50);
///
/// let config = ValidatorConfig::strict();
/// assert!(config.include_siblings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Expand delete sets with the siblings of their files
    /// Default: false
    #[serde(default)]
    pub include_siblings: bool,

    /// Write every broken link to the report, not only the per-resource warning
    /// Default: true
    #[serde(default = "default_report_broken_links")]
    pub report_broken_links: bool,

    /// Maximum number of broken links written to the report per resource
    /// Default: 50
    #[serde(default = "default_max_listed_links")]
    pub max_listed_links: usize,
}

fn default_report_broken_links() -> bool {
    true
}

fn default_max_listed_links() -> usize {
    50
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            include_siblings: false,
            report_broken_links: default_report_broken_links(),
            max_listed_links: default_max_listed_links(),
        }
    }
}

impl ValidatorConfig {
    /// Strict configuration: siblings included, every broken link reported
    pub fn strict() -> Self {
        Self {
            include_siblings: true,
            report_broken_links: true,
            max_listed_links: usize::MAX,
        }
    }

    /// Lenient configuration: only per-resource warnings, short listings
    pub fn lenient() -> Self {
        Self {
            include_siblings: false,
            report_broken_links: false,
            max_listed_links: 10,
        }
    }

    /// Check the configuration for contradictory settings
    pub fn validate(&self) -> Result<(), ValidatorError> {
        if self.report_broken_links && self.max_listed_links == 0 {
            return Err(ValidatorError::Config(
                "max_listed_links must be at least 1 when report_broken_links is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
