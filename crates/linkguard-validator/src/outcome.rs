//! Per-resource outcomes of a validation run

use linkguard_domain::Relation;
use std::collections::BTreeMap;

/// Broken relations keyed by resource
///
/// Keys are root paths, or composite sibling keys for resources that only
/// joined a delete set as siblings (see [`crate::SIBLING_MARKER`]).
pub type BrokenRelations = BTreeMap<String, Vec<Relation>>;

/// What happened to one resource during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOutcome {
    /// Checked; holds the relations that would break, possibly none
    Checked(Vec<Relation>),

    /// Could not be checked; holds the reason
    Skipped(String),
}

impl ResourceOutcome {
    /// Broken relations, empty when skipped
    pub fn broken(&self) -> &[Relation] {
        match self {
            ResourceOutcome::Checked(relations) => relations,
            ResourceOutcome::Skipped(_) => &[],
        }
    }

    /// Whether the resource was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, ResourceOutcome::Skipped(_))
    }
}

/// Outcomes of one validation run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRun {
    outcomes: Vec<(String, ResourceOutcome)>,
}

impl ValidationRun {
    /// Create an empty run
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `key`
    pub fn record(&mut self, key: impl Into<String>, outcome: ResourceOutcome) {
        self.outcomes.push((key.into(), outcome));
    }

    /// All outcomes, in processing order
    pub fn outcomes(&self) -> &[(String, ResourceOutcome)] {
        &self.outcomes
    }

    /// Keys and reasons of skipped resources
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(key, outcome)| match outcome {
            ResourceOutcome::Skipped(reason) => Some((key.as_str(), reason.as_str())),
            ResourceOutcome::Checked(_) => None,
        })
    }

    /// Number of resources checked
    pub fn checked_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| !o.is_skipped()).count()
    }

    /// Number of resources skipped
    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_skipped()).count()
    }

    /// Total number of broken relations
    pub fn broken_link_count(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.broken().len()).sum()
    }

    /// Resources with at least one broken relation
    pub fn broken_relations(&self) -> BrokenRelations {
        let mut broken = BrokenRelations::new();
        for (key, outcome) in &self.outcomes {
            let relations = outcome.broken();
            if !relations.is_empty() {
                broken
                    .entry(key.clone())
                    .or_default()
                    .extend(relations.iter().cloned());
            }
        }
        broken
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let broken = self.broken_relations();
        let mut lines = vec![
            "Link Validation Summary".to_string(),
            "=======================".to_string(),
            format!("Resources checked: {}", self.checked_count()),
            format!("Resources skipped: {}", self.skipped_count()),
            format!("Resources with broken links: {}", broken.len()),
            format!("Broken links: {}", self.broken_link_count()),
        ];
        for (key, reason) in self.skipped() {
            lines.push(format!("  skipped {}: {}", key, reason));
        }
        lines.join("\n")
    }
}
