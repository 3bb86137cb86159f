//! Streaming reports of a validation run
//!
//! A report is a side channel: the validator writes to it as it goes, and a
//! run without a report produces exactly the same result.

use linkguard_domain::{Project, Relation};

/// Receiver of validation progress lines
pub trait ValidationReport {
    /// The run starts checking `total` resources against `project`
    fn start(&mut self, total: usize, project: Project);

    /// Resource `index` (1-based) of `total` is being checked
    fn resource(&mut self, index: usize, total: usize, root_path: &str);

    /// The first broken link of the current resource was found
    fn broken_links_found(&mut self, root_path: &str);

    /// One broken link of the current resource
    ///
    /// `incoming` is set when the link points at the resource from outside.
    fn broken_link(&mut self, relation: &Relation, incoming: bool);

    /// The current resource has no broken links
    fn resource_ok(&mut self);

    /// The current resource could not be checked
    fn resource_skipped(&mut self, reason: &str);

    /// The run finished
    fn finish(&mut self, checked: usize, broken_resources: usize, broken_links: usize);
}

/// Report collecting human-readable lines
#[derive(Debug, Clone, Default)]
pub struct TextReport {
    lines: Vec<String>,
}

impl TextReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Collected lines joined by newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl ValidationReport for TextReport {
    fn start(&mut self, total: usize, project: Project) {
        self.lines
            .push(format!(
                "Validating links of {} resources against the {} project",
                total, project
            ));
    }

    fn resource(&mut self, index: usize, total: usize, root_path: &str) {
        self.lines.push(format!("({}/{}) Checking {}", index, total, root_path));
    }

    fn broken_links_found(&mut self, root_path: &str) {
        self.lines.push(format!("  Broken links found in {}:", root_path));
    }

    fn broken_link(&mut self, relation: &Relation, incoming: bool) {
        if incoming {
            self.lines.push(format!(
                "    Linked from {} ({})",
                relation.source_path(),
                relation.relation_type()
            ));
        } else {
            self.lines.push(format!(
                "    Link to {} ({})",
                relation.target_path(),
                relation.relation_type()
            ));
        }
    }

    fn resource_ok(&mut self) {
        self.lines.push("  Ok".to_string());
    }

    fn resource_skipped(&mut self, reason: &str) {
        self.lines.push(format!("  Skipped: {}", reason));
    }

    fn finish(&mut self, checked: usize, broken_resources: usize, broken_links: usize) {
        if broken_resources == 0 {
            self.lines
                .push(format!("No broken links found in {} resources", checked));
        } else {
            self.lines.push(format!(
                "{} broken links found in {} of {} resources",
                broken_links, broken_resources, checked
            ));
        }
    }
}

/// Report forwarding every line to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReport;

impl ValidationReport for TracingReport {
    fn start(&mut self, total: usize, project: Project) {
        tracing::info!("Validating links of {} resources against the {} project", total, project);
    }

    fn resource(&mut self, index: usize, total: usize, root_path: &str) {
        tracing::debug!("({}/{}) Checking {}", index, total, root_path);
    }

    fn broken_links_found(&mut self, root_path: &str) {
        tracing::warn!("Broken links found in {}", root_path);
    }

    fn broken_link(&mut self, relation: &Relation, incoming: bool) {
        if incoming {
            tracing::warn!(
                "  Linked from {} ({})",
                relation.source_path(),
                relation.relation_type()
            );
        } else {
            tracing::warn!("  Link to {} ({})", relation.target_path(), relation.relation_type());
        }
    }

    fn resource_ok(&mut self) {}

    fn resource_skipped(&mut self, reason: &str) {
        tracing::warn!("Skipped: {}", reason);
    }

    fn finish(&mut self, checked: usize, broken_resources: usize, broken_links: usize) {
        tracing::info!(
            "Link validation finished: {} resources checked, {} with {} broken links",
            checked,
            broken_resources,
            broken_links
        );
    }
}
