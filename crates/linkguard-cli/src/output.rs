//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use linkguard_domain::{Relation, RelationType};
use linkguard_validator::{InfoEntry, ValidationRun};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format relation types.
    pub fn format_relation_types(&self, types: &[RelationType]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = types
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "id": t.id(),
                            "name": t.name(),
                            "xml_name": t.name_for_xml(),
                            "strong": t.is_strong(),
                            "defined_in_content": t.is_defined_in_content(),
                            "user_defined": t.is_user_defined(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => {
                Ok(types.iter().map(|t| t.name()).collect::<Vec<_>>().join("\n"))
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "XML Name", "Strength", "In Content", "Kind"]);
                for t in types {
                    builder.push_record([
                        t.id().to_string(),
                        t.name().to_string(),
                        t.name_for_xml().to_string(),
                        if t.is_strong() { "strong" } else { "weak" }.to_string(),
                        yes_no(t.is_defined_in_content()).to_string(),
                        if t.is_user_defined() { "user" } else { "system" }.to_string(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format relations.
    pub fn format_relations(&self, relations: &[Relation]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = relations.iter().map(relation_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => {
                Ok(relations.iter().map(Relation::to_string).collect::<Vec<_>>().join("\n"))
            }
            OutputFormat::Table => {
                if relations.is_empty() {
                    return Ok(self.colorize("No relations found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Source", "Type", "Target"]);
                for relation in relations {
                    builder.push_record([
                        relation.source_path(),
                        relation.relation_type().name(),
                        relation.target_path(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format the broken relations of a validation, one entry per affected resource.
    pub fn format_broken(&self, entries: &[InfoEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "entry": e.entry_name,
                            "resource": e.resource_name,
                            "site": e.site_name,
                            "site_root": e.site_root,
                            "sibling": e.is_sibling(),
                            "relations": e.relations.iter().map(relation_json).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(entries
                .iter()
                .map(|e| e.entry_name.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if entries.is_empty() {
                    return Ok(self.success("No links would be broken"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Resource", "Site", "Source", "Type", "Target"]);
                for entry in entries {
                    let resource = if entry.is_sibling() {
                        format!("{} (sibling)", entry.resource_name)
                    } else {
                        entry.resource_name.clone()
                    };
                    for relation in &entry.relations {
                        builder.push_record([
                            resource.as_str(),
                            entry.site_name.as_str(),
                            relation.source_path(),
                            relation.relation_type().name(),
                            relation.target_path(),
                        ]);
                    }
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format the dangling links found by the internal links check.
    pub fn format_dangling(
        &self,
        resources: &[(String, Vec<Relation>)],
        hidden: usize,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "resources": resources
                        .iter()
                        .map(|(path, relations)| serde_json::json!({
                            "resource": path,
                            "relations": relations.iter().map(relation_json).collect::<Vec<_>>(),
                        }))
                        .collect::<Vec<_>>(),
                    "not_visible": hidden,
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(resources
                .iter()
                .map(|(path, _)| path.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                if resources.is_empty() {
                    lines.push(self.success("No dangling links found"));
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(["Resource", "Type", "Missing Target"]);
                    for (path, relations) in resources {
                        for relation in relations {
                            builder.push_record([
                                path.as_str(),
                                relation.relation_type().name(),
                                relation.target_path(),
                            ]);
                        }
                    }
                    lines.push(self.table(builder));
                }
                if hidden > 0 {
                    lines.push(self.warning(&format!(
                        "{} further resource(s) affected but not shown",
                        hidden
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format the summary of a validation run.
    pub fn format_run(&self, run: &ValidationRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let skipped: Vec<serde_json::Value> = run
                    .skipped()
                    .map(|(path, reason)| serde_json::json!({ "resource": path, "reason": reason }))
                    .collect();
                let json = serde_json::json!({
                    "checked": run.checked_count(),
                    "skipped": skipped,
                    "broken_resources": run.broken_relations().len(),
                    "broken_links": run.broken_link_count(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => {
                Ok(run.broken_relations().keys().cloned().collect::<Vec<_>>().join("\n"))
            }
            OutputFormat::Table => {
                let summary = run.summary();
                if run.broken_link_count() == 0 {
                    Ok(self.success(&summary))
                } else {
                    Ok(self.warning(&summary))
                }
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn relation_json(relation: &Relation) -> serde_json::Value {
    serde_json::json!({
        "source_id": relation.source_id().to_string(),
        "source": relation.source_path(),
        "target_id": relation.target_id().to_string(),
        "target": relation.target_path(),
        "type": relation.relation_type().name(),
    })
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
