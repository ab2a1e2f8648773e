//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to raw JSON.

use serde_json::Value;

use crate::response::Response;
use crate::serializer::{Document, ResourceLinkage, ResourceObject};
use crate::store::Record;

/// Trait for human-readable key-value output.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Record {
    fn pretty_print(&self) -> String {
        let header = format!("{} {}", self.model, self.id);
        let mut lines = vec![header.clone(), "─".repeat(header.len().max(30))];

        for (name, value) in &self.attributes {
            lines.push(format!("{:<15} {}", format!("{name}:"), display_value(value)));
        }
        for (name, linkage) in &self.relationships {
            let ids = linkage.ids();
            let shown = if ids.is_empty() {
                "-".to_string()
            } else {
                ids.join(", ")
            };
            lines.push(format!("{:<15} → {}", format!("{name}:"), shown));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for ResourceObject {
    fn pretty_print(&self) -> String {
        let mut lines = vec![format!("{} {}", self.type_name, self.id)];
        for (name, value) in &self.attributes {
            lines.push(format!("  {:<13} {}", format!("{name}:"), display_value(value)));
        }
        if let Some(relationships) = &self.relationships {
            for (name, relationship) in relationships {
                lines.push(format!("  {:<13} → {}", format!("{name}:"), linkage_ids(&relationship.data)));
            }
        }
        lines.join("\n")
    }
}

impl PrettyPrint for Document {
    fn pretty_print(&self) -> String {
        let resources = self.resources();
        let mut sections: Vec<String> = resources.iter().map(|r| r.pretty_print()).collect();
        if resources.is_empty() {
            sections.push("(no data)".to_string());
        }
        if !self.included().is_empty() {
            sections.push(format!("Included ({})", self.included().len()));
            sections.extend(self.included().iter().map(|r| r.pretty_print()));
        }
        sections.join("\n")
    }
}

impl PrettyPrint for Response {
    /// Status line, then the body: JSON:API documents as resources, other JSON
    /// pretty-printed, anything else verbatim.
    fn pretty_print(&self) -> String {
        let status = self.status();
        let mut lines = vec![format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )];
        if let Some(content_type) = self.content_type() {
            lines.push(format!("Content-Type:  {content_type}"));
        }

        let body = String::from_utf8_lossy(self.body());
        if !body.is_empty() {
            lines.push(String::new());
            let rendered = match serde_json::from_str::<Value>(&body) {
                Ok(value) if value.get("data").is_some() => serde_json::from_value::<Document>(value.clone())
                    .map(|doc| doc.pretty_print())
                    .unwrap_or_else(|_| pretty_json(&value)),
                Ok(value) => pretty_json(&value),
                Err(_) => body.into_owned(),
            };
            lines.push(rendered);
        }
        lines.join("\n")
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn linkage_ids(linkage: &ResourceLinkage) -> String {
    let ids: Vec<&str> = match linkage {
        ResourceLinkage::Many(items) => items.iter().map(|i| i.id.as_str()).collect(),
        ResourceLinkage::One(item) => item.iter().map(|i| i.id.as_str()).collect(),
    };
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
