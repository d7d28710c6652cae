//! Output formatting for CLI commands
//!
//! Job results print as JSON or YAML; inventory additionally supports a
//! table view.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::inventory::InventoryRecord;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// Print data in the specified OutputFormat
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Yaml => print_yaml(data),
        OutputFormat::Table => {
            anyhow::bail!("Table format is only available for inventory output")
        }
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", to_json(data)?);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
}

/// Print inventory records as a table
pub fn print_inventory_table(records: &[InventoryRecord]) {
    if records.is_empty() {
        println!("No certificates found");
        return;
    }

    println!();
    println!("{:<40} {:<8} {:<7} {:<6}", "Alias", "Key", "Certs", "Chain");
    println!("{}", "-".repeat(64));
    for record in records {
        println!(
            "{:<40} {:<8} {:<7} {:<6}",
            truncate(&record.alias, 38),
            if record.has_private_key { "yes" } else { "no" },
            record.certificates.len(),
            if record.uses_chain { "yes" } else { "no" },
        );
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
