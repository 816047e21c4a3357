//! Config command implementation

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;
use anyhow::{Context, Result};
use chainage_core::config::{ConfigSource, LayeredConfig};
use std::path::Path;
use tabled::Tabled;

pub fn execute(args: ConfigArgs, output: &OutputWriter, config_file: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(output, config_file),
    }
}

/// Print the layered configuration with the source of every value
fn show(output: &OutputWriter, config_file: Option<&Path>) -> Result<()> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_file {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }
    let config = config.load_from_env();

    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry {
            key,
            value,
            source: source_name(source).to_string(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        output.result(entries)?;
    } else {
        output.section("Configuration");

        #[derive(Tabled)]
        struct ConfigRow {
            #[tabled(rename = "Key")]
            key: String,
            #[tabled(rename = "Value")]
            value: String,
            #[tabled(rename = "Source")]
            source: String,
        }

        let rows: Vec<ConfigRow> = entries
            .into_iter()
            .map(|entry| ConfigRow { key: entry.key, value: entry.value, source: entry.source })
            .collect();
        output.table(rows);
    }

    Ok(())
}

/// Human name for a configuration layer
fn source_name(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "environment",
        ConfigSource::Cli => "cli",
    }
}
