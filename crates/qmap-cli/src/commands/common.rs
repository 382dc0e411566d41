//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Input formats understood by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => anyhow::bail!(
                "Unsupported file extension '{other}' for {}: expected json, yaml or yml",
                path.display()
            ),
        }
    }
}

/// Load a JSON or YAML file, chosen by extension.
pub fn load<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let format = Format::of(path)?;
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file: {}", path.display()))?;

    match format {
        Format::Json => serde_json::from_str(&source)
            .with_context(|| format!("Invalid {what} in {}", path.display())),
        Format::Yaml => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Invalid {what} in {}", path.display())),
    }
}

/// Write `value` as pretty JSON to `output`, or to stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write file: {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
