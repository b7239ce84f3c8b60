//! YAML configuration loading and parsing

use crate::config::Config;
use crate::error::PushError;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Load and parse YAML configuration from file
pub fn load_config(system: &dyn System, path: &str) -> Result<Config> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj)? {
        return Err(PushError::configuration(format!(
            "Configuration file not found: {path}\n\
            Create a feedpush.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read configuration file: {path}"))?;

    parse_config(&content).with_context(|| format!("Invalid configuration file: {path}"))
}

/// Parse YAML text, validate it against the schema, and deserialize it
pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    // Schema validation runs on the raw document so unknown keys are reported
    let raw: serde_json::Value = serde_yaml::from_str(content).context(
        "Failed to parse YAML configuration\n\
        Please check the syntax and structure of your configuration file",
    )?;
    let raw = if raw.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        raw
    };

    crate::config::schema::validate_against_schema(&raw)?;

    let config: Config =
        serde_json::from_value(raw).context("Failed to read configuration values")?;

    Ok(config)
}
