//! Configuration management module
//!
//! Handles YAML configuration parsing, JSON schema validation, merging of
//! command-line overrides and the build-agent environment

pub mod agent;
pub mod schema;
pub mod validation;
pub mod yaml;

pub use agent::{AgentEnvironment, BuildIdentity};

use crate::auth::ExternalAuthKind;
use crate::system::System;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Executable family used for the direct CLI push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PushTool {
    /// `nuget push`
    #[default]
    #[value(name = "nuget")]
    NuGet,
    /// `dotnet nuget push`
    Dotnet,
}

/// An externally hosted feed and the credentials used to reach it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEndpoint {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub auth: ExternalAuthKind,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Search pattern for the package files to publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_pattern: Option<String>,

    /// `internal` or `external` (case-insensitive); `internal` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_type: Option<String>,

    /// Internal feed identifier, `feed` or `project/feed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,

    /// Declared external connections; only the first one is used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_endpoints: Vec<ExternalEndpoint>,

    /// Verbosity passed to the publishing tool; `-` means unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,

    /// Treat "package already exists" as success (alternate tool only)
    #[serde(default)]
    pub allow_package_conflicts: bool,

    #[serde(default)]
    pub tool: PushTool,

    /// Authenticate internal feeds through the credential provider
    #[serde(default)]
    pub use_credential_provider: bool,

    /// Root for relative search patterns; the working directory when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(system: &dyn System, path: &str) -> anyhow::Result<Self> {
        yaml::load_config(system, path)
    }

    /// Validate the merged configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        validation::validate_config(self)
    }

    /// The verbosity to forward, or `None` when unset
    #[must_use]
    pub fn effective_verbosity(&self) -> Option<&str> {
        self.verbosity
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "-")
    }
}
