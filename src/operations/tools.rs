//! Locating the publishing executables and the credential provider

use crate::config::{AgentEnvironment, PushTool};
use crate::error::PushError;
use crate::system::System;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Executable name of the bundled push tool
pub const ALTERNATE_TOOL_NAME: &str = "VstsNuGetPush";

/// Install location of the credential provider below the home directory
const CREDENTIAL_PROVIDER_SUBDIR: &str = ".nuget/plugins/netcore/CredentialProvider.Microsoft";

fn existing_file(system: &dyn System, path: &Path) -> bool {
    system.is_file(path).unwrap_or(false)
}

/// Locate the direct CLI executable for `tool`
///
/// An explicit path from the environment wins over the search path.
///
/// # Errors
///
/// Returns an error if the executable cannot be found
pub fn locate_direct_cli(
    system: &dyn System,
    env: &AgentEnvironment,
    tool: PushTool,
) -> Result<PathBuf> {
    let (explicit, name, variable) = match tool {
        PushTool::NuGet => (env.nuget_path.as_ref(), "nuget", "NUGET_EXE_PATH"),
        PushTool::Dotnet => (env.dotnet_path.as_ref(), "dotnet", "DOTNET_EXE_PATH"),
    };

    if let Some(path) = explicit {
        if existing_file(system, path) {
            return Ok(path.clone());
        }
        return Err(PushError::configuration(format!(
            "{variable} points to {}, which is not a file",
            path.display()
        ))
        .into());
    }

    system.which(name).ok_or_else(|| {
        PushError::configuration(format!(
            "Could not locate '{name}'. Install it or set {variable}"
        ))
        .into()
    })
}

/// Locate the bundled push tool; `None` when it is not available
#[must_use]
pub fn locate_alternate_tool(system: &dyn System, env: &AgentEnvironment) -> Option<PathBuf> {
    if let Some(path) = env.vsts_nuget_push_path.as_ref() {
        if existing_file(system, path) {
            return Some(path.clone());
        }
        warn!(
            "VSTS_NUGET_PUSH_PATH points to {}, which is not a file",
            path.display()
        );
        return None;
    }

    system.which(ALTERNATE_TOOL_NAME)
}

/// Locate the credential provider folder
#[must_use]
pub fn locate_credential_provider(system: &dyn System, env: &AgentEnvironment) -> Option<PathBuf> {
    let candidate = env
        .credential_provider_folder
        .clone()
        .or_else(|| system.home_dir().map(|home| home.join(CREDENTIAL_PROVIDER_SUBDIR)))?;

    if system.is_dir(&candidate).unwrap_or(false) {
        debug!("Credential provider found at {}", candidate.display());
        Some(candidate)
    } else {
        debug!("No credential provider at {}", candidate.display());
        None
    }
}
