//! Build-agent environment
//!
//! Every pipeline variable the task depends on is read here, once, into an
//! explicit struct. Nothing below this layer touches the environment.

use crate::system::System;
use std::path::PathBuf;
use tracing::debug;

pub const BUILD_ID: &str = "BUILD_BUILDID";
pub const SERVICE_URI: &str = "SYSTEM_TEAMFOUNDATIONCOLLECTIONURI";
pub const ACCESS_TOKEN: &str = "SYSTEM_ACCESSTOKEN";
pub const SERVER_TYPE: &str = "SYSTEM_SERVERTYPE";
pub const HOSTED_TEST_ENVIRONMENT: &str = "NUGETTASKS_ISHOSTEDTESTENVIRONMENT";
pub const FORCE_NUGET_FOR_PUSH: &str = "NUGET_FORCENUGETFORPUSH";
pub const FORCE_VSTS_NUGET_PUSH_FOR_PUSH: &str = "NUGET_FORCEVSTSNUGETPUSHFORPUSH";
pub const EXTRA_URL_PREFIXES: &str = "NUGETTASKS_EXTRAURLPREFIXESFORTESTING";
pub const AGENT_TEMP_DIRECTORY: &str = "AGENT_TEMPDIRECTORY";
pub const NUGET_EXE_PATH: &str = "NUGET_EXE_PATH";
pub const DOTNET_EXE_PATH: &str = "DOTNET_EXE_PATH";
pub const VSTS_NUGET_PUSH_PATH: &str = "VSTS_NUGET_PUSH_PATH";
pub const NUGET_TOOL_VERSION: &str = "NUGET_TOOL_VERSION";
pub const CREDENTIAL_PROVIDER_FOLDER: &str = "NUGET_CREDENTIALPROVIDER_FOLDER";
pub const IDENTITY_DISPLAY_NAME: &str = "BUILD_IDENTITY_DISPLAYNAME";
pub const IDENTITY_ACCOUNT: &str = "BUILD_IDENTITY_ACCOUNT";

/// The identity the build runs as, used for the permission hint on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    pub display_name: Option<String>,
    pub account: Option<String>,
}

/// Snapshot of the build-agent variables relevant to publishing
#[derive(Debug, Clone)]
pub struct AgentEnvironment {
    /// Run-unique identifier; namespaces the temporary config directory
    pub run_id: String,
    /// Collection URL of the build service
    pub service_uri: Option<String>,
    pub access_token: Option<String>,
    pub on_premises: bool,
    /// `NUGET_FORCENUGETFORPUSH`, when set to `true` or `false`
    pub force_nuget_for_push: Option<bool>,
    /// `NUGET_FORCEVSTSNUGETPUSHFORPUSH`, when set to `true` or `false`
    pub force_vsts_nuget_push: Option<bool>,
    pub extra_url_prefixes: Vec<String>,
    /// Base directory for the temporary config directory
    pub temp_directory: PathBuf,
    pub nuget_path: Option<PathBuf>,
    pub dotnet_path: Option<PathBuf>,
    pub vsts_nuget_push_path: Option<PathBuf>,
    /// Version of the direct CLI tool, e.g. `4.9.3`
    pub tool_version: Option<String>,
    pub credential_provider_folder: Option<PathBuf>,
    pub identity: Option<BuildIdentity>,
}

impl AgentEnvironment {
    /// Read the agent environment through the system abstraction
    #[must_use]
    pub fn from_system(system: &dyn System) -> Self {
        let var = |key: &str| {
            system
                .env_var(key)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let run_id = var(BUILD_ID).unwrap_or_else(|| format!("local_{}", std::process::id()));

        let on_premises = if var(HOSTED_TEST_ENVIRONMENT).is_some_and(|v| v == "true") {
            false
        } else {
            !var(SERVER_TYPE).is_some_and(|v| v.eq_ignore_ascii_case("hosted"))
        };

        let extra_url_prefixes = var(EXTRA_URL_PREFIXES)
            .map(|v| {
                v.split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let display_name = var(IDENTITY_DISPLAY_NAME);
        let account = var(IDENTITY_ACCOUNT);
        let identity = (display_name.is_some() || account.is_some()).then(|| BuildIdentity {
            display_name,
            account,
        });

        let environment = Self {
            run_id,
            service_uri: var(SERVICE_URI),
            access_token: var(ACCESS_TOKEN),
            on_premises,
            force_nuget_for_push: parse_flag(var(FORCE_NUGET_FOR_PUSH)),
            force_vsts_nuget_push: parse_flag(var(FORCE_VSTS_NUGET_PUSH_FOR_PUSH)),
            extra_url_prefixes,
            temp_directory: var(AGENT_TEMP_DIRECTORY)
                .map_or_else(|| system.temp_dir(), PathBuf::from),
            nuget_path: var(NUGET_EXE_PATH).map(PathBuf::from),
            dotnet_path: var(DOTNET_EXE_PATH).map(PathBuf::from),
            vsts_nuget_push_path: var(VSTS_NUGET_PUSH_PATH).map(PathBuf::from),
            tool_version: var(NUGET_TOOL_VERSION),
            credential_provider_folder: var(CREDENTIAL_PROVIDER_FOLDER).map(PathBuf::from),
            identity,
        };

        debug!(
            "Agent environment: run id {}, on-premises {}, service {:?}",
            environment.run_id, environment.on_premises, environment.service_uri
        );

        environment
    }
}

/// Only the exact strings `true` and `false` count; anything else is "no override"
fn parse_flag(value: Option<String>) -> Option<bool> {
    match value.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}
