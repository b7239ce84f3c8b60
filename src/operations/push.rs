//! Push execution
//!
//! The two publishing tools take different arguments and read exit codes
//! differently; both sit behind `Publisher::push`.

use super::strategy::PushStrategy;
use crate::config::PushTool;
use crate::error::PushError;
use crate::system::{ProcessInvocation, System};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exit code of the bundled push tool when the package version already exists
pub const CONFLICT_EXIT_CODE: i32 = 2;

const SECRET_FLAGS: [&str; 3] = ["-ApiKey", "--api-key", "-AccessToken"];

/// Everything shared by the pushes of one run
#[derive(Debug, Clone, Default)]
pub struct PushContext {
    pub feed_uri: String,
    /// Temporary `nuget.config`, when one was written
    pub config_file: Option<PathBuf>,
    /// Working directory for the tool; inherited when `None`
    pub working_dir: Option<PathBuf>,
    /// Extra environment for the tool
    pub env: Vec<(String, String)>,
    /// Verbosity, already stripped of the unset sentinel
    pub verbosity: Option<String>,
}

/// `nuget push` or `dotnet nuget push`
#[derive(Debug, Clone)]
pub struct DirectCliPush {
    pub program: PathBuf,
    pub tool: PushTool,
    pub api_key: Option<String>,
}

/// The bundled push tool, authenticated with the access token
#[derive(Debug, Clone)]
pub struct AlternateToolPush {
    pub program: PathBuf,
    pub access_token: String,
    pub allow_conflicts: bool,
}

/// The chosen publishing tool
#[derive(Debug, Clone)]
pub enum Publisher {
    DirectCli(DirectCliPush),
    AlternateTool(AlternateToolPush),
}

/// Outcome of one file's push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    pub file: PathBuf,
    pub exit_code: i32,
    /// The package already existed and the conflict was tolerated
    pub conflict_ignored: bool,
}

impl Publisher {
    #[must_use]
    pub const fn strategy(&self) -> PushStrategy {
        match *self {
            Self::DirectCli(_) => PushStrategy::DirectCli,
            Self::AlternateTool(_) => PushStrategy::AlternateTool,
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        match self {
            Self::DirectCli(direct) => &direct.program,
            Self::AlternateTool(alternate) => &alternate.program,
        }
    }

    /// Build the process invocation for `file`
    #[must_use]
    pub fn invocation(&self, file: &Path, context: &PushContext) -> ProcessInvocation {
        let mut invocation = ProcessInvocation::new(self.program());
        let file = file.to_string_lossy().into_owned();

        match self {
            Self::DirectCli(direct) => match direct.tool {
                PushTool::NuGet => {
                    invocation
                        .arg("push")
                        .arg(file)
                        .arg("-NonInteractive")
                        .arg_pair("-Source", context.feed_uri.clone());
                    if let Some(api_key) = direct.api_key.as_ref() {
                        invocation.arg_pair("-ApiKey", api_key.clone());
                    }
                    if let Some(config_file) = context.config_file.as_ref() {
                        invocation.arg_pair("-ConfigFile", config_file.to_string_lossy());
                    }
                    if let Some(verbosity) = context.verbosity.as_ref() {
                        invocation.arg_pair("-Verbosity", verbosity.clone());
                    }
                }
                PushTool::Dotnet => {
                    // `dotnet nuget push` has no config-file or verbosity flag;
                    // it picks up nuget.config from the working directory
                    invocation
                        .arg("nuget")
                        .arg("push")
                        .arg(file)
                        .arg_pair("--source", context.feed_uri.clone());
                    if let Some(api_key) = direct.api_key.as_ref() {
                        invocation.arg_pair("--api-key", api_key.clone());
                    }
                }
            },
            Self::AlternateTool(alternate) => {
                invocation
                    .arg(file)
                    .arg_pair("-Source", context.feed_uri.clone())
                    .arg_pair("-AccessToken", alternate.access_token.clone())
                    .arg("-NonInteractive");
                if context
                    .verbosity
                    .as_deref()
                    .is_some_and(|v| v.eq_ignore_ascii_case("detailed"))
                {
                    invocation.arg_pair("-Verbosity", "Detailed");
                }
            }
        }

        invocation.cwd = context.working_dir.clone();
        invocation.env = context.env.clone();
        invocation
    }

    /// Push one file and interpret the exit code
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started or reports a failure
    /// that is not a tolerated conflict
    pub fn push(&self, system: &dyn System, file: &Path, context: &PushContext) -> Result<PushResult> {
        let invocation = self.invocation(file, context);
        debug!("Running {}", invocation.display_masked(&SECRET_FLAGS));

        let exit_code = system
            .run_process(&invocation)
            .with_context(|| format!("Failed to run {}", invocation.program.display()))?;

        let result = PushResult {
            file: file.to_path_buf(),
            exit_code,
            conflict_ignored: false,
        };

        if exit_code == 0 {
            return Ok(result);
        }

        match self {
            Self::AlternateTool(alternate)
                if exit_code == CONFLICT_EXIT_CODE && alternate.allow_conflicts =>
            {
                info!(
                    "A conflict occurred with package {}, ignoring it since package conflicts are allowed",
                    file.display()
                );
                Ok(PushResult {
                    conflict_ignored: true,
                    ..result
                })
            }
            Self::AlternateTool(_) => Err(PushError::tool(format!(
                "An unexpected error occurred while trying to push {} with the bundled push tool (exit code {exit_code})",
                file.display()
            ))
            .into()),
            Self::DirectCli(_) => Err(PushError::tool(format!(
                "Failed to push {} (exit code {exit_code})",
                file.display()
            ))
            .into()),
        }
    }
}

/// Push `files` in order, stopping at the first failure
///
/// # Errors
///
/// Returns the first push failure; later files are not attempted
pub fn push_all(
    system: &dyn System,
    publisher: &Publisher,
    files: &[PathBuf],
    context: &PushContext,
) -> Result<Vec<PushResult>> {
    let mut results = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        info!("[{}/{}] Pushing {}", index + 1, files.len(), file.display());
        results.push(publisher.push(system, file, context)?);
    }

    Ok(results)
}
