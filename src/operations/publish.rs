//! Publish operation coordination

use super::files::resolve_package_files;
use super::outcome::{PublishOutcome, TaskResult};
use super::push::{AlternateToolPush, DirectCliPush, PushContext, Publisher, push_all};
use super::strategy::{PushStrategy, StrategyInputs, select_strategy};
use super::tools::{locate_alternate_tool, locate_credential_provider, locate_direct_cli};
use crate::auth::{AuthInfo, ExternalAuthInfo, InternalAuthInfo};
use crate::cli::{Args, DEFAULT_CONFIG_PATH};
use crate::config::{AgentEnvironment, Config, PushTool};
use crate::error::PushError;
use crate::feed::location::{ToolVersion, uri_prefixes};
use crate::feed::{FeedSelection, FeedSource, FeedType, SelectedFeed, select_feed};
use crate::nuget_config::compose;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Coordinates the complete publish operation
#[non_exhaustive]
pub struct PublishOperation<'src> {
    config: Config,
    agent: AgentEnvironment,
    dry_run: bool,
    system: &'src dyn System,
}

impl<'src> PublishOperation<'src> {
    /// Create a new publish operation from CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A non-default configuration file is missing
    /// - The configuration file cannot be loaded or parsed
    /// - The merged configuration is invalid
    #[inline]
    pub fn new(args: Args, system: &'src dyn System) -> Result<Self> {
        let config_path = Path::new(&args.config);
        let mut config = if system.exists(config_path).unwrap_or(false) {
            Config::load_from_file(system, &args.config)?
        } else if args.config == DEFAULT_CONFIG_PATH {
            debug!("No configuration file; using command-line inputs only");
            Config::default()
        } else {
            return Err(PushError::configuration(format!(
                "Configuration file not found: {}",
                args.config
            ))
            .into());
        };

        merge_cli_args(&mut config, &args)?;
        config.validate()?;

        Ok(PublishOperation {
            config,
            agent: AgentEnvironment::from_system(system),
            dry_run: args.dry_run,
            system,
        })
    }

    /// Run to completion and map every exit path onto a `TaskResult`
    #[must_use]
    pub fn run(&self) -> TaskResult {
        match self.execute() {
            Ok(outcome) => TaskResult::from_outcome(&outcome),
            Err(err) => TaskResult::from_error(&err, self.agent.identity.as_ref()),
        }
    }

    /// Execute the publish operation
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A matched path is not a regular file
    /// - The feed type is unknown or feed inputs are missing
    /// - The publishing tool cannot be found or fails
    /// - The temporary config cannot be written
    #[inline]
    pub fn execute(&self) -> Result<PublishOutcome> {
        let files = self.resolve_files()?;
        if files.is_empty() {
            info!("No packages matched the search pattern");
            return Ok(PublishOutcome::NoPackagesMatched);
        }
        info!("Found {} package(s) to publish", files.len());

        let feed_type = FeedType::parse(self.config.feed_type.as_deref())?;
        let tool = self.config.tool;

        let credential_provider = self.credential_provider(feed_type, tool);
        let auth = self.build_auth(feed_type, credential_provider.is_some())?;

        let tool_version = match tool {
            PushTool::NuGet => self.agent.tool_version.as_deref().and_then(ToolVersion::parse),
            PushTool::Dotnet => None,
        };

        let selected = match select_feed(feed_type, self.config.feed.as_deref(), &auth, tool_version)? {
            FeedSelection::Selected(selected) => selected,
            FeedSelection::NoSourceSpecified => {
                warn!("No source was specified for push");
                return Ok(PublishOutcome::NoSourceSpecified);
            }
        };

        let choice = select_strategy(&StrategyInputs {
            is_internal: feed_type.is_internal(),
            on_premises: self.agent.on_premises,
            force_direct_cli: self.agent.force_nuget_for_push,
            force_alternate_tool: self.agent.force_vsts_nuget_push,
            allow_conflicts: self.config.allow_package_conflicts,
        });

        if self.config.allow_package_conflicts && self.agent.on_premises {
            warn!("Allowing package conflicts is not supported on on-premises servers");
        }

        if self.dry_run {
            self.preview(&files, &selected, choice.strategy);
            return Ok(PublishOutcome::Previewed { files });
        }

        let publisher = self.build_publisher(choice.strategy, &selected)?;

        // The guard removes the temporary directory when it leaves scope
        let composed = compose(
            self.system,
            &self.agent.temp_directory,
            &self.agent.run_id,
            &selected.source,
            &auth,
        )?;

        let mut env = Vec::new();
        if let Some(folder) = credential_provider.as_ref() {
            env.extend(credential_provider_env(folder, &auth));
        }

        let context = PushContext {
            feed_uri: selected.source.uri.clone(),
            config_file: composed.config_file().map(Path::to_path_buf),
            working_dir: composed.working_directory().map(Path::to_path_buf),
            env,
            verbosity: self.config.effective_verbosity().map(str::to_owned),
        };

        info!(
            "Pushing with {:?} ({})",
            publisher.strategy(),
            publisher.program().display()
        );
        let results = push_all(self.system, &publisher, &files, &context)?;
        info!("Published {} package(s) to {}", results.len(), selected.source.uri);

        Ok(PublishOutcome::Published { results })
    }

    fn resolve_files(&self) -> Result<Vec<PathBuf>> {
        let root = match self.config.root.as_deref() {
            Some(root) => PathBuf::from(root),
            None => self
                .system
                .current_dir()
                .context("Failed to determine the working directory")?,
        };
        let pattern = self.config.search_pattern.as_deref().unwrap_or_default();

        debug!("Searching for '{}' under {}", pattern, root.display());
        resolve_package_files(self.system, &root, pattern)
    }

    /// The credential provider folder, when it is requested and usable
    fn credential_provider(&self, feed_type: FeedType, tool: PushTool) -> Option<PathBuf> {
        if !self.config.use_credential_provider {
            return None;
        }
        if !feed_type.is_internal() || tool != PushTool::NuGet {
            debug!("Credential provider only applies to internal feeds pushed with nuget");
            return None;
        }

        let folder = locate_credential_provider(self.system, &self.agent);
        if folder.is_none() {
            warn!("Credential provider requested but not installed; writing credentials to a temporary config instead");
        }
        folder
    }

    fn build_auth(&self, feed_type: FeedType, use_credential_provider: bool) -> Result<AuthInfo> {
        let uri_prefixes = match self.agent.service_uri.as_deref() {
            Some(service_uri) => match uri_prefixes(service_uri, &self.agent.extra_url_prefixes) {
                Ok(prefixes) => prefixes,
                Err(err) if !feed_type.is_internal() => {
                    debug!("Ignoring service URL for an external push: {err}");
                    Vec::new()
                }
                Err(err) => return Err(err),
            },
            None => Vec::new(),
        };

        let internal = InternalAuthInfo {
            uri_prefixes,
            access_token: self.agent.access_token.clone().unwrap_or_default(),
            use_credential_provider,
            use_credential_config: !use_credential_provider,
        };

        let external = self
            .config
            .external_endpoints
            .iter()
            .map(|endpoint| ExternalAuthInfo {
                source: FeedSource::external(endpoint.name.clone(), endpoint.url.clone()),
                kind: endpoint.auth.clone(),
            })
            .collect();

        Ok(AuthInfo::new(internal, external))
    }

    fn build_publisher(&self, strategy: PushStrategy, selected: &SelectedFeed) -> Result<Publisher> {
        if strategy == PushStrategy::AlternateTool && self.config.tool == PushTool::NuGet {
            if let Some(program) = locate_alternate_tool(self.system, &self.agent) {
                return Ok(Publisher::AlternateTool(AlternateToolPush {
                    program,
                    access_token: self.agent.access_token.clone().unwrap_or_default(),
                    allow_conflicts: self.config.allow_package_conflicts,
                }));
            }
            warn!("The bundled push tool was not found; falling back to nuget push");
        } else if strategy == PushStrategy::AlternateTool {
            debug!("dotnet driver selected; using the direct CLI");
        }

        let program = locate_direct_cli(self.system, &self.agent, self.config.tool)?;
        Ok(Publisher::DirectCli(DirectCliPush {
            program,
            tool: self.config.tool,
            api_key: selected.api_key.clone(),
        }))
    }

    fn preview(&self, files: &[PathBuf], selected: &SelectedFeed, strategy: PushStrategy) {
        info!("DRY RUN - Preview of operations:");
        info!("");
        info!("Feed: {} ({})", selected.source.name, selected.feed_type);
        info!("  URI: {}", selected.source.uri);
        info!("  Publisher: {:?}", strategy);
        info!(
            "  Temporary config: {}",
            self.agent
                .temp_directory
                .join(crate::nuget_config::temp_directory_name(&self.agent.run_id))
                .display()
        );
        info!("");
        for (index, file) in files.iter().enumerate() {
            info!("[{}/{}] Would push {}", index + 1, files.len(), file.display());
        }
    }
}

/// Environment consumed by the credential provider
fn credential_provider_env(folder: &Path, auth: &AuthInfo) -> Vec<(String, String)> {
    vec![
        (
            "NUGET_CREDENTIALPROVIDERS_PATH".to_owned(),
            folder.to_string_lossy().into_owned(),
        ),
        (
            "VSS_NUGET_ACCESSTOKEN".to_owned(),
            auth.internal.access_token.clone(),
        ),
        (
            "VSS_NUGET_URI_PREFIXES".to_owned(),
            auth.internal.uri_prefixes.join(";"),
        ),
        ("VSS_DISABLE_DEFAULTCREDENTIALPROVIDER".to_owned(), "1".to_owned()),
    ]
}

/// Merge CLI arguments over the file configuration; CLI wins
///
/// # Errors
///
/// Returns an error if the external endpoint arguments are malformed
#[inline]
pub fn merge_cli_args(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(pattern) = args.search_pattern.as_ref() {
        config.search_pattern = Some(pattern.clone());
    }
    if let Some(feed_type) = args.feed_type.as_ref() {
        config.feed_type = Some(feed_type.clone());
    }
    if let Some(feed) = args.feed.as_ref() {
        config.feed = Some(feed.clone());
    }
    if let Some(verbosity) = args.verbosity.as_ref() {
        config.verbosity = Some(verbosity.clone());
    }
    if let Some(tool) = args.tool {
        config.tool = tool;
    }
    if let Some(root) = args.root.as_ref() {
        config.root = Some(root.clone());
    }

    config.allow_package_conflicts |= args.allow_package_conflicts;
    config.use_credential_provider |= args.use_credential_provider;

    // Only the first connection is consulted, so a CLI endpoint goes in front
    if let Some(endpoint) = args.external.to_endpoint()? {
        config.external_endpoints.insert(0, endpoint);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;
    use clap::Parser as _;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["feedpush"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_overrides_file() {
        let system = MockSystem::new().with_file(
            "/w/feedpush.yaml",
            b"searchPattern: '*.nupkg'\nfeedType: internal\nfeed: from-file\n",
        );
        let operation = PublishOperation::new(
            args(&["--config", "/w/feedpush.yaml", "--feed", "from-cli"]),
            &system,
        )
        .unwrap();

        assert_eq!(operation.config.feed.as_deref(), Some("from-cli"));
        assert_eq!(operation.config.search_pattern.as_deref(), Some("*.nupkg"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let system = MockSystem::new();
        let result = PublishOperation::new(args(&["--config", "/w/other.yaml"]), &system);
        let err = result.err().unwrap();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_missing_default_config_uses_cli_only() {
        let system = MockSystem::new();
        let operation =
            PublishOperation::new(args(&["--search-pattern", "*.nupkg"]), &system).unwrap();
        assert_eq!(operation.config.search_pattern.as_deref(), Some("*.nupkg"));
    }

    #[test]
    fn test_search_pattern_is_required() {
        let system = MockSystem::new();
        assert!(PublishOperation::new(args(&[]), &system).is_err());
    }

    #[test]
    fn test_cli_endpoint_goes_first() {
        let mut config = Config {
            external_endpoints: vec![crate::config::ExternalEndpoint {
                name: "file".to_owned(),
                url: "https://file.example/".to_owned(),
                auth: crate::auth::ExternalAuthKind::Unknown,
            }],
            ..Config::default()
        };
        merge_cli_args(
            &mut config,
            &args(&["--external-endpoint", "cli=https://cli.example/"]),
        )
        .unwrap();

        assert_eq!(config.external_endpoints.len(), 2);
        assert_eq!(config.external_endpoints[0].name, "cli");
    }

    #[test]
    fn test_credential_provider_env() {
        let auth = AuthInfo::new(
            InternalAuthInfo {
                uri_prefixes: vec!["https://a/".to_owned(), "https://b/".to_owned()],
                access_token: "tok".to_owned(),
                use_credential_provider: true,
                use_credential_config: false,
            },
            Vec::new(),
        );
        let env = credential_provider_env(Path::new("/cp"), &auth);

        assert!(env.contains(&("VSS_NUGET_URI_PREFIXES".to_owned(), "https://a/;https://b/".to_owned())));
        assert!(env.contains(&("NUGET_CREDENTIALPROVIDERS_PATH".to_owned(), "/cp".to_owned())));
    }
}
