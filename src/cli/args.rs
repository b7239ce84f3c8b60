use crate::auth::ExternalAuthKind;
use crate::config::{ExternalEndpoint, PushTool};
use crate::error::PushError;
use clap::Parser;

/// Default configuration file; a missing default file is not an error
pub const DEFAULT_CONFIG_PATH: &str = "./feedpush.yaml";

/// Command-line arguments for feedpush
#[derive(Parser, Debug, Clone)]
#[command(name = "feedpush")]
#[command(about = "Publish NuGet packages to an internal or external feed")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Package files to publish; `;` or newline separated, `!` excludes
    #[arg(long, value_name = "PATTERN")]
    pub search_pattern: Option<String>,

    /// Feed type: internal or external
    #[arg(long, value_name = "TYPE")]
    pub feed_type: Option<String>,

    /// Internal feed identifier, `feed` or `project/feed`
    #[arg(long, value_name = "FEED")]
    pub feed: Option<String>,

    #[command(flatten)]
    pub external: ExternalEndpointArgs,

    /// Verbosity passed to the publishing tool (quiet, normal, detailed)
    #[arg(long, value_name = "LEVEL")]
    pub verbosity: Option<String>,

    /// Treat "package version already exists" as success
    #[arg(long)]
    pub allow_package_conflicts: bool,

    /// Direct CLI driver
    #[arg(long, value_enum, value_name = "TOOL")]
    pub tool: Option<PushTool>,

    /// Authenticate internal feeds through the credential provider
    #[arg(long)]
    pub use_credential_provider: bool,

    /// Root directory for relative search patterns
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Preview operations without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// An external connection declared on the command line
#[derive(Parser, Debug, Clone, Default)]
pub struct ExternalEndpointArgs {
    /// External feed in NAME=URL format
    #[arg(long = "external-endpoint", value_name = "NAME=URL")]
    pub endpoint: Option<String>,

    /// User name for the external feed
    #[arg(
        long = "external-username",
        value_name = "USER",
        env = "FEEDPUSH_EXTERNAL_USERNAME"
    )]
    pub username: Option<String>,

    /// Password for the external feed
    #[arg(
        long = "external-password",
        value_name = "PASSWORD",
        env = "FEEDPUSH_EXTERNAL_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Bearer token for the external feed
    #[arg(
        long = "external-token",
        value_name = "TOKEN",
        env = "FEEDPUSH_EXTERNAL_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// API key for the external feed
    #[arg(
        long = "external-api-key",
        value_name = "KEY",
        env = "FEEDPUSH_EXTERNAL_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,
}

impl ExternalEndpointArgs {
    /// Build the declared connection, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not `NAME=URL` or more than one
    /// authentication kind is given
    pub fn to_endpoint(&self) -> anyhow::Result<Option<ExternalEndpoint>> {
        let Some(raw) = self.endpoint.as_deref() else {
            return Ok(None);
        };
        let (name, url) = parse_key_value(raw)?;

        let kinds = [
            self.username.is_some(),
            self.token.is_some(),
            self.api_key.is_some(),
        ];
        if kinds.iter().filter(|given| **given).count() > 1 {
            return Err(PushError::input(
                "Specify only one of --external-username, --external-token or --external-api-key",
            )
            .into());
        }

        let auth = match (&self.username, &self.token, &self.api_key) {
            (Some(username), _, _) => ExternalAuthKind::UsernamePassword {
                username: username.clone(),
                password: self.password.clone().unwrap_or_default(),
            },
            (_, Some(token), _) => ExternalAuthKind::Token {
                token: token.clone(),
            },
            (_, _, Some(api_key)) => ExternalAuthKind::ApiKey {
                api_key: api_key.clone(),
            },
            _ => ExternalAuthKind::Unknown,
        };

        Ok(Some(ExternalEndpoint { name, url, auth }))
    }
}

/// Parse NAME=VALUE string
fn parse_key_value(arg: &str) -> anyhow::Result<(String, String)> {
    let Some((key, value)) = arg.split_once('=') else {
        return Err(PushError::input(format!(
            "Invalid endpoint format '{arg}'. Expected NAME=URL"
        ))
        .into());
    };
    if key.trim().is_empty() {
        return Err(PushError::input(format!("Endpoint '{arg}' has an empty name")).into());
    }
    return Ok((key.trim().to_owned(), value.trim().to_owned()));
}
