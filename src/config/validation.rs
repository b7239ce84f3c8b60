//! Configuration validation logic

use crate::auth::ExternalAuthKind;
use crate::config::{Config, ExternalEndpoint};
use crate::error::PushError;
use anyhow::Result;
use regex::Regex;

const VERBOSITY_LEVELS: [&str; 3] = ["quiet", "normal", "detailed"];

/// Validate a complete configuration
///
/// The feed type is deliberately not checked here: an unknown feed type is
/// only an error once at least one package matched.
///
/// # Errors
///
/// Returns an error if:
/// - The search pattern is missing or blank
/// - The verbosity is not one of `-`, `Quiet`, `Normal` or `Detailed`
/// - An external endpoint is malformed
#[inline]
pub fn validate_config(config: &Config) -> Result<()> {
    match config.search_pattern.as_deref() {
        Some(pattern) if !pattern.trim().is_empty() => {}
        _ => {
            return Err(PushError::input(
                "Missing required input: searchPattern. Provide --search-pattern or set it in the configuration file",
            )
            .into());
        }
    }

    if let Some(verbosity) = config.effective_verbosity()
        && !VERBOSITY_LEVELS
            .iter()
            .any(|level| level.eq_ignore_ascii_case(verbosity))
    {
        return Err(PushError::input(format!(
            "Invalid verbosity '{verbosity}'. Must be one of '-', 'Quiet', 'Normal', 'Detailed'"
        ))
        .into());
    }

    for (index, endpoint) in config.external_endpoints.iter().enumerate() {
        validate_endpoint(endpoint, index)?;
    }

    Ok(())
}

/// Validate a single external endpoint
fn validate_endpoint(endpoint: &ExternalEndpoint, index: usize) -> Result<()> {
    let context = format!("External endpoint #{}", index + 1);

    if endpoint.name.trim().is_empty() {
        return Err(PushError::configuration(format!("{context}: name cannot be empty")).into());
    }

    validate_feed_url(&endpoint.url)
        .map_err(|e| PushError::configuration(format!("{context} ('{}'): {e}", endpoint.name)))?;

    let missing = match &endpoint.auth {
        ExternalAuthKind::UsernamePassword { username, password } => {
            if username.is_empty() {
                Some("username")
            } else if password.is_empty() {
                Some("password")
            } else {
                None
            }
        }
        ExternalAuthKind::Token { token } if token.is_empty() => Some("token"),
        ExternalAuthKind::ApiKey { api_key } if api_key.is_empty() => Some("apiKey"),
        _ => None,
    };

    if let Some(field) = missing {
        return Err(PushError::configuration(format!(
            "{context} ('{}'): {field} cannot be empty",
            endpoint.name
        ))
        .into());
    }

    Ok(())
}

/// Validate a feed URL
///
/// # Errors
///
/// Returns an error if the URL is not an absolute `http` or `https` URL
#[inline]
pub fn validate_feed_url(url: &str) -> Result<()> {
    let regex = Regex::new(r"^(?i)https?://[^\s/]+(/\S*)?$")?;
    if regex.is_match(url) {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "Invalid feed URL '{url}'. Expected an http:// or https:// URL"
    ))
}
