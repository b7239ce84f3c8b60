//! Internal feed registry lookup
//!
//! Derives the packaging URL prefixes of an organization from its service
//! URL and builds the registry URL for an internal feed.

use crate::error::PushError;
use anyhow::Result;
use regex::Regex;
use tracing::debug;

/// Version of the direct CLI tool, as far as the registry URL cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolVersion {
    /// Parse the leading `major.minor` of a version string such as `4.9.3.5777`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let regex = Regex::new(r"^\s*v?(\d+)\.(\d+)").ok()?;
        let captures = regex.captures(value)?;
        Some(Self {
            major: captures.get(1)?.as_str().parse().ok()?,
            minor: captures.get(2)?.as_str().parse().ok()?,
        })
    }

    /// Tools before 3.5 cannot talk to v3 registries
    #[must_use]
    pub fn supports_v3(self) -> bool {
        self >= Self { major: 3, minor: 5 }
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_owned()
    } else {
        format!("{url}/")
    }
}

/// URL prefixes identifying the organization's feeds
///
/// The service URL itself comes first, followed by its packaging host when
/// one can be derived, followed by `extra` prefixes.
///
/// # Errors
///
/// Returns an error if a pattern fails to compile
pub fn uri_prefixes(service_uri: &str, extra: &[String]) -> Result<Vec<String>> {
    let service = with_trailing_slash(service_uri.trim());
    let mut prefixes = vec![service.clone()];

    let hosted = Regex::new(r"(?i)^https://([a-z0-9-]+)\.visualstudio\.com/")?;
    let azure = Regex::new(r"(?i)^https://dev\.azure\.com/([^/]+)/")?;

    if let Some(captures) = hosted.captures(&service) {
        prefixes.push(format!("https://{}.pkgs.visualstudio.com/", &captures[1]));
    } else if let Some(captures) = azure.captures(&service) {
        prefixes.push(format!("https://pkgs.dev.azure.com/{}/", &captures[1]));
    }

    for prefix in extra {
        let prefix = with_trailing_slash(prefix.trim());
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    debug!("discovered URL prefixes: {:?}", prefixes);
    Ok(prefixes)
}

/// Whether `prefix` points at a packaging host
fn is_packaging_host(prefix: &str) -> bool {
    let lower = prefix.to_ascii_lowercase();
    lower.contains(".pkgs.visualstudio.com/") || lower.starts_with("https://pkgs.dev.azure.com/")
}

/// Registry URL of an internal feed
///
/// `feed_id` may be `feed` or `project/feed`. The v2 endpoint is used only
/// when the tool version is known to predate v3 support.
///
/// # Errors
///
/// Returns an error if the feed identifier is empty or malformed
pub fn feed_registry_url(
    prefixes: &[String],
    feed_id: &str,
    tool_version: Option<ToolVersion>,
) -> Result<String> {
    let feed_id = feed_id.trim().trim_matches('/');
    let (project, feed) = match feed_id.split_once('/') {
        Some((project, feed)) => (Some(project), feed),
        None => (None, feed_id),
    };

    if feed.is_empty() || feed.contains('/') || project.is_some_and(str::is_empty) {
        return Err(PushError::input(format!(
            "Invalid feed identifier '{feed_id}'. Expected 'feed' or 'project/feed'"
        ))
        .into());
    }

    let base = prefixes
        .iter()
        .find(|p| is_packaging_host(p))
        .or_else(|| prefixes.first())
        .ok_or_else(|| PushError::configuration("No registry URL prefixes are known"))?;

    let mut url = with_trailing_slash(base);
    if let Some(project) = project {
        url.push_str(project);
        url.push('/');
    }
    url.push_str("_packaging/");
    url.push_str(feed);

    if tool_version.is_some_and(|v| !v.supports_v3()) {
        url.push_str("/nuget/v2");
    } else {
        url.push_str("/nuget/v3/index.json");
    }

    debug!("Feed registry URL for '{}': {}", feed_id, url);
    Ok(url)
}
