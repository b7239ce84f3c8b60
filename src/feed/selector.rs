//! Feed selection: which feed, which URI, which API key

use super::location::{ToolVersion, feed_registry_url};
use super::{FeedSource, FeedType};
use crate::auth::{AuthInfo, INTERNAL_API_KEY};
use crate::error::PushError;
use anyhow::Result;
use tracing::{debug, info};

/// The feed a run publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFeed {
    pub feed_type: FeedType,
    pub source: FeedSource,
    /// Value for the tool's API key argument; `None` leaves it off
    pub api_key: Option<String>,
}

/// Outcome of feed selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSelection {
    Selected(SelectedFeed),
    /// An external feed was requested but no connection is declared
    NoSourceSpecified,
}

/// Resolve the feed source and API key for `feed_type`
///
/// # Errors
///
/// Returns an error if:
/// - An internal feed is requested without a feed identifier
/// - No access token or service URL is available for an internal feed
/// - The feed identifier is malformed
pub fn select_feed(
    feed_type: FeedType,
    internal_feed_id: Option<&str>,
    auth: &AuthInfo,
    tool_version: Option<ToolVersion>,
) -> Result<FeedSelection> {
    match feed_type {
        FeedType::Internal => {
            let feed_id = internal_feed_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    PushError::input(
                        "Missing required input: feed. An internal feed identifier is required when publishing to an internal feed",
                    )
                })?;

            if auth.internal.access_token.is_empty() {
                return Err(PushError::configuration(
                    "No access token is available. Set SYSTEM_ACCESSTOKEN to publish to an internal feed",
                )
                .into());
            }

            if auth.internal.uri_prefixes.is_empty() {
                return Err(PushError::configuration(
                    "The service URL is unknown. Set SYSTEM_TEAMFOUNDATIONCOLLECTIONURI to publish to an internal feed",
                )
                .into());
            }

            let uri = feed_registry_url(&auth.internal.uri_prefixes, feed_id, tool_version)?;
            info!("Publishing to internal feed '{}' at {}", feed_id, uri);

            Ok(FeedSelection::Selected(SelectedFeed {
                feed_type,
                source: FeedSource::internal(feed_id, uri),
                api_key: Some(INTERNAL_API_KEY.to_owned()),
            }))
        }
        FeedType::External => {
            let Some(external) = auth.first_external() else {
                return Ok(FeedSelection::NoSourceSpecified);
            };

            if auth.external.len() > 1 {
                debug!(
                    "{} external connections declared; only '{}' is used",
                    auth.external.len(),
                    external.source.name
                );
            }

            info!(
                "Publishing to external feed '{}' at {}",
                external.source.name, external.source.uri
            );

            Ok(FeedSelection::Selected(SelectedFeed {
                feed_type,
                source: external.source.clone(),
                api_key: external.api_key(),
            }))
        }
    }
}
