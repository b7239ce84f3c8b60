//! Feed types and feed selection
//!
//! Decides which feed a run publishes to and with which API key.

pub mod location;
pub mod selector;

pub use selector::{FeedSelection, SelectedFeed, select_feed};

use crate::error::PushError;
use std::fmt;

/// Classification of the destination feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedType {
    Internal,
    External,
}

impl FeedType {
    /// Normalize the feed-type input
    ///
    /// An absent or blank value means `internal`. Matching is
    /// case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `PushError::Input` for any other value
    #[inline]
    pub fn parse(value: Option<&str>) -> Result<Self, PushError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match value {
            None => Ok(Self::Internal),
            Some(v) if v.eq_ignore_ascii_case("internal") => Ok(Self::Internal),
            Some(v) if v.eq_ignore_ascii_case("external") => Ok(Self::External),
            Some(v) => Err(PushError::unknown_feed_type(v)),
        }
    }

    #[must_use]
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Internal => f.write_str("internal"),
            Self::External => f.write_str("external"),
        }
    }
}

/// A named, addressable publish target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub uri: String,
    pub is_internal: bool,
}

impl FeedSource {
    #[must_use]
    pub fn internal<N: Into<String>, U: Into<String>>(name: N, uri: U) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            is_internal: true,
        }
    }

    #[must_use]
    pub fn external<N: Into<String>, U: Into<String>>(name: N, uri: U) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            is_internal: false,
        }
    }
}
