//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for feedpush operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PushError {
    /// Input Error - unknown feed type or missing required input
    #[error("Input error: {message}")]
    Input { message: String },

    /// Validation Error - a matched path cannot be published
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration Error - feed or connection setup is incomplete
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Tool Error - the publishing executable reported a failure
    #[error("Tool error: {message}")]
    Tool { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl PushError {
    pub const INPUT_EXIT_CODE: i32 = 1;
    pub const VALIDATION_EXIT_CODE: i32 = 2;
    pub const CONFIGURATION_EXIT_CODE: i32 = 3;
    pub const TOOL_EXIT_CODE: i32 = 4;
    pub const FILESYSTEM_EXIT_CODE: i32 = 5;

    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Input { .. } => Self::INPUT_EXIT_CODE,
            Self::Validation { .. } => Self::VALIDATION_EXIT_CODE,
            Self::Configuration { .. } => Self::CONFIGURATION_EXIT_CODE,
            Self::Tool { .. } => Self::TOOL_EXIT_CODE,
            Self::Filesystem { .. } => Self::FILESYSTEM_EXIT_CODE,
        }
    }

    /// Create an input error
    #[inline]
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a validation error
    #[inline]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a tool error
    #[inline]
    pub fn tool<S: Into<String>>(message: S) -> Self {
        Self::Tool {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// A matched path is a directory or special file
    #[inline]
    pub fn not_a_regular_file(path: &std::path::Path) -> Self {
        Self::validation(format!(
            "Not a regular file: {}. Only package files can be pushed",
            path.display()
        ))
    }

    /// The requested feed type is neither `internal` nor `external`
    #[inline]
    pub fn unknown_feed_type(value: &str) -> Self {
        Self::input(format!(
            "Unknown feed type '{value}'. Expected 'internal' or 'external'"
        ))
    }
}
