//! Terminal outcomes of a publishing run

use super::push::PushResult;
use crate::config::BuildIdentity;
use crate::error::PushError;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, warn};

/// Exit code for failures that carry no `PushError`
pub const UNEXPECTED_EXIT_CODE: i32 = PushError::FILESYSTEM_EXIT_CODE;

/// What `PublishOperation::execute` accomplished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The search pattern matched nothing
    NoPackagesMatched,
    Published { results: Vec<PushResult> },
    /// Dry run; these files would have been pushed
    Previewed { files: Vec<PathBuf> },
    /// External feed requested without any declared connection
    NoSourceSpecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// Status message reported for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMessage {
    NoPackagesMatched,
    PackagesPublished { count: usize },
    DryRunCompleted { count: usize },
    NoSourceSpecifiedForPush,
    PackagesFailedToPublish,
}

impl TaskMessage {
    /// Stable message key
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::NoPackagesMatched => "Info_NoPackagesMatchedTheSearchPattern",
            Self::PackagesPublished { .. } => "PackagesPublishedSuccessfully",
            Self::DryRunCompleted { .. } => "DryRunCompleted",
            Self::NoSourceSpecifiedForPush => "Error_NoSourceSpecifiedForPush",
            Self::PackagesFailedToPublish => "PackagesFailedToPublish",
        }
    }
}

impl fmt::Display for TaskMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoPackagesMatched => write!(f, "No packages matched the search pattern."),
            Self::PackagesPublished { count } => {
                write!(f, "Your packages have been pushed ({count} published).")
            }
            Self::DryRunCompleted { count } => {
                write!(f, "Dry run complete; {count} package(s) would be pushed.")
            }
            Self::NoSourceSpecifiedForPush => write!(f, "No source was specified for push"),
            Self::PackagesFailedToPublish => write!(f, "Packages failed to publish"),
        }
    }
}

/// Final status of a run, mapped onto the process exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub message: TaskMessage,
    pub exit_code: i32,
}

impl TaskResult {
    #[must_use]
    pub const fn succeeded(message: TaskMessage) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            message,
            exit_code: 0,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    /// Map a completed run onto its status
    #[must_use]
    pub fn from_outcome(outcome: &PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::NoPackagesMatched => Self::succeeded(TaskMessage::NoPackagesMatched),
            PublishOutcome::Published { results } => {
                Self::succeeded(TaskMessage::PackagesPublished {
                    count: results.len(),
                })
            }
            PublishOutcome::Previewed { files } => {
                Self::succeeded(TaskMessage::DryRunCompleted { count: files.len() })
            }
            PublishOutcome::NoSourceSpecified => Self {
                status: TaskStatus::Failed,
                message: TaskMessage::NoSourceSpecifiedForPush,
                exit_code: PushError::CONFIGURATION_EXIT_CODE,
            },
        }
    }

    /// Catch-all failure: log the error, emit the permission hint when the
    /// build identity is known, and fail the run
    #[must_use]
    pub fn from_error(err: &anyhow::Error, identity: Option<&BuildIdentity>) -> Self {
        error!("{err:#}");

        if let Some(hint) = identity.and_then(permission_hint) {
            warn!("{hint}");
        }

        Self {
            status: TaskStatus::Failed,
            message: TaskMessage::PackagesFailedToPublish,
            exit_code: err
                .downcast_ref::<PushError>()
                .map_or(UNEXPECTED_EXIT_CODE, PushError::exit_code),
        }
    }
}

/// Hint naming the identity the build ran as
#[must_use]
pub fn permission_hint(identity: &BuildIdentity) -> Option<String> {
    let who = match (identity.display_name.as_deref(), identity.account.as_deref()) {
        (Some(name), Some(account)) => format!("'{name}' [{account}]"),
        (Some(name), None) => format!("'{name}'"),
        (None, Some(account)) => format!("[{account}]"),
        (None, None) => return None,
    };

    Some(format!(
        "Make sure the build identity {who} has permission to push packages to this feed"
    ))
}
