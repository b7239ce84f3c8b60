//! `FeedPush` - A build-pipeline task that publishes NuGet packages
//!
//! This library resolves package files from a search pattern, selects an
//! internal or external feed, writes a temporary `nuget.config` with the
//! feed credentials and pushes every package with `nuget`, `dotnet` or the
//! bundled push tool.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod nuget_config;
pub mod operations;
pub mod system;
pub mod utils;

use cli::Args;
use operations::{PublishOperation, TaskResult};
use system::{RealSystem, System};

/// Main entry point for the feedpush library
#[must_use]
pub fn run(args: Args) -> TaskResult {
    let system = RealSystem;
    run_with_system(args, &system)
}

/// Run against an explicit system implementation
#[must_use]
pub fn run_with_system(args: Args, system: &dyn System) -> TaskResult {
    match PublishOperation::new(args, system) {
        Ok(operation) => operation.run(),
        Err(err) => TaskResult::from_error(&err, None),
    }
}
