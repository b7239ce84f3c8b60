//! # `FeedPush`
//!
//! `FeedPush` is a build-pipeline task that publishes NuGet packages to a feed hosted by the
//! build service or to an external feed.
//!
//! ## Features
//! - Resolve package files from `;`-separated glob patterns with `!` exclusions.
//! - Publish to internal feeds with the build's access token, or to the first declared external connection.
//! - Write a throwaway `nuget.config` per run and remove it however the run ends.
//! - Skip "package already exists" conflicts when pushing with the bundled push tool.
//!
//! ## Usage
//!
//! **Basic example:**
//! ```sh
//! feedpush --search-pattern '**/*.nupkg;!**/*.symbols.nupkg' --feed my-feed
//! ```
//!
//! **With config:**
//! ```sh
//! feedpush --config feedpush.yaml
//! ```
//!
//! See `feedpush --help` for more options and details.

use clap::Parser as _;
use feedpush::cli::Args;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    let result = feedpush::run(args);
    if result.is_success() {
        info!("{}", result.message);
    } else {
        error!("{}: {}", result.message.key(), result.message);
    }

    std::process::exit(result.exit_code);
}
