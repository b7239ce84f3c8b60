//! System abstraction for environment, filesystem and process operations
//!
//! This module provides a unified trait for all external system interactions,
//! allowing for easy testing with mock implementations.

use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Entry from directory walking
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_file: bool,
    pub is_dir: bool,
}

/// A single invocation of an external executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// Path to the executable
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory; inherited when `None`
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment
    pub env: Vec<(String, String)>,
}

impl ProcessInvocation {
    /// Create an invocation with no arguments
    #[must_use]
    #[inline]
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument
    #[inline]
    pub fn arg<S: Into<String>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value
    #[inline]
    pub fn arg_pair<S: Into<String>>(&mut self, flag: &str, value: S) -> &mut Self {
        self.args.push(flag.to_owned());
        self.args.push(value.into());
        self
    }

    /// Render the invocation for logs, masking the values of secret flags
    #[must_use]
    pub fn display_masked(&self, secret_flags: &[&str]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("***".to_owned());
                mask_next = false;
            } else {
                mask_next = secret_flags.iter().any(|flag| flag.eq_ignore_ascii_case(arg));
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

/// Unified trait for system operations (environment + filesystem + processes)
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std`, `walkdir` and `which`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    // ==================== Environment Operations ====================

    /// Get an environment variable
    fn env_var(&self, key: &str) -> Result<String, VarError>;

    /// Get the current working directory
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// The user's home directory, if one can be determined
    fn home_dir(&self) -> Option<PathBuf>;

    /// The system temporary directory
    fn temp_dir(&self) -> PathBuf;

    // ==================== Filesystem Operations ====================

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write bytes to a file, creating it if it doesn't exist
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Recursively create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and all its contents
    ///
    /// Removing a directory that does not exist succeeds.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path points to a regular file
    fn is_file(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Recursively walk a directory, returning all entries
    ///
    /// The root itself is excluded. Entries are sorted by path.
    fn walk_dir(&self, path: &Path) -> io::Result<Vec<WalkEntry>>;

    // ==================== Process Operations ====================

    /// Locate an executable on the search path
    fn which(&self, name: &str) -> Option<PathBuf>;

    /// Run an executable to completion and return its exit code
    ///
    /// Output is streamed to the parent's stdout/stderr. A process killed by
    /// a signal reports `-1`.
    fn run_process(&self, invocation: &ProcessInvocation) -> io::Result<i32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_secret_values() {
        let mut invocation = ProcessInvocation::new("/tools/nuget");
        invocation
            .arg("push")
            .arg("pkg.nupkg")
            .arg_pair("-ApiKey", "s3cret")
            .arg_pair("-Source", "https://feed");

        let shown = invocation.display_masked(&["-ApiKey"]);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("-ApiKey ***"));
        assert!(shown.contains("https://feed"));
    }
}
