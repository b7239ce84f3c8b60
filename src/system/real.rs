//! Real system implementation using `std`, `walkdir` and `which`

use super::{ProcessInvocation, System, WalkEntry};
use std::env::VarError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use walkdir::WalkDir;

/// Production implementation of System trait
///
/// This implementation directly delegates to the standard library and a
/// couple of small crates. It carries no state.
#[derive(Debug, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    /// Create a new `RealSystem` instance
    #[must_use]
    pub const fn new() -> Self {
        return Self;
    }
}

impl Default for RealSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `NotFound` error to `Ok(false)`
fn probe(result: io::Result<fs::Metadata>, check: fn(&fs::Metadata) -> bool) -> io::Result<bool> {
    match result {
        Ok(metadata) => Ok(check(&metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl System for RealSystem {
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        probe(fs::metadata(path), |_| true)
    }

    fn is_file(&self, path: &Path) -> io::Result<bool> {
        probe(fs::metadata(path), fs::Metadata::is_file)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        probe(fs::metadata(path), fs::Metadata::is_dir)
    }

    fn walk_dir(&self, path: &Path) -> io::Result<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let file_type = entry.file_type();
            entries.push(WalkEntry {
                path: entry.into_path(),
                is_file: file_type.is_file(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        match which::which(name) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Executable '{}' not found on PATH: {}", name, e);
                None
            }
        }
    }

    fn run_process(&self, invocation: &ProcessInvocation) -> io::Result<i32> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(cwd) = invocation.cwd.as_ref() {
            command.current_dir(cwd);
        }

        let status = command.status()?;
        Ok(status.code().unwrap_or(-1))
    }
}
