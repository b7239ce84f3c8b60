//! Temporary `nuget.config` composition
//!
//! The publishing tools read feed sources and credentials from a
//! `nuget.config`. A fresh one is written per run into
//! `<temp>/NuGet_<run id>/` and the directory is removed when the guard is
//! dropped, whichever way the run ends.

pub mod writer;

pub use writer::NuGetConfigDocument;

use crate::auth::AuthInfo;
use crate::error::PushError;
use crate::feed::FeedSource;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub const CONFIG_FILE_NAME: &str = "nuget.config";

/// Directory name for a run; characters outside `[A-Za-z0-9._-]` become `_`
#[must_use]
pub fn temp_directory_name(run_id: &str) -> String {
    let sanitized: String = run_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("NuGet_{sanitized}")
}

/// A temporary `nuget.config` owned by the current run
///
/// Dropping the handle removes the enclosing directory.
pub struct TempNuGetConfig<'sys> {
    system: &'sys dyn System,
    directory: PathBuf,
    path: PathBuf,
    document: NuGetConfigDocument,
}

impl<'sys> TempNuGetConfig<'sys> {
    /// Allocate a fresh, empty config directory for `run_id` under `base`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn create(system: &'sys dyn System, base: &Path, run_id: &str) -> Result<Self> {
        let directory = base.join(temp_directory_name(run_id));

        // Leftovers from an earlier run with the same id
        system.remove_dir_all(&directory).map_err(|e| {
            PushError::filesystem(format!(
                "Failed to clear stale config directory {}: {e}",
                directory.display()
            ))
        })?;

        system.create_dir_all(&directory).map_err(|e| {
            PushError::filesystem(format!(
                "Failed to create config directory {}: {e}",
                directory.display()
            ))
        })?;
        debug!("Created temporary config directory {}", directory.display());

        let path = directory.join(CONFIG_FILE_NAME);
        Ok(Self {
            system,
            directory,
            path,
            document: NuGetConfigDocument::new(),
        })
    }

    /// Path of the `nuget.config` file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the config; the tool's working directory
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Register sources and persist the file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn add_sources(&mut self, sources: &[FeedSource]) -> Result<()> {
        for source in sources {
            debug!(
                "Adding source '{}' ({}) to temporary config",
                source.name, source.uri
            );
            self.document.add_source(source.clone());
        }
        self.save()
    }

    /// Apply credentials to every registered source and persist the file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn set_auth_for_sources(&mut self, auth: &AuthInfo) -> Result<()> {
        let credentials: Vec<_> = self
            .document
            .sources()
            .iter()
            .filter_map(|source| {
                auth.credential_for(source)
                    .map(|credential| (source.name.clone(), credential))
            })
            .collect();

        for (name, credential) in credentials {
            debug!("Setting credentials for source '{}'", name);
            self.document.set_credential(&name, credential);
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        self.system
            .write(&self.path, self.document.to_xml().as_bytes())
            .map_err(|e| {
                PushError::filesystem(format!(
                    "Failed to write {}: {e}",
                    self.path.display()
                ))
            })?;
        Ok(())
    }
}

impl Drop for TempNuGetConfig<'_> {
    fn drop(&mut self) {
        match self.system.remove_dir_all(&self.directory) {
            Ok(()) => debug!(
                "Removed temporary config directory {}",
                self.directory.display()
            ),
            Err(e) => error!(
                "Failed to remove temporary config directory {}: {e}",
                self.directory.display()
            ),
        }
    }
}

/// How the publishing tool receives its feed configuration
pub enum ComposedConfig<'sys> {
    /// A temporary `nuget.config`, removed on drop
    TempFile(TempNuGetConfig<'sys>),
    /// Secrets come from the credential provider; nothing was written
    CredentialProvider,
}

impl ComposedConfig<'_> {
    /// The config file to pass to the tool, if any
    #[must_use]
    pub fn config_file(&self) -> Option<&Path> {
        match self {
            Self::TempFile(config) => Some(config.path()),
            Self::CredentialProvider => None,
        }
    }

    /// Working directory for the tool, if it must be changed
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        match self {
            Self::TempFile(config) => Some(config.directory()),
            Self::CredentialProvider => None,
        }
    }
}

/// Compose the temporary config for `source`
///
/// When `use_credential_provider` is set no file is written and disposal is
/// a no-op.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written
pub fn compose<'sys>(
    system: &'sys dyn System,
    base: &Path,
    run_id: &str,
    source: &FeedSource,
    auth: &AuthInfo,
) -> Result<ComposedConfig<'sys>> {
    if auth.internal.use_credential_provider && source.is_internal {
        debug!("Credential provider supplies secrets; skipping temporary config");
        return Ok(ComposedConfig::CredentialProvider);
    }

    let mut config = TempNuGetConfig::create(system, base, run_id)?;
    config
        .add_sources(std::slice::from_ref(source))
        .context("Failed to register feed source")?;
    config
        .set_auth_for_sources(auth)
        .context("Failed to apply feed credentials")?;

    Ok(ComposedConfig::TempFile(config))
}
