//! Package file resolution
//!
//! Expands a search pattern into an ordered list of package files.

use crate::error::PushError;
use crate::system::System;
use crate::utils::path::{normalize_path, normalize_separators, split_glob_base};
use anyhow::{Context as _, Result};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve `search_pattern` relative to `root`
///
/// Patterns are separated by `;` or newlines; a leading `!` excludes. Each
/// include pattern contributes its matches sorted by path, in pattern order,
/// without duplicates. An empty result is not an error.
///
/// # Errors
///
/// Returns an error if:
/// - The pattern has no include entries or is not a valid glob
/// - Any match is not a regular file
/// - The filesystem cannot be read
pub fn resolve_package_files(
    system: &dyn System,
    root: &Path,
    search_pattern: &str,
) -> Result<Vec<PathBuf>> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();

    for entry in search_pattern.split(['\n', ';']).map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        match entry.strip_prefix('!') {
            Some(negated) => excludes.push(SearchPattern::parse(root, negated.trim())?),
            None => includes.push(entry),
        }
    }

    if includes.is_empty() {
        return Err(PushError::input(format!(
            "Search pattern '{search_pattern}' has no include patterns"
        ))
        .into());
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in includes {
        let matches = match_pattern(system, root, pattern)
            .with_context(|| format!("Failed to match search pattern '{pattern}'"))?;
        debug!("Pattern '{}' matched {} path(s)", pattern, matches.len());
        for path in matches {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    files.retain(|path| {
        !excludes
            .iter()
            .any(|exclude| exclude.matches(path))
    });

    for path in &files {
        if !system.is_file(path)? {
            return Err(PushError::not_a_regular_file(path).into());
        }
    }

    Ok(files)
}

/// One search pattern anchored at the search root
///
/// The root is taken literally; only the user-supplied part is glob syntax.
struct SearchPattern {
    /// Literal directory to walk, or the literal path when there is no glob
    base: PathBuf,
    glob: Option<Pattern>,
}

impl SearchPattern {
    fn parse(root: &Path, pattern: &str) -> Result<Self> {
        let relative = normalize_separators(pattern);
        let relative = Path::new(&relative);
        let (literal, has_glob) = split_glob_base(relative);
        let base = normalize_path(&root.join(&literal));

        if !has_glob {
            return Ok(Self { base, glob: None });
        }

        let remainder = relative.strip_prefix(&literal).unwrap_or(relative);
        let escaped = Pattern::escape(&base.to_string_lossy());
        let text = format!(
            "{}/{}",
            escaped.trim_end_matches('/'),
            remainder.to_string_lossy()
        );

        let glob = Pattern::new(&text).map_err(|e| {
            PushError::input(format!("Invalid search pattern '{pattern}': {e}"))
        })?;

        Ok(Self {
            base,
            glob: Some(glob),
        })
    }

    fn matches(&self, path: &Path) -> bool {
        match self.glob.as_ref() {
            Some(glob) => glob.matches_path_with(path, MATCH_OPTIONS),
            None => path == self.base,
        }
    }
}

/// All paths matching one include pattern, sorted
fn match_pattern(system: &dyn System, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let search = SearchPattern::parse(root, pattern)?;

    if search.glob.is_none() {
        return Ok(if system.exists(&search.base)? {
            vec![search.base]
        } else {
            Vec::new()
        });
    }

    if !system.is_dir(&search.base)? {
        debug!("Search base {} does not exist", search.base.display());
        return Ok(Vec::new());
    }

    let mut matches: Vec<PathBuf> = system
        .walk_dir(&search.base)?
        .into_iter()
        .map(|entry| entry.path)
        .filter(|path| search.matches(path))
        .collect();
    matches.sort();

    Ok(matches)
}
