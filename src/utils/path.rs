//! Path manipulation utilities for search patterns

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading '..'; never pop past the root
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => components.push(component),
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Convert Windows separators to forward slashes
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Whether a path segment contains glob metacharacters
#[must_use]
pub fn has_glob_chars(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Split an absolute pattern into the literal directory to walk and whether
/// any glob segment follows it
///
/// `/work/out/**/*.nupkg` splits into `(/work/out, true)`;
/// `/work/out/a.nupkg` into `(/work/out/a.nupkg, false)`.
#[must_use]
pub fn split_glob_base(pattern: &Path) -> (PathBuf, bool) {
    let mut base = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(segment) = component
            && has_glob_chars(&segment.to_string_lossy())
        {
            return (base, true);
        }
        base.push(component);
    }
    (base, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./a/../b/./c")),
            PathBuf::from("b/c")
        );

        assert_eq!(normalize_path(Path::new("../a/b")), PathBuf::from("../a/b"));

        assert_eq!(normalize_path(Path::new("a/b/../..")), PathBuf::from(""));

        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("path\\to\\file"), "path/to/file");
        assert_eq!(
            normalize_separators("mixed\\path/to\\file"),
            "mixed/path/to/file"
        );
    }

    #[test]
    fn test_split_glob_base() {
        assert_eq!(
            split_glob_base(Path::new("/work/out/**/*.nupkg")),
            (PathBuf::from("/work/out"), true)
        );
        assert_eq!(
            split_glob_base(Path::new("/work/out/a.nupkg")),
            (PathBuf::from("/work/out/a.nupkg"), false)
        );
        assert_eq!(
            split_glob_base(Path::new("/work/pkg-[ab].nupkg")),
            (PathBuf::from("/work"), true)
        );
    }
}
