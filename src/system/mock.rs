//! Mock system implementation for testing

use super::{ProcessInvocation, System, WalkEntry};
use std::collections::{HashMap, HashSet, VecDeque};
use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory implementation of System trait for testing
///
/// `MockSystem` provides an in-memory filesystem, environment, executable
/// lookup table and scripted process exit codes. Every process invocation is
/// recorded so tests can assert on arguments and ordering.
///
/// # Example
/// ```
/// use feedpush::system::{mock::MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_env("BUILD_BUILDID", "42")
///     .with_file("/work/a.nupkg", b"pkg")
///     .with_tool("nuget", "/tools/nuget");
///
/// assert_eq!(system.env_var("BUILD_BUILDID").unwrap(), "42");
/// assert!(system.is_file(Path::new("/work/a.nupkg")).unwrap());
/// assert_eq!(system.which("nuget").unwrap(), Path::new("/tools/nuget"));
/// ```
#[derive(Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

/// A process invocation observed by `MockSystem`
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub invocation: ProcessInvocation,
    /// Contents of `<cwd>/nuget.config` at the time of the call, if present
    pub nuget_config: Option<String>,
}

struct MockSystemState {
    env_vars: HashMap<String, String>,
    current_dir: PathBuf,
    home_dir: Option<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    tools: HashMap<String, PathBuf>,
    exit_codes: HashMap<PathBuf, VecDeque<i32>>,
    unstartable: HashSet<PathBuf>,
    invocations: Vec<RecordedInvocation>,
}

impl MockSystem {
    /// Create a new `MockSystem` with default state
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                env_vars: HashMap::new(),
                current_dir: PathBuf::from("/"),
                home_dir: None,
                files: HashMap::new(),
                dirs: HashSet::from([PathBuf::from("/")]),
                tools: HashMap::new(),
                exit_codes: HashMap::new(),
                unstartable: HashSet::new(),
                invocations: Vec::new(),
            })),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, MockSystemState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MockSystemState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set an environment variable (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_env(self, key: &str, value: &str) -> Self {
        self.write_state()
            .env_vars
            .insert(key.to_owned(), value.to_owned());
        self
    }

    /// Set the current working directory (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_current_dir<P: AsRef<Path>>(self, dir: P) -> Self {
        {
            let mut state = self.write_state();
            Self::ensure_parent_dirs(&mut state.dirs, dir.as_ref());
            state.current_dir = dir.as_ref().to_path_buf();
        }
        self
    }

    /// Set the home directory (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_home_dir<P: AsRef<Path>>(self, dir: P) -> Self {
        self.write_state().home_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add a file with contents (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> Self {
        {
            let path_buf = path.as_ref().to_path_buf();
            let mut state = self.write_state();
            if let Some(parent) = path_buf.parent() {
                Self::ensure_parent_dirs(&mut state.dirs, parent);
            }
            state.files.insert(path_buf, contents.to_vec());
        }
        self
    }

    /// Add a directory (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> Self {
        Self::ensure_parent_dirs(&mut self.write_state().dirs, path.as_ref());
        self
    }

    /// Register an executable so `which(name)` finds it (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_tool<P: AsRef<Path>>(self, name: &str, path: P) -> Self {
        self.write_state()
            .tools
            .insert(name.to_owned(), path.as_ref().to_path_buf());
        self
    }

    /// Queue exit codes for successive runs of `program` (builder pattern)
    ///
    /// Once the queue is drained the program exits with `0`.
    #[must_use]
    #[inline]
    pub fn with_exit_codes<P: AsRef<Path>>(self, program: P, codes: &[i32]) -> Self {
        self.write_state()
            .exit_codes
            .entry(program.as_ref().to_path_buf())
            .or_default()
            .extend(codes.iter().copied());
        self
    }

    /// Make every run of `program` fail to start (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_unstartable<P: AsRef<Path>>(self, program: P) -> Self {
        self.write_state()
            .unstartable
            .insert(program.as_ref().to_path_buf());
        self
    }

    /// All process invocations seen so far, in order
    #[must_use]
    #[inline]
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.read_state().invocations.clone()
    }

    #[inline]
    fn ensure_parent_dirs(dirs: &mut HashSet<PathBuf>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl Default for MockSystem {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    #[inline]
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        self.read_state()
            .env_vars
            .get(key)
            .cloned()
            .ok_or(VarError::NotPresent)
    }

    #[inline]
    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.read_state().current_dir.clone())
    }

    #[inline]
    fn home_dir(&self) -> Option<PathBuf> {
        self.read_state().home_dir.clone()
    }

    #[inline]
    fn temp_dir(&self) -> PathBuf {
        PathBuf::from("/tmp")
    }

    #[inline]
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self
            .read_state()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                )
            })?;
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {e}")))
    }

    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.write_state();

        if let Some(parent) = path.parent()
            && !state.dirs.contains(parent)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }

        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("Is a directory: {}", path.display()),
            ));
        }

        state.files.insert(path.to_path_buf(), contents.to_vec());
        drop(state);
        Ok(())
    }

    #[inline]
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state();
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("A file already exists at {}", path.display()),
            ));
        }
        Self::ensure_parent_dirs(&mut state.dirs, path);
        drop(state);
        Ok(())
    }

    #[inline]
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state();
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        drop(state);
        Ok(())
    }

    #[inline]
    fn exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.read_state();
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    #[inline]
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        Ok(self.read_state().files.contains_key(path))
    }

    #[inline]
    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(self.read_state().dirs.contains(path))
    }

    #[inline]
    fn walk_dir(&self, path: &Path) -> io::Result<Vec<WalkEntry>> {
        let state = self.read_state();

        if !state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Directory not found: {}", path.display()),
            ));
        }

        let mut entries: Vec<WalkEntry> = state
            .dirs
            .iter()
            .filter(|dir| dir.starts_with(path) && dir.as_path() != path)
            .map(|dir| WalkEntry {
                path: dir.clone(),
                is_file: false,
                is_dir: true,
            })
            .chain(
                state
                    .files
                    .keys()
                    .filter(|file| file.starts_with(path))
                    .map(|file| WalkEntry {
                        path: file.clone(),
                        is_file: true,
                        is_dir: false,
                    }),
            )
            .collect();
        drop(state);

        // Sort entries by path for deterministic output
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(entries)
    }

    #[inline]
    fn which(&self, name: &str) -> Option<PathBuf> {
        self.read_state().tools.get(name).cloned()
    }

    #[inline]
    fn run_process(&self, invocation: &ProcessInvocation) -> io::Result<i32> {
        let mut state = self.write_state();

        let nuget_config = invocation
            .cwd
            .as_ref()
            .and_then(|cwd| state.files.get(&cwd.join("nuget.config")))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        state.invocations.push(RecordedInvocation {
            invocation: invocation.clone(),
            nuget_config,
        });

        if state.unstartable.contains(&invocation.program) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Cannot start {}", invocation.program.display()),
            ));
        }

        let code = state
            .exit_codes
            .get_mut(&invocation.program)
            .and_then(VecDeque::pop_front)
            .unwrap_or(0);
        drop(state);
        Ok(code)
    }
}
