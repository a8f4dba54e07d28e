//! Installation registry: alias → terminal install, with cached data-dir resolution.

use crate::domain::data_dir::{find_data_dir, missing_subdirs, per_user_root};
use crate::domain::error::TesterError;
use crate::domain::request::DataDirMode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const DEFAULT_ALIAS: &str = "default";

/// Executable inside every install directory.
pub const TERMINAL_EXE: &str = "terminal.exe";

#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    pub alias: String,
    pub install_path: PathBuf,
    resolved: HashMap<DataDirMode, PathBuf>,
}

impl Installation {
    fn new(alias: &str, install_path: PathBuf) -> Self {
        Self {
            alias: alias.to_string(),
            install_path,
            resolved: HashMap::new(),
        }
    }

    pub fn executable(&self) -> PathBuf {
        self.install_path.join(TERMINAL_EXE)
    }

    /// Cached data path for `mode`, if it has been resolved.
    pub fn data_path(&self, mode: DataDirMode) -> Option<&Path> {
        self.resolved.get(&mode).map(PathBuf::as_path)
    }
}

/// Registered terminal installations, owned by the caller.
#[derive(Debug, Default)]
pub struct Registry {
    data_root: Option<PathBuf>,
    installations: HashMap<String, Installation>,
}

impl Registry {
    /// `data_root` is the directory holding per-user data directories.
    pub fn new(data_root: Option<PathBuf>) -> Self {
        Self {
            data_root,
            installations: HashMap::new(),
        }
    }

    /// Uses `%APPDATA%/MetaQuotes/Terminal` as the per-user data root.
    pub fn from_env() -> Self {
        let root = std::env::var_os("APPDATA").map(|app_data| per_user_root(Path::new(&app_data)));
        Self::new(root)
    }

    pub fn data_root(&self) -> Option<&Path> {
        self.data_root.as_deref()
    }

    /// Registers `install_path` under `alias`. Returns false and leaves the
    /// existing entry untouched when the alias is already registered.
    pub fn initialize(&mut self, alias: &str, install_path: impl Into<PathBuf>) -> bool {
        if self.installations.contains_key(alias) {
            info!(alias, "terminal is already initialized");
            return false;
        }
        let install_path = install_path.into();
        debug!(alias, path = %install_path.display(), "registered terminal");
        self.installations
            .insert(alias.to_string(), Installation::new(alias, install_path));
        true
    }

    pub fn installation(&self, alias: &str) -> Result<&Installation, TesterError> {
        self.installations
            .get(alias)
            .ok_or_else(|| not_initialized(alias))
    }

    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.installations.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    /// Forgets cached resolutions for `alias`; the next `resolve` re-derives them.
    pub fn invalidate(&mut self, alias: &str) {
        if let Some(inst) = self.installations.get_mut(alias) {
            inst.resolved.clear();
        }
    }

    /// Resolves and validates the data directory of `alias` for `mode`.
    ///
    /// Successful results are cached per mode; failures cache nothing.
    pub fn resolve(&mut self, alias: &str, mode: DataDirMode) -> Result<PathBuf, TesterError> {
        let data_root = self.data_root.clone();
        let inst = self
            .installations
            .get_mut(alias)
            .ok_or_else(|| not_initialized(alias))?;

        if let Some(path) = inst.resolved.get(&mode) {
            return Ok(path.clone());
        }

        let data_path = locate(&inst.install_path, mode, data_root.as_deref())
            .inspect_err(|e| error!(alias, "{e}"))?;

        debug!(alias, ?mode, path = %data_path.display(), "resolved data directory");
        inst.resolved.insert(mode, data_path.clone());
        Ok(data_path)
    }
}

fn not_initialized(alias: &str) -> TesterError {
    let err = TesterError::NotInitialized {
        alias: alias.to_string(),
    };
    error!("{err}");
    err
}

fn locate(
    install_path: &Path,
    mode: DataDirMode,
    data_root: Option<&Path>,
) -> Result<PathBuf, TesterError> {
    if !install_path.exists() {
        return Err(TesterError::PathNotFound {
            path: install_path.to_path_buf(),
        });
    }

    let data_path = match mode {
        DataDirMode::Isolated => install_path.to_path_buf(),
        DataDirMode::PerUser => {
            let root = data_root.ok_or(TesterError::DataRootUnavailable)?;
            find_data_dir(root, install_path).ok_or_else(|| TesterError::Resolution {
                install_path: install_path.to_path_buf(),
                root: root.to_path_buf(),
            })?
        }
    };

    let missing = missing_subdirs(&data_path);
    if !missing.is_empty() {
        return Err(TesterError::InvalidInstallation { data_path, missing });
    }
    Ok(data_path)
}
