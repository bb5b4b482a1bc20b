use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Platform-specific locations for the application's files.
///
/// On Linux this follows the XDG Base Directory spec (`~/.config/{name}`,
/// `~/.local/share/{name}`), on macOS `~/Library/Application Support`, and on
/// Windows `%APPDATA%`.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    dirs: ProjectDirs,
}

impl ProjectPaths {
    /// Returns `None` when no home directory can be determined.
    pub fn new(name: &str) -> Option<Self> {
        ProjectDirs::from("", "", name).map(|dirs| Self { dirs })
    }

    pub fn config_dir(&self) -> &Path {
        self.dirs.config_dir()
    }

    pub fn data_dir(&self) -> &Path {
        self.dirs.data_dir()
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}
