//! Carbon settings
//!
//! Everything Carbon persists lives under one per-user directory
//! (`~/.carbon` unless `CARBON_HOME` says otherwise): the registry database
//! and every generated compose file.

use crate::error::Result;
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the carbon home directory
pub const HOME_ENV: &str = "CARBON_HOME";

/// Environment variable overriding the container tool binary
pub const DOCKER_ENV: &str = "CARBON_DOCKER";

/// Default container tool binary
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Default number of directory levels scanned inside a store
pub const DEFAULT_SCAN_DEPTH: usize = 2;

/// Registry database file name
pub const DATABASE_FILE: &str = "database.db";

/// Carbon settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Carbon home directory
    pub home: PathBuf,
    /// Directory where generated compose files are written
    pub compose_dir: PathBuf,
    /// Registry database path
    pub database_file: PathBuf,
    /// Container tool binary (`docker`, `podman`, ...)
    pub docker_binary: String,
    /// How deep stores are scanned for carbon files
    pub scan_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".carbon");

        Self::from_home(home)
    }
}

impl Settings {
    /// Settings rooted at the given home directory
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();

        Self {
            compose_dir: home.clone(),
            database_file: home.join(DATABASE_FILE),
            home,
            docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
            scan_depth: DEFAULT_SCAN_DEPTH,
        }
    }

    /// Settings from the environment, falling back to the defaults
    pub fn from_env() -> Self {
        let mut settings = match std::env::var_os(HOME_ENV) {
            Some(home) if !home.is_empty() => Self::from_home(PathBuf::from(home)),
            _ => Self::default(),
        };

        if let Ok(binary) = std::env::var(DOCKER_ENV) {
            if !binary.trim().is_empty() {
                settings.docker_binary = binary.trim().to_string();
            }
        }

        settings
    }

    /// Create the carbon directories if they are missing
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.home)?;
        fs::create_dir_all(&self.compose_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_from_home() {
        let settings = Settings::from_home("/tmp/carbon-home");
        assert_eq!(settings.home, PathBuf::from("/tmp/carbon-home"));
        assert_eq!(settings.compose_dir, PathBuf::from("/tmp/carbon-home"));
        assert_eq!(
            settings.database_file,
            PathBuf::from("/tmp/carbon-home/database.db")
        );
        assert_eq!(settings.docker_binary, "docker");
        assert_eq!(settings.scan_depth, 2);
    }

    #[test]
    fn test_default_home_is_dot_carbon() {
        let settings = Settings::default();
        assert!(settings.home.ends_with(".carbon"));
    }

    #[test]
    fn test_ensure_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::from_home(temp_dir.path().join("nested").join("home"));

        settings.ensure_dirs().unwrap();
        assert!(settings.home.is_dir());
        assert!(settings.compose_dir.is_dir());
    }
}
