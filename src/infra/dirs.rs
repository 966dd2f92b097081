//! Directory layout
//!
//! Everything podbuilder writes inside a project lives under `PodBuilder/`.
//! The global config directory follows platform conventions (XDG on Linux,
//! Library on macOS) and can be overridden with `PODBUILDER_CONFIG_DIR`.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults;

/// Environment variable overriding the global config directory
pub const ENV_CONFIG_DIR: &str = "PODBUILDER_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "podbuilder";

/// Paths used by podbuilder for one project
#[derive(Debug, Clone)]
pub struct PodBuilderDirs {
    project_root: PathBuf,
    config_dir: PathBuf,
}

impl PodBuilderDirs {
    /// Layout for the project rooted at `project_root`
    #[must_use]
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Project root (directory containing the Podfile)
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// `PodBuilder/`
    #[must_use]
    pub fn podbuilder_dir(&self) -> PathBuf {
        self.project_root.join(defaults::PODBUILDER_DIR)
    }

    /// Project configuration file
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::CONFIG_FILE)
    }

    /// Global configuration file
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Harvested frameworks
    #[must_use]
    pub fn prebuilt_dir(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::PREBUILT_DIR)
    }

    /// Harvested debug symbols
    #[must_use]
    pub fn dsym_dir(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::DSYM_DIR)
    }

    /// Scratch build directory, wiped before every group
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::BUILD_DIR)
    }

    /// Downloaded working copies of non-development pods
    #[must_use]
    pub fn checkouts_dir(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::CHECKOUTS_DIR)
    }

    /// Reuse record store
    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.prebuilt_dir().join(defaults::RECORDS_FILE)
    }

    /// Persisted license list
    #[must_use]
    pub fn licenses_path(&self) -> PathBuf {
        self.prebuilt_dir().join(defaults::LICENSES_FILE)
    }

    /// Persisted artifact metadata
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.prebuilt_dir().join(defaults::METADATA_FILE)
    }

    /// Reference map for the Podfile writer
    #[must_use]
    pub fn references_path(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::REFERENCES_FILE)
    }

    /// Advisory lock file
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.podbuilder_dir().join(defaults::LOCK_FILE)
    }

    /// Resolve a configured path against the project root
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}
