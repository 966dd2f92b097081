//! Project initialization logic
//!
//! Creates the `PodBuilder/` layout with a commented default configuration
//! and keeps scratch output out of version control.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::config::Configuration;
use crate::error::{ConfigError, FilesystemError, PodBuilderError};
use crate::infra::dirs::PodBuilderDirs;
use crate::infra::filesystem;

/// Entries to add to .gitignore
pub const GITIGNORE_ENTRIES: &[&str] = &[
    "PodBuilder/build/",
    "PodBuilder/checkouts/",
    "PodBuilder/.podbuilder.lock",
];

/// Marker comment for the podbuilder section in .gitignore
pub const GITIGNORE_MARKER: &str = "# podbuilder";

/// Result of initialization
#[derive(Debug)]
pub struct InitResult {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Whether the configuration file was written
    pub config_created: bool,
    /// Whether .gitignore was created or updated
    pub gitignore_updated: bool,
}

/// Generate the default configuration with comments
pub fn generate_config_content(project_name: &str) -> String {
    format!(
        r#"# PodBuilder configuration
project_name = "{project_name}"

# Resolved dependency graph snapshot (relative to the project root)
resolved_graph = "{resolved}"

# Roots that are never prebuilt
skip_pods = []

# Subspecs linked into several targets, built on their own
subspecs_to_split = []

# Paths left out of source fingerprints (relative to each pod's sources)
hash_ignore = []

# Directories searched by `podbuilder switch --development`
development_pods_paths = []

# Downgrade unsafe split configurations to warnings
allow_warnings = false

# Keep the scratch project and open it when a build fails
debug = false

# Per-pod overrides
# [spec_overrides.Alamofire]
# static_framework = true
# build_configuration = "debug"
"#,
        resolved = defaults::RESOLVED_GRAPH_PATH,
    )
}

/// Generate .gitignore content for podbuilder
pub fn generate_gitignore_content() -> String {
    let mut content = String::from(GITIGNORE_MARKER);
    content.push('\n');
    for entry in GITIGNORE_ENTRIES {
        content.push_str(entry);
        content.push('\n');
    }
    content
}

/// Append podbuilder entries to existing .gitignore content
pub fn append_gitignore_entries(existing: &str) -> String {
    if existing.contains(GITIGNORE_MARKER) {
        return existing.to_string();
    }

    let mut result = existing.to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    if !result.is_empty() {
        result.push('\n');
    }
    result.push_str(&generate_gitignore_content());
    result
}

/// Derive project name from directory
pub fn derive_project_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| "App".to_string(), str::to_string)
}

/// Create the layout and default configuration
///
/// An existing configuration is kept unless `force` is set.
pub fn init_project(dirs: &PodBuilderDirs, force: bool) -> Result<InitResult, PodBuilderError> {
    filesystem::create_dir_all(&dirs.prebuilt_dir())?;
    filesystem::create_dir_all(&dirs.dsym_dir())?;

    let config_path = dirs.config_path();
    let config_created = force || !config_path.exists();
    if config_created {
        let content = generate_config_content(&derive_project_name(dirs.project_root()));
        Configuration::from_toml(&content).map_err(|e| ConfigError::ParseError {
            path: config_path.clone(),
            error: e.to_string(),
        })?;
        filesystem::write_file(&config_path, &content)?;
    }

    let gitignore_updated = update_gitignore(&dirs.project_root().join(".gitignore"))?;

    Ok(InitResult {
        config_path,
        config_created,
        gitignore_updated,
    })
}

fn update_gitignore(path: &Path) -> Result<bool, FilesystemError> {
    let existing = if path.exists() {
        filesystem::read_file(path)?
    } else {
        String::new()
    };
    let updated = append_gitignore_entries(&existing);
    if updated == existing {
        return Ok(false);
    }
    filesystem::write_file(path, &updated)?;
    Ok(true)
}
