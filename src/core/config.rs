//! Configuration loading
//!
//! The project configuration lives in `PodBuilder/PodBuilder.toml` and is
//! layered over an optional global `config.toml`. String values support
//! `${VAR}` environment substitution. The resulting [`Configuration`] is an
//! immutable value passed by reference to every component.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::defaults;
use crate::core::node::BuildConfiguration;
use crate::error::ConfigError;

/// Per-spec attribute overrides, applied before node construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecOverride {
    #[serde(default)]
    pub module_name: Option<String>,

    #[serde(default)]
    pub static_framework: Option<bool>,

    #[serde(default)]
    pub build_configuration: Option<BuildConfiguration>,

    #[serde(default)]
    pub version: Option<String>,
}

/// Effective configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Name of the consuming Xcode project
    #[serde(default)]
    pub project_name: Option<String>,

    /// Overrides keyed by spec or root name
    #[serde(default)]
    pub spec_overrides: BTreeMap<String, SpecOverride>,

    /// Subspecs split across several consumer targets
    #[serde(default)]
    pub subspecs_to_split: Vec<String>,

    /// Roots that are never built
    #[serde(default)]
    pub skip_pods: Vec<String>,

    /// Paths (relative to a pod's source root) left out of fingerprints
    #[serde(default)]
    pub hash_ignore: Vec<String>,

    /// Directories searched for development pods when switching
    #[serde(default)]
    pub development_pods_paths: Vec<String>,

    /// Downgrade unsafe split configurations to warnings
    #[serde(default)]
    pub allow_warnings: bool,

    /// Keep the scratch project around and open it on failure
    #[serde(default)]
    pub debug: bool,

    /// Path of the resolved graph snapshot, relative to the project
    #[serde(default = "default_resolved_graph")]
    pub resolved_graph: String,

    /// Ignore reuse records for this invocation
    #[serde(skip)]
    pub force_rebuild: bool,
}

fn default_resolved_graph() -> String {
    defaults::RESOLVED_GRAPH_PATH.to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            project_name: None,
            spec_overrides: BTreeMap::new(),
            subspecs_to_split: Vec::new(),
            skip_pods: Vec::new(),
            hash_ignore: Vec::new(),
            development_pods_paths: Vec::new(),
            allow_warnings: false,
            debug: false,
            resolved_graph: default_resolved_graph(),
            force_rebuild: false,
        }
    }
}

impl Configuration {
    /// Load the project configuration, layered over the global one
    ///
    /// Missing files are not an error; defaults apply.
    pub fn load(project_config: &Path, global_config: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::value::Table::new();

        for path in global_config.into_iter().chain(std::iter::once(project_config)) {
            if !path.exists() {
                continue;
            }
            let table = read_table(path)?;
            merge_toml_tables(&mut merged, &table);
            tracing::debug!("Loaded configuration from {}", path.display());
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: project_config.to_path_buf(),
                error: e.to_string(),
            })
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply command-line flags on top of file values
    #[must_use]
    pub fn with_cli_overrides(mut self, allow_warnings: bool, force_rebuild: bool, debug: bool) -> Self {
        self.allow_warnings |= allow_warnings;
        self.force_rebuild |= force_rebuild;
        self.debug |= debug;
        self
    }

    /// Whether `name` is configured to be split over several targets
    pub fn is_split(&self, name: &str) -> bool {
        self.subspecs_to_split.iter().any(|s| s == name)
    }

    /// Whether the root `root_name` is excluded from builds
    pub fn is_skipped(&self, root_name: &str) -> bool {
        self.skip_pods.iter().any(|s| s == root_name)
    }
}

fn read_table(path: &Path) -> Result<toml::value::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    substitute_in_value(&mut value).map_err(|error| ConfigError::Substitution {
        path: path.to_path_buf(),
        error,
    })?;

    match value {
        toml::Value::Table(table) => Ok(table),
        _ => Err(ConfigError::ParseError {
            path: path.to_path_buf(),
            error: "expected a table at the top level".to_string(),
        }),
    }
}

/// Substitute environment variables in a string using ${VAR} syntax.
///
/// Unset variables expand to an empty string.
///
/// # Examples
/// ```
/// use podbuilder::core::config::substitute_env_vars;
///
/// std::env::set_var("PODBUILDER_DOC_VAR", "hello");
/// let result = substitute_env_vars("prefix_${PODBUILDER_DOC_VAR}_suffix").unwrap();
/// assert_eq!(result, "prefix_hello_suffix");
/// std::env::remove_var("PODBUILDER_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> Result<String, String> {
    let re =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| format!("Invalid regex: {e}"))?;

    let mut last_end = 0;
    let mut output = String::new();

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        output.push_str(&input[last_end..full_match.start()]);
        output.push_str(&std::env::var(&cap[1]).unwrap_or_default());
        last_end = full_match.end();
    }

    output.push_str(&input[last_end..]);
    Ok(output)
}

fn substitute_in_value(value: &mut toml::Value) -> Result<(), String> {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Merge two TOML tables, with `override_table` values taking precedence.
fn merge_toml_tables(base: &mut toml::value::Table, override_table: &toml::value::Table) {
    for (key, override_value) in override_table {
        match (base.get_mut(key), override_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(override_table)) => {
                merge_toml_tables(base_table, override_table);
            }
            _ => {
                base.insert(key.clone(), override_value.clone());
            }
        }
    }
}
