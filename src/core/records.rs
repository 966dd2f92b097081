//! Reuse record store
//!
//! One [`ReuseRecord`] per root name describes the last successful build of
//! that root: the fingerprint of the sources it was built from and where its
//! artifact was harvested to. A subspec built split from its root gets a
//! record of its own, keyed by the subspec's full name. The store is read before every plan execution
//! and written only after a group completes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults::RECORDS_VERSION;
use crate::core::node::{BuildConfiguration, PackageNode};
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Record store structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordStore {
    /// Store format version
    pub version: u32,

    /// Records keyed by root name
    #[serde(default)]
    pub records: BTreeMap<String, ReuseRecord>,
}

/// Last successful build of a root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReuseRecord {
    pub root_name: String,

    /// Fingerprint of the source tree the artifact was built from
    pub content_hash: String,

    pub build_configuration: BuildConfiguration,

    /// Artifact directory, relative to the prebuilt directory
    pub artifact_path: PathBuf,

    pub version: String,

    pub module_name: String,

    #[serde(default)]
    pub is_static: bool,

    /// Specs (root and subspecs) included in the artifact
    #[serde(default)]
    pub specs: Vec<String>,

    /// Set when a split subspec was built into an artifact of its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subspec: Option<String>,
}

impl ReuseRecord {
    /// Store key: the split subspec's name, otherwise the root name
    pub fn key(&self) -> &str {
        self.subspec.as_deref().unwrap_or(&self.root_name)
    }
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            version: RECORDS_VERSION,
            records: BTreeMap::new(),
        }
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load the store, or an empty one if the file doesn't exist
    ///
    /// An unreadable store is treated as empty: every root rebuilds.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        match filesystem::read_file(path).map(|content| Self::from_toml(&content)) {
            Ok(Ok(store)) => store,
            Ok(Err(e)) => {
                tracing::warn!("Ignoring corrupt record store {}: {e}", path.display());
                Self::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable record store: {e}");
                Self::new()
            }
        }
    }

    /// Write the store to disk
    pub fn save(&self, path: &Path) -> Result<(), FilesystemError> {
        let content = self.to_toml().map_err(|e| FilesystemError::WriteFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        filesystem::write_file(path, &content)
    }

    /// Record for a root, or for a split subspec by its full name
    pub fn get(&self, key: &str) -> Option<&ReuseRecord> {
        self.records.get(key)
    }

    /// Record of the artifact a node is taken from: its own if it was built
    /// split, its root's otherwise
    pub fn for_node(&self, node: &PackageNode) -> Option<&ReuseRecord> {
        node.is_subspec()
            .then(|| self.records.get(&node.name))
            .flatten()
            .or_else(|| self.records.get(&node.root_name))
    }

    /// Add or replace a record
    pub fn insert(&mut self, record: ReuseRecord) {
        self.records.insert(record.key().to_string(), record);
    }

    /// Remove a record
    pub fn remove(&mut self, key: &str) -> Option<ReuseRecord> {
        self.records.remove(key)
    }

    /// Record keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Every record, in key order
    pub fn iter(&self) -> impl Iterator<Item = &ReuseRecord> {
        self.records.values()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
