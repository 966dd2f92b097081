//! Accumulated build results
//!
//! Licenses and per-root artifact metadata collected across groups and
//! persisted once the command finishes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::node::{BuildConfiguration, SUBSPEC_SEPARATOR};
use crate::core::records::ReuseRecord;
use crate::core::switch::ReferenceDescriptor;

/// License of a built root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LicenseEntry {
    pub title: String,
    #[serde(default)]
    pub license_type: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// What was harvested for one root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Specs (root and subspecs) included in the artifact
    pub specs: Vec<String>,
    pub version: String,
    pub module_name: String,
    pub is_static: bool,
    pub build_configuration: BuildConfiguration,
    /// Relative to the prebuilt directory
    pub artifact_path: PathBuf,
}

impl From<&ReuseRecord> for ArtifactMetadata {
    fn from(record: &ReuseRecord) -> Self {
        Self {
            specs: record.specs.clone(),
            version: record.version.clone(),
            module_name: record.module_name.clone(),
            is_static: record.is_static,
            build_configuration: record.build_configuration,
            artifact_path: record.artifact_path.clone(),
        }
    }
}

impl ArtifactMetadata {
    /// Fold a newer entry for the same root into this one
    ///
    /// Spec lists are unioned; scalar fields come from `newer`.
    pub fn merge(&mut self, newer: Self) {
        let mut specs = std::mem::take(&mut self.specs);
        for spec in newer.specs {
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
        *self = Self { specs, ..newer };
    }
}

/// Licenses and metadata accumulated over a command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResults {
    #[serde(default)]
    pub licenses: Vec<LicenseEntry>,
    #[serde(default)]
    pub metadata: BTreeMap<String, ArtifactMetadata>,
}

impl BuildResults {
    /// Fold `newer` into `self`
    pub fn merge(&mut self, newer: BuildResults) {
        for license in newer.licenses {
            if !self.licenses.contains(&license) {
                self.licenses.push(license);
            }
        }
        for (root, metadata) in newer.metadata {
            match self.metadata.get_mut(&root) {
                Some(existing) => existing.merge(metadata),
                None => {
                    self.metadata.insert(root, metadata);
                }
            }
        }
    }

    /// Drop everything known about a root, split subspec artifacts included
    pub fn remove_root(&mut self, root_name: &str) {
        let prefix = format!("{root_name}{SUBSPEC_SEPARATOR}");
        self.metadata
            .retain(|key, _| key != root_name && !key.starts_with(&prefix));
        self.licenses.retain(|l| l.title != root_name);
    }

    /// Prebuilt references for every harvested spec
    pub fn references(&self, prebuilt_dir: &Path) -> BTreeMap<String, ReferenceDescriptor> {
        let mut references = BTreeMap::new();
        for metadata in self.metadata.values() {
            for spec in &metadata.specs {
                references.insert(
                    spec.clone(),
                    ReferenceDescriptor::Prebuilt {
                        path: prebuilt_dir.join(&metadata.artifact_path),
                    },
                );
            }
        }
        references
    }
}
