//! Output persistence
//!
//! The reference map consumed by Podfile templating and the license and
//! artifact metadata files written next to the prebuilt frameworks.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::results::{ArtifactMetadata, BuildResults, LicenseEntry};
use crate::core::switch::ReferenceDescriptor;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Records where the integrating project should take each pod from
pub trait ManifestWriter {
    /// Merge `references` into what was written before
    fn write_references(&self, references: &BTreeMap<String, ReferenceDescriptor>) -> Result<(), FilesystemError>;
}

/// Keeps the reference map in a JSON file
#[derive(Debug, Clone)]
pub struct ReferenceFileWriter {
    path: PathBuf,
}

impl ReferenceFileWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Current reference map, empty when nothing was written yet
    pub fn load(&self) -> Result<BTreeMap<String, ReferenceDescriptor>, FilesystemError> {
        load_json(&self.path)
    }
}

impl ManifestWriter for ReferenceFileWriter {
    fn write_references(&self, references: &BTreeMap<String, ReferenceDescriptor>) -> Result<(), FilesystemError> {
        let mut all = self.load()?;
        all.extend(references.iter().map(|(k, v)| (k.clone(), v.clone())));
        tracing::debug!("Writing {} references to {}", all.len(), self.path.display());
        save_json(&self.path, &all)
    }
}

/// `Licenses.json` and `PodBuilder.json` in the prebuilt directory
#[derive(Debug, Clone)]
pub struct MetadataStore {
    licenses_path: PathBuf,
    metadata_path: PathBuf,
}

impl MetadataStore {
    pub fn new(licenses_path: &Path, metadata_path: &Path) -> Self {
        Self {
            licenses_path: licenses_path.to_path_buf(),
            metadata_path: metadata_path.to_path_buf(),
        }
    }

    /// Results persisted by earlier runs
    pub fn load(&self) -> Result<BuildResults, FilesystemError> {
        Ok(BuildResults {
            licenses: load_json::<Vec<LicenseEntry>>(&self.licenses_path)?,
            metadata: load_json::<BTreeMap<String, ArtifactMetadata>>(&self.metadata_path)?,
        })
    }

    /// Overwrite both files with `results`
    pub fn save(&self, results: &BuildResults) -> Result<(), FilesystemError> {
        let mut licenses = results.licenses.clone();
        licenses.sort();
        save_json(&self.licenses_path, &licenses)?;
        save_json(&self.metadata_path, &results.metadata)
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, FilesystemError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = filesystem::read_file(path)?;
    serde_json::from_str(&content).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FilesystemError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    filesystem::write_file(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::BuildConfiguration;
    use tempfile::TempDir;

    #[test]
    fn test_references_are_merged_across_writes() {
        let dir = TempDir::new().unwrap();
        let writer = ReferenceFileWriter::new(&dir.path().join("references.json"));

        let mut first = BTreeMap::new();
        first.insert(
            "A".to_string(),
            ReferenceDescriptor::Prebuilt {
                path: PathBuf::from("Prebuilt/A"),
            },
        );
        writer.write_references(&first).unwrap();

        let mut second = BTreeMap::new();
        second.insert(
            "B".to_string(),
            ReferenceDescriptor::Development {
                path: PathBuf::from("LocalPods/B"),
            },
        );
        writer.write_references(&second).unwrap();

        let all = writer.load().unwrap();
        assert_eq!(all.len(), 2);
        assert!(matches!(all["A"], ReferenceDescriptor::Prebuilt { .. }));
    }

    #[test]
    fn test_metadata_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::new(
            &dir.path().join("Licenses.json"),
            &dir.path().join("PodBuilder.json"),
        );
        assert_eq!(store.load().unwrap(), BuildResults::default());

        let mut results = BuildResults::default();
        results.licenses.push(LicenseEntry {
            title: "A".to_string(),
            license_type: Some("MIT".to_string()),
            text: "Permission is hereby granted".to_string(),
        });
        results.metadata.insert(
            "A".to_string(),
            ArtifactMetadata {
                specs: vec!["A".to_string()],
                version: "1.0.0".to_string(),
                module_name: "A".to_string(),
                is_static: false,
                build_configuration: BuildConfiguration::Debug,
                artifact_path: PathBuf::from("A"),
            },
        );
        store.save(&results).unwrap();
        assert_eq!(store.load().unwrap(), results);
    }

    #[test]
    fn test_corrupt_metadata_is_an_error() {
        let dir = TempDir::new().unwrap();
        let licenses = dir.path().join("Licenses.json");
        std::fs::write(&licenses, "[{").unwrap();
        let store = MetadataStore::new(&licenses, &dir.path().join("PodBuilder.json"));
        assert!(store.load().is_err());
    }
}
