//! Resolved graph loading
//!
//! Dependency resolution itself is CocoaPods' job. podbuilder consumes the
//! result as a JSON snapshot (`PodBuilder/resolved.json` by default) with the
//! resolved specs, their checkout options, platforms and targets.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::node::ResolvedGraph;
use crate::error::{BuildError, PodBuilderError};
use crate::infra::filesystem;

/// Source of the resolved dependency graph
pub trait ManifestResolver {
    /// Resolve the graph, refreshing spec repositories first if asked to
    fn resolve(&self, update_repos: bool) -> Result<ResolvedGraph, PodBuilderError>;
}

/// Reads a resolved graph snapshot from disk
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    path: PathBuf,
}

impl SnapshotResolver {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a snapshot from a JSON string
    pub fn parse(content: &str) -> Result<ResolvedGraph, serde_json::Error> {
        serde_json::from_str(content)
    }
}

impl ManifestResolver for SnapshotResolver {
    fn resolve(&self, update_repos: bool) -> Result<ResolvedGraph, PodBuilderError> {
        if update_repos {
            update_spec_repos()?;
        }

        let content = filesystem::read_file(&self.path).map_err(|e| PodBuilderError::Snapshot {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        let graph = Self::parse(&content).map_err(|e| PodBuilderError::Snapshot {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        tracing::debug!(
            "Loaded {} specs from {}",
            graph.specs.len(),
            self.path.display()
        );
        Ok(graph)
    }
}

/// Run `pod repo update`
pub fn update_spec_repos() -> Result<(), BuildError> {
    let pod = which::which("pod").map_err(|_| BuildError::ToolNotFound {
        tool: "pod".to_string(),
    })?;

    tracing::info!("Updating spec repositories");
    let output = Command::new(pod)
        .args(["repo", "update"])
        .output()
        .map_err(|e| BuildError::PrepareFailed {
            error: format!("failed to run pod repo update: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildError::PrepareFailed {
            error: format!("pod repo update failed: {}", stderr.trim()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{
        "specs": [
            {"name": "Alamofire", "version": "5.8.1"},
            {"name": "Firebase/Core", "version": "10.0.0", "dependencies": ["GoogleUtilities"]},
            {"name": "GoogleUtilities", "version": "7.11.0", "static_framework": true}
        ],
        "checkout_options": {
            "Alamofire": {"git": "https://github.com/Alamofire/Alamofire.git", "tag": "5.8.1"}
        },
        "platforms": ["ios 13.0"],
        "targets": {"App": ["Alamofire", "Firebase/Core"]}
    }"#;

    #[test]
    fn test_resolve_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resolved.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let graph = SnapshotResolver::new(&path).resolve(false).unwrap();
        assert_eq!(graph.specs.len(), 3);
        assert_eq!(graph.platforms, vec!["ios 13.0"]);
        assert!(graph.checkout_options.contains_key("Alamofire"));
        assert_eq!(graph.targets["App"].len(), 2);
    }

    #[test]
    fn test_missing_snapshot_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resolved.json");
        let err = SnapshotResolver::new(&path).resolve(false).unwrap_err();
        assert!(err.to_string().contains("resolved.json"));
    }

    #[test]
    fn test_invalid_snapshot() {
        assert!(SnapshotResolver::parse("{\"specs\": 3}").is_err());
    }
}
