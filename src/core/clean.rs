//! Clean logic
//!
//! Removes what podbuilder left behind for pods that are no longer part of the
//! resolved graph: their harvested artifacts, debug symbols, records and
//! metadata. The scratch build directory is removed as well.

use std::path::PathBuf;

use crate::core::node::PackageNode;
use crate::core::records::RecordStore;
use crate::core::results::BuildResults;
use crate::error::FilesystemError;
use crate::infra::dirs::PodBuilderDirs;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Record keys (roots or split subspecs) whose artifacts were dropped
    pub removed_roots: Vec<String>,
    /// Paths that were deleted
    pub removed_paths: Vec<PathBuf>,
}

impl CleanResult {
    pub fn is_empty(&self) -> bool {
        self.removed_roots.is_empty() && self.removed_paths.is_empty()
    }
}

/// Keys of records that no node of the graph belongs to
///
/// A split subspec's record goes stale when the subspec leaves the graph,
/// even if its root stays.
pub fn stale_keys(nodes: &[PackageNode], records: &RecordStore) -> Vec<String> {
    records
        .iter()
        .filter(|record| match record.subspec.as_deref() {
            Some(subspec) => !nodes.iter().any(|n| n.name == subspec),
            None => !nodes.iter().any(|n| n.root_name == record.root_name),
        })
        .map(|record| record.key().to_string())
        .collect()
}

/// Remove stale roots and the scratch directory
///
/// `records` and `results` are updated in memory; saving them is up to the
/// caller.
pub fn clean_project(
    dirs: &PodBuilderDirs,
    nodes: &[PackageNode],
    records: &mut RecordStore,
    results: &mut BuildResults,
) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    for key in stale_keys(nodes, records) {
        let Some(record) = records.remove(&key) else {
            continue;
        };

        let artifact = dirs.prebuilt_dir().join(&record.artifact_path);
        if artifact.exists() {
            filesystem::remove_path(&artifact)?;
            result.removed_paths.push(artifact);
        }

        let dsym = dirs.dsym_dir().join(record.build_configuration.to_string());
        if record.subspec.is_some() {
            let split_dsym = dsym.join(&key);
            if split_dsym.exists() {
                filesystem::remove_path(&split_dsym)?;
                result.removed_paths.push(split_dsym);
            }
        } else if let Ok(entries) = std::fs::read_dir(&dsym) {
            let prefix = format!("{}.", record.module_name);
            for entry in entries.filter_map(Result::ok) {
                let is_match = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(&prefix));
                if is_match {
                    filesystem::remove_path(&entry.path())?;
                    result.removed_paths.push(entry.path());
                }
            }
        }

        if record.subspec.is_some() {
            results.metadata.remove(&key);
        } else {
            results.remove_root(&key);
        }
        tracing::info!("Removed stale prebuilt pod {key}");
        result.removed_roots.push(key);
    }

    let scratch = dirs.build_dir();
    if scratch.exists() {
        filesystem::remove_dir_all(&scratch)?;
        result.removed_paths.push(scratch);
    }

    Ok(result)
}
