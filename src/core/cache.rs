//! Cache reuse decisions
//!
//! Before a group is built, every root in it is checked against its
//! [`ReuseRecord`]: if the source fingerprint, version and configuration
//! still match and the harvested artifact is still on disk, the previous
//! artifact is reused instead of compiling again. Anything unexpected,
//! including an unreadable source tree, resolves to a rebuild.
//!
//! Records are looked up by key: the root name, or the subspec's full name
//! for a root built inside a split subspec group.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::config::Configuration;
use crate::core::fingerprint::fingerprint_tree;
use crate::core::node::{PackageNode, Provenance};
use crate::core::planner::BuildPlanGroup;
use crate::core::records::{RecordStore, ReuseRecord};

/// Why a root has to be rebuilt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// No previous build recorded
    NoRecord,
    /// Sources changed since the recorded build
    HashMismatch,
    /// Explicitly requested by the caller
    ForceRebuild,
    /// Recorded build used another configuration
    ConfigurationChanged,
    /// Recorded build was for another version
    VersionChanged { from: String, to: String },
    /// Harvested artifact no longer on disk
    ArtifactMissing,
    /// Artifact was built without some of the subspecs now needed
    MissingSubspecs(Vec<String>),
    /// Source tree couldn't be hashed
    UnreadableSource(String),
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecord => write!(f, "no record"),
            Self::HashMismatch => write!(f, "hash mismatch"),
            Self::ForceRebuild => write!(f, "forced rebuild"),
            Self::ConfigurationChanged => write!(f, "configuration changed"),
            Self::VersionChanged { from, to } => write!(f, "version changed ({from} -> {to})"),
            Self::ArtifactMissing => write!(f, "artifact missing"),
            Self::MissingSubspecs(names) => write!(f, "artifact lacks {}", names.join(", ")),
            Self::UnreadableSource(error) => write!(f, "unreadable source: {error}"),
        }
    }
}

/// What to do with one root of a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Ships its own binary or is skipped by configuration; never compiled
    Vendored,
    /// Previous artifact is still valid
    Reuse(ReuseRecord),
    /// Has to be compiled
    Rebuild(RebuildReason),
}

/// Reuse decision for one root name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseDecision {
    pub root_name: String,
    /// Record key the decision was taken against
    pub key: String,
    pub disposition: Disposition,
    /// Fingerprint computed for this run, when hashing succeeded
    pub content_hash: Option<String>,
}

impl ReuseDecision {
    /// Whether the root needs compiling
    pub fn needs_build(&self) -> bool {
        matches!(self.disposition, Disposition::Rebuild(_))
    }

    /// Record to reuse, if any
    pub fn reused(&self) -> Option<&ReuseRecord> {
        match &self.disposition {
            Disposition::Reuse(record) => Some(record),
            _ => None,
        }
    }
}

/// Maps nodes to the directory their sources are hashed from
#[derive(Debug, Clone)]
pub struct SourceLocator {
    project_root: PathBuf,
    checkouts_dir: PathBuf,
}

impl SourceLocator {
    pub fn new(project_root: &Path, checkouts_dir: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            checkouts_dir: checkouts_dir.to_path_buf(),
        }
    }

    /// Development pods hash their local directory; everything else hashes
    /// the downloaded working copy of its root.
    pub fn source_dir(&self, node: &PackageNode) -> PathBuf {
        match &node.provenance {
            Provenance::Local { path } => self.project_root.join(path),
            Provenance::Registry { .. } | Provenance::Git { .. } => {
                self.checkouts_dir.join(&node.root_name)
            }
        }
    }
}

/// Decides reuse versus rebuild for the roots of a group
pub struct ReuseEngine<'a> {
    records: &'a RecordStore,
    locator: &'a SourceLocator,
    prebuilt_dir: &'a Path,
    config: &'a Configuration,
}

impl<'a> ReuseEngine<'a> {
    pub fn new(
        records: &'a RecordStore,
        locator: &'a SourceLocator,
        prebuilt_dir: &'a Path,
        config: &'a Configuration,
    ) -> Self {
        Self {
            records,
            locator,
            prebuilt_dir,
            config,
        }
    }

    /// One decision per distinct root among `members`, in first-seen order,
    /// each checked against the root's own record
    pub fn decide(&self, members: &[PackageNode]) -> Vec<ReuseDecision> {
        self.decide_keyed(members, |node| node.root_name.clone())
    }

    /// Decisions for the members of a planned group, checked against the
    /// records that group writes
    pub fn decide_group(&self, group: &BuildPlanGroup, members: &[PackageNode]) -> Vec<ReuseDecision> {
        self.decide_keyed(members, |node| group.artifact_key(node))
    }

    fn decide_keyed(
        &self,
        members: &[PackageNode],
        key_of: impl Fn(&PackageNode) -> String,
    ) -> Vec<ReuseDecision> {
        let mut decisions: Vec<ReuseDecision> = Vec::new();
        for node in members {
            if decisions.iter().any(|d| d.root_name == node.root_name) {
                continue;
            }
            let decision = self.decide_root(node, key_of(node), members);
            match &decision.disposition {
                Disposition::Rebuild(reason) => {
                    tracing::info!("{}: rebuild ({reason})", decision.key);
                }
                Disposition::Reuse(_) => {
                    tracing::info!("{}: reusing prebuilt artifact", decision.key);
                }
                Disposition::Vendored => {
                    tracing::debug!("{}: vendored, nothing to build", decision.key);
                }
            }
            decisions.push(decision);
        }
        decisions
    }

    fn decide_root(&self, node: &PackageNode, key: String, members: &[PackageNode]) -> ReuseDecision {
        let root_name = node.root_name.clone();
        let siblings: Vec<&PackageNode> = members.iter().filter(|m| m.root_name == root_name).collect();

        if self.config.is_skipped(&root_name) || siblings.iter().all(|m| m.is_prebuilt()) {
            return ReuseDecision {
                root_name,
                key,
                disposition: Disposition::Vendored,
                content_hash: None,
            };
        }

        let content_hash = match self.fingerprint(node) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!("{root_name}: failed to hash sources: {e}");
                return ReuseDecision {
                    root_name,
                    key,
                    disposition: Disposition::Rebuild(RebuildReason::UnreadableSource(e.to_string())),
                    content_hash: None,
                };
            }
        };

        let disposition = if self.config.force_rebuild {
            Disposition::Rebuild(RebuildReason::ForceRebuild)
        } else {
            match self.records.get(&key) {
                None => Disposition::Rebuild(RebuildReason::NoRecord),
                Some(record) => self.compare(node, &siblings, record, content_hash.as_deref()),
            }
        };

        ReuseDecision {
            root_name,
            key,
            disposition,
            content_hash,
        }
    }

    fn compare(
        &self,
        node: &PackageNode,
        siblings: &[&PackageNode],
        record: &ReuseRecord,
        hash: Option<&str>,
    ) -> Disposition {
        if record.version != node.version {
            return Disposition::Rebuild(RebuildReason::VersionChanged {
                from: record.version.clone(),
                to: node.version.clone(),
            });
        }
        if record.build_configuration != node.build_configuration {
            return Disposition::Rebuild(RebuildReason::ConfigurationChanged);
        }
        if hash != Some(record.content_hash.as_str()) {
            return Disposition::Rebuild(RebuildReason::HashMismatch);
        }
        if !self.prebuilt_dir.join(&record.artifact_path).exists() {
            return Disposition::Rebuild(RebuildReason::ArtifactMissing);
        }
        let missing: Vec<String> = siblings
            .iter()
            .filter(|m| !record.specs.contains(&m.name))
            .map(|m| m.name.clone())
            .collect();
        if !missing.is_empty() {
            return Disposition::Rebuild(RebuildReason::MissingSubspecs(missing));
        }
        Disposition::Reuse(record.clone())
    }

    /// Fingerprint of a node's current sources
    pub fn fingerprint(&self, node: &PackageNode) -> std::io::Result<String> {
        fingerprint_tree(&self.locator.source_dir(node), &self.config.hash_ignore)
    }
}
