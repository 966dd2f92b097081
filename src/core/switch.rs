//! Reference switching
//!
//! Decides, per node of the named roots, whether the integrating project
//! should link the harvested artifact, a local development checkout or the
//! original source declaration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::config::Configuration;
use crate::core::node::{PackageNode, Provenance};
use crate::core::planner::{check_not_requesting_subspecs, root_names, ALL_PODS};
use crate::core::records::RecordStore;
use crate::error::{PlanError, PodBuilderError, SwitchError};

/// How the named pods should be referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchMode {
    Prebuilt,
    Development,
    Default,
}

/// Where the integrating project should take a node from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReferenceDescriptor {
    /// Harvested artifact directory
    Prebuilt { path: PathBuf },
    /// Local development checkout
    Development { path: PathBuf },
    /// Original source declaration
    Source {
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        git: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
}

impl ReferenceDescriptor {
    /// Source reference matching a node's provenance
    pub fn source_of(node: &PackageNode) -> Self {
        match &node.provenance {
            Provenance::Git {
                repo_url,
                tag,
                commit,
                branch,
            } => Self::Source {
                version: node.version.clone(),
                git: Some(repo_url.clone()),
                tag: tag.clone(),
                commit: commit.clone(),
                branch: branch.clone(),
            },
            Provenance::Local { path } => Self::Development {
                path: PathBuf::from(path),
            },
            Provenance::Registry { .. } => Self::Source {
                version: node.version.clone(),
                git: None,
                tag: None,
                commit: None,
                branch: None,
            },
        }
    }
}

/// Build references for every node belonging to the requested roots
///
/// `names` are root names or [`ALL_PODS`]. Subspec names are rejected the same
/// way `build` rejects them.
pub fn switch_references(
    nodes: &[PackageNode],
    names: &[String],
    mode: SwitchMode,
    records: &RecordStore,
    prebuilt_dir: &Path,
    development_roots: &[PathBuf],
) -> Result<BTreeMap<String, ReferenceDescriptor>, PodBuilderError> {
    check_not_requesting_subspecs(names)?;

    let available = root_names(nodes);
    let roots: Vec<String> = if names.iter().any(|n| n == ALL_PODS) {
        available.clone()
    } else {
        for name in names {
            if !available.contains(name) {
                return Err(PlanError::UnknownPackage {
                    name: name.clone(),
                    available: available.clone(),
                }
                .into());
            }
        }
        names.to_vec()
    };

    let mut references = BTreeMap::new();
    for root in &roots {
        let development = match mode {
            SwitchMode::Development => Some(find_development_source(root, development_roots)?),
            _ => None,
        };

        for node in nodes.iter().filter(|n| &n.root_name == root) {
            let reference = match mode {
                SwitchMode::Prebuilt => {
                    let record = records.for_node(node).ok_or_else(|| SwitchError::NotPrebuilt {
                        name: root.clone(),
                    })?;
                    ReferenceDescriptor::Prebuilt {
                        path: prebuilt_dir.join(&record.artifact_path),
                    }
                }
                SwitchMode::Development => ReferenceDescriptor::Development {
                    path: development.clone().unwrap_or_default(),
                },
                SwitchMode::Default => ReferenceDescriptor::source_of(node),
            };
            tracing::debug!("{}: {:?}", node.name, reference);
            references.insert(node.name.clone(), reference);
        }
    }

    Ok(references)
}

/// Look for `<root>.podspec` or `<root>.podspec.json` under the search roots
pub fn find_development_source(root_name: &str, search_roots: &[PathBuf]) -> Result<PathBuf, SwitchError> {
    let candidates = [format!("{root_name}.podspec"), format!("{root_name}.podspec.json")];

    for search_root in search_roots {
        let found = WalkDir::new(search_root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| {
                entry.file_type().is_file()
                    && candidates
                        .iter()
                        .any(|c| entry.file_name().to_str() == Some(c.as_str()))
            });
        if let Some(entry) = found {
            if let Some(parent) = entry.path().parent() {
                return Ok(parent.to_path_buf());
            }
        }
    }

    Err(SwitchError::DevelopmentSourceNotFound {
        name: root_name.to_string(),
        searched: search_roots.iter().map(|p| p.display().to_string()).collect(),
    })
}

/// Development search roots from the configuration, resolved against `project_root`
pub fn development_roots(config: &Configuration, project_root: &Path) -> Vec<PathBuf> {
    config
        .development_pods_paths
        .iter()
        .map(|p| {
            let path = Path::new(p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_root.join(path)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::test_support::nodes;
    use crate::core::node::BuildConfiguration;
    use crate::core::records::ReuseRecord;
    use tempfile::TempDir;

    fn record(root: &str) -> ReuseRecord {
        ReuseRecord {
            root_name: root.to_string(),
            content_hash: "00".repeat(32),
            build_configuration: BuildConfiguration::Release,
            artifact_path: PathBuf::from(root),
            version: "1.0.0".to_string(),
            module_name: root.to_string(),
            is_static: true,
            specs: vec![root.to_string()],
            subspec: None,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_prebuilt_references_every_subspec() {
        let all = nodes(&[("Firebase/Core", &[]), ("Firebase/Analytics", &["Firebase/Core"]), ("B", &[])]);
        let mut records = RecordStore::new();
        records.insert(record("Firebase"));

        let refs = switch_references(
            &all,
            &names(&["Firebase"]),
            SwitchMode::Prebuilt,
            &records,
            Path::new("/p/Prebuilt"),
            &[],
        )
        .unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(
            refs["Firebase/Analytics"],
            ReferenceDescriptor::Prebuilt {
                path: PathBuf::from("/p/Prebuilt/Firebase")
            }
        );
    }

    #[test]
    fn test_prebuilt_split_subspec_references_its_own_artifact() {
        let all = nodes(&[("Firebase/Core", &[]), ("Firebase/Analytics", &[])]);
        let mut records = RecordStore::new();
        records.insert(record("Firebase"));
        let mut split = record("Firebase");
        split.subspec = Some("Firebase/Core".to_string());
        split.artifact_path = PathBuf::from("Firebase/Core");
        records.insert(split);

        let refs = switch_references(
            &all,
            &names(&["Firebase"]),
            SwitchMode::Prebuilt,
            &records,
            Path::new("/p/Prebuilt"),
            &[],
        )
        .unwrap();

        assert_eq!(
            refs["Firebase/Core"],
            ReferenceDescriptor::Prebuilt {
                path: PathBuf::from("/p/Prebuilt/Firebase/Core")
            }
        );
        assert_eq!(
            refs["Firebase/Analytics"],
            ReferenceDescriptor::Prebuilt {
                path: PathBuf::from("/p/Prebuilt/Firebase")
            }
        );
    }

    #[test]
    fn test_prebuilt_without_record_fails() {
        let all = nodes(&[("A", &[])]);
        let err = switch_references(
            &all,
            &names(&["A"]),
            SwitchMode::Prebuilt,
            &RecordStore::new(),
            Path::new("/p"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, PodBuilderError::Switch(SwitchError::NotPrebuilt { .. })));
    }

    #[test]
    fn test_subspec_name_rejected() {
        let all = nodes(&[("Firebase/Core", &[])]);
        let err = switch_references(
            &all,
            &names(&["Firebase/Core"]),
            SwitchMode::Default,
            &RecordStore::new(),
            Path::new("/p"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PodBuilderError::Plan(PlanError::InvalidRequest { ref root, .. }) if root == "Firebase"
        ));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let all = nodes(&[("A", &[])]);
        let err = switch_references(
            &all,
            &names(&["Z"]),
            SwitchMode::Default,
            &RecordStore::new(),
            Path::new("/p"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, PodBuilderError::Plan(PlanError::UnknownPackage { .. })));
    }

    #[test]
    fn test_default_for_all_pods() {
        let all = nodes(&[("A", &[]), ("B", &["A"])]);
        let refs = switch_references(
            &all,
            &names(&["*"]),
            SwitchMode::Default,
            &RecordStore::new(),
            Path::new("/p"),
            &[],
        )
        .unwrap();
        assert_eq!(refs.len(), 2);
        assert!(matches!(refs["A"], ReferenceDescriptor::Source { ref version, .. } if version == "1.0.0"));
    }

    #[test]
    fn test_development_finds_podspec() {
        let dir = TempDir::new().unwrap();
        let pod_dir = dir.path().join("LocalPods/A");
        std::fs::create_dir_all(&pod_dir).unwrap();
        std::fs::write(pod_dir.join("A.podspec"), "Pod::Spec.new").unwrap();

        let all = nodes(&[("A", &[])]);
        let refs = switch_references(
            &all,
            &names(&["A"]),
            SwitchMode::Development,
            &RecordStore::new(),
            Path::new("/p"),
            &[dir.path().join("LocalPods")],
        )
        .unwrap();
        assert_eq!(refs["A"], ReferenceDescriptor::Development { path: pod_dir });
    }

    #[test]
    fn test_development_missing_lists_searched_paths() {
        let dir = TempDir::new().unwrap();
        let err = find_development_source("A", &[dir.path().to_path_buf()]).unwrap_err();
        match err {
            SwitchError::DevelopmentSourceNotFound { name, searched } => {
                assert_eq!(name, "A");
                assert_eq!(searched.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reference_serializes_with_kind_tag() {
        let json = serde_json::to_string(&ReferenceDescriptor::Prebuilt {
            path: PathBuf::from("Prebuilt/A"),
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"prebuilt\""));
    }
}
