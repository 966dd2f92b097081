//! Partition planning
//!
//! Turns the root names requested on the command line into disjoint,
//! configuration-homogeneous [`BuildPlanGroup`]s. Every validation runs before
//! anything is built; the first failing check aborts the whole request.

use std::fmt;

use crate::core::config::Configuration;
use crate::core::node::{BuildConfiguration, PackageNode, SUBSPEC_SEPARATOR};
use crate::core::resolver::{closure, dependency_order, DependencyGraph};
use crate::error::{PlanError, PodBuilderError};

/// Request token selecting every buildable root
pub const ALL_PODS: &str = "*";

/// Why a group was formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// A split subspec, built alone
    Subspec,
    /// Remaining debug-configured roots
    Debug,
    /// Remaining release-configured roots
    Release,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subspec => write!(f, "subspec"),
            Self::Debug => write!(f, "debug"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Nodes compiled together in one external build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlanGroup {
    pub kind: GroupKind,
    pub build_configuration: BuildConfiguration,
    /// Top-level requested nodes of this group
    pub targets: Vec<PackageNode>,
    /// Closure of `targets`, dependencies first, all built with
    /// `build_configuration`
    pub members: Vec<PackageNode>,
}

impl BuildPlanGroup {
    /// Short label used in logs and scratch directory names
    pub fn label(&self) -> String {
        match self.kind {
            GroupKind::Subspec => format!(
                "subspec-{}",
                self.targets
                    .first()
                    .map(|n| n.name.replace(SUBSPEC_SEPARATOR, "_"))
                    .unwrap_or_default()
            ),
            kind => kind.to_string(),
        }
    }

    /// Record key and artifact subdirectory a member's root is harvested to
    ///
    /// A split subspec's root gets the subspec's own name (`Firebase/Core`),
    /// so it never shares an artifact with the rest of its root.
    pub fn artifact_key(&self, node: &PackageNode) -> String {
        match (self.kind, self.targets.first()) {
            (GroupKind::Subspec, Some(target)) if target.root_name == node.root_name => {
                target.name.clone()
            }
            _ => node.root_name.clone(),
        }
    }

    /// Distinct root names among the members, in member order
    pub fn root_names(&self) -> Vec<String> {
        let mut roots: Vec<String> = Vec::new();
        for member in &self.members {
            if !roots.contains(&member.root_name) {
                roots.push(member.root_name.clone());
            }
        }
        roots
    }
}

/// Validated build plan
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub groups: Vec<BuildPlanGroup>,
    /// Non-fatal findings (downgraded unsafe split configurations)
    pub warnings: Vec<String>,
}

/// Nodes that may be compiled: not vendored and not skipped
pub fn buildable_nodes<'a>(nodes: &'a [PackageNode], config: &Configuration) -> Vec<&'a PackageNode> {
    nodes
        .iter()
        .filter(|n| !n.is_prebuilt() && !config.is_skipped(&n.root_name))
        .collect()
}

/// Distinct root names of `nodes`, in order
pub fn root_names<'a>(nodes: impl IntoIterator<Item = &'a PackageNode>) -> Vec<String> {
    let mut roots: Vec<String> = Vec::new();
    for node in nodes {
        if !roots.contains(&node.root_name) {
            roots.push(node.root_name.clone());
        }
    }
    roots
}

/// Validate a request and split it into build groups
pub fn plan(
    nodes: &[PackageNode],
    request: &[String],
    config: &Configuration,
) -> Result<BuildPlan, PodBuilderError> {
    check_not_requesting_subspecs(request)?;

    let buildable = buildable_nodes(nodes, config);
    let requested_roots = expand_request(request, &buildable)?;

    DependencyGraph::cross_root(nodes).topological_sort()?;

    let (requested, others): (Vec<&PackageNode>, Vec<&PackageNode>) = buildable
        .iter()
        .copied()
        .partition(|n| requested_roots.contains(&n.root_name));

    check_no_common_dependencies(&requested, &others)?;
    check_not_building_dependency(&requested, &others)?;
    check_build_configurations(&buildable)?;
    let warnings = check_split_subspecs_are_static(&buildable, config)?;

    let groups = partition(nodes, &requested, config)?;
    if groups.is_empty() {
        return Err(PlanError::NothingToBuild.into());
    }

    for group in &groups {
        tracing::info!(
            "Planned {} group: {} ({} members)",
            group.label(),
            group
                .targets
                .iter()
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            group.members.len()
        );
    }

    Ok(BuildPlan { groups, warnings })
}

/// Reject subspec names before touching the graph
pub fn check_not_requesting_subspecs(request: &[String]) -> Result<(), PlanError> {
    for name in request {
        if let Some((root, _)) = name.split_once(SUBSPEC_SEPARATOR) {
            return Err(PlanError::InvalidRequest {
                name: name.clone(),
                root: root.to_string(),
            });
        }
    }
    Ok(())
}

/// Resolve `*` and check every requested root exists among `candidates`
pub fn expand_request(
    request: &[String],
    candidates: &[&PackageNode],
) -> Result<Vec<String>, PlanError> {
    let available = root_names(candidates.iter().copied());

    if request.iter().any(|r| r == ALL_PODS) {
        return Ok(available);
    }

    let mut roots: Vec<String> = Vec::new();
    for name in request {
        if !available.contains(name) {
            let mut sorted = available.clone();
            sorted.sort();
            return Err(PlanError::UnknownPackage {
                name: name.clone(),
                available: sorted,
            });
        }
        if !roots.contains(name) {
            roots.push(name.clone());
        }
    }
    Ok(roots)
}

/// A requested node and a non-requested one must not share a dependency,
/// unless the non-requested node is itself pulled in as a dependency or the
/// dependency is one of its own root's specs (nested subspecs included).
fn check_no_common_dependencies(
    requested: &[&PackageNode],
    others: &[&PackageNode],
) -> Result<(), PlanError> {
    for pod in requested {
        for dependency in &pod.dependency_names {
            for other in others {
                if pod.depends_on(&other.name) {
                    continue;
                }
                if other.depends_on(dependency) && !other.has_common_spec(dependency) {
                    let mut suggestion = root_names(requested.iter().copied());
                    if !suggestion.contains(&other.root_name) {
                        suggestion.push(other.root_name.clone());
                    }
                    return Err(PlanError::ConflictingDependency {
                        package: pod.name.clone(),
                        dependency: dependency.clone(),
                        other: other.name.clone(),
                        suggestion,
                    });
                }
            }
        }
    }
    Ok(())
}

/// A requested node must not be a dependency of a non-requested node
fn check_not_building_dependency(
    requested: &[&PackageNode],
    others: &[&PackageNode],
) -> Result<(), PlanError> {
    for pod in requested {
        if let Some(parent) = others.iter().find(|o| o.depends_on(&pod.name)) {
            return Err(PlanError::RequestsDependency {
                package: pod.name.clone(),
                parent: parent.name.clone(),
                parent_root: parent.root_name.clone(),
            });
        }
    }
    Ok(())
}

/// Nodes sharing a (cross-root) dependency must share a configuration
fn check_build_configurations(buildable: &[&PackageNode]) -> Result<(), PlanError> {
    for pod in buildable {
        let pod_dependencies: Vec<&String> = pod
            .dependency_names
            .iter()
            .filter(|d| !pod.has_common_spec(d))
            .collect();
        if pod_dependencies.is_empty() {
            continue;
        }

        let unaligned: Vec<String> = buildable
            .iter()
            .filter(|other| other.name != pod.name)
            .filter(|other| {
                other
                    .dependency_names
                    .iter()
                    .any(|d| pod_dependencies.contains(&d) && !other.has_common_spec(d))
            })
            .filter(|other| other.build_configuration != pod.build_configuration)
            .map(|other| other.name.clone())
            .collect();

        if !unaligned.is_empty() {
            return Err(PlanError::BuildConfigMismatch {
                package: pod.name.clone(),
                configuration: pod.build_configuration.to_string(),
                others: unaligned,
            });
        }
    }
    Ok(())
}

/// Split subspecs must be static; otherwise warn or fail
fn check_split_subspecs_are_static(
    buildable: &[&PackageNode],
    config: &Configuration,
) -> Result<Vec<String>, PlanError> {
    let names: Vec<String> = buildable
        .iter()
        .filter(|n| config.is_split(&n.name) && !n.is_static)
        .map(|n| n.name.clone())
        .collect();

    if names.is_empty() {
        return Ok(Vec::new());
    }

    let err = PlanError::UnsafeSplitConfig { names };
    if config.allow_warnings {
        tracing::warn!("{err}");
        Ok(vec![err.to_string()])
    } else {
        Err(err)
    }
}

fn partition(
    all_nodes: &[PackageNode],
    requested: &[&PackageNode],
    config: &Configuration,
) -> Result<Vec<BuildPlanGroup>, PodBuilderError> {
    // Dependencies of other requested nodes are pulled in by closure
    let top_level: Vec<&PackageNode> = requested
        .iter()
        .copied()
        .filter(|n| {
            !requested
                .iter()
                .any(|other| other.name != n.name && other.depends_on(&n.name))
        })
        .collect();

    let mut groups = Vec::new();

    let (split, rest): (Vec<&PackageNode>, Vec<&PackageNode>) = top_level
        .into_iter()
        .partition(|n| n.is_subspec() && config.is_split(&n.name));

    for node in split {
        groups.push(make_group(
            all_nodes,
            GroupKind::Subspec,
            node.build_configuration,
            vec![node],
        )?);
    }

    let (debug, release): (Vec<&PackageNode>, Vec<&PackageNode>) = rest
        .into_iter()
        .partition(|n| n.build_configuration == BuildConfiguration::Debug);

    if !debug.is_empty() {
        groups.push(make_group(all_nodes, GroupKind::Debug, BuildConfiguration::Debug, debug)?);
    }
    if !release.is_empty() {
        groups.push(make_group(
            all_nodes,
            GroupKind::Release,
            BuildConfiguration::Release,
            release,
        )?);
    }

    Ok(groups)
}

fn make_group(
    all_nodes: &[PackageNode],
    kind: GroupKind,
    build_configuration: BuildConfiguration,
    targets: Vec<&PackageNode>,
) -> Result<BuildPlanGroup, PodBuilderError> {
    let targets: Vec<PackageNode> = targets.into_iter().cloned().collect();
    let closed = closure(all_nodes, &targets)?;
    let members = dependency_order(&closed)?
        .iter()
        .map(|n| n.with_build_configuration(build_configuration))
        .collect();

    Ok(BuildPlanGroup {
        kind,
        build_configuration,
        targets,
        members,
    })
}
