//! Package node model
//!
//! A [`PackageNode`] is one resolvable unit (pod or subspec) of the resolved
//! dependency graph. Nodes are built once per planning pass from the raw
//! [`SpecMetadata`] returned by the manifest resolver, with checkout options
//! and configured overrides applied up front. They are never mutated after
//! construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::core::config::{Configuration, SpecOverride};
use crate::core::resolver::DependencyGraph;
use crate::error::SpecError;

/// Separator between a root name and a subspec name
pub const SUBSPEC_SEPARATOR: char = '/';

/// Returns the root component of a (possibly subspec) name
pub fn root_of(name: &str) -> &str {
    name.split(SUBSPEC_SEPARATOR).next().unwrap_or(name)
}

/// Build configuration of a compiled artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildConfiguration {
    Debug,
    #[default]
    Release,
}

impl BuildConfiguration {
    /// Name of the configuration as understood by xcodebuild
    pub fn xcode_name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Release => write!(f, "release"),
        }
    }
}

impl FromStr for BuildConfiguration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(other.to_string()),
        }
    }
}

/// Source location declared by a spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSource {
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Raw spec data as produced by the manifest resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub module_name: Option<String>,

    /// Direct dependency names
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub static_framework: bool,

    #[serde(default)]
    pub build_configuration: Option<String>,

    #[serde(default)]
    pub vendored_frameworks: Vec<String>,

    #[serde(default)]
    pub vendored_libraries: Vec<String>,

    #[serde(default)]
    pub source: SpecSource,
}

impl SpecMetadata {
    /// Returns a copy with the configured overrides applied
    #[must_use]
    pub fn with_overrides(&self, overrides: &SpecOverride) -> Self {
        let mut spec = self.clone();
        if let Some(module_name) = &overrides.module_name {
            spec.module_name = Some(module_name.clone());
        }
        if let Some(is_static) = overrides.static_framework {
            spec.static_framework = is_static;
        }
        if let Some(configuration) = overrides.build_configuration {
            spec.build_configuration = Some(configuration.to_string());
        }
        if let Some(version) = &overrides.version {
            spec.version = Some(version.clone());
        }
        spec
    }
}

/// Checkout options for a root, as found in the Podfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// The resolved dependency graph handed over by the manifest resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGraph {
    #[serde(default)]
    pub specs: Vec<SpecMetadata>,

    /// Checkout options keyed by root name
    #[serde(default)]
    pub checkout_options: BTreeMap<String, CheckoutOptions>,

    /// Supported platforms (e.g. `ios 13.0`)
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Target name -> pod names used by that target
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<String>>,
}

/// Where a node's sources come from
///
/// Exactly one kind is authoritative per node. All nodes of a root share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provenance {
    /// Published version from a spec repository
    Registry {
        version: String,
        repo_url: Option<String>,
    },
    /// External git checkout
    Git {
        repo_url: String,
        tag: Option<String>,
        commit: Option<String>,
        branch: Option<String>,
    },
    /// Local development pod
    Local { path: String },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry { version, .. } => write!(f, "{version}"),
            Self::Git {
                repo_url,
                tag,
                commit,
                branch,
            } => {
                write!(f, "{repo_url}")?;
                if let Some(tag) = tag {
                    write!(f, " tag:{tag}")?;
                } else if let Some(commit) = commit {
                    write!(f, " commit:{commit}")?;
                } else if let Some(branch) = branch {
                    write!(f, " branch:{branch}")?;
                }
                Ok(())
            }
            Self::Local { path } => write!(f, "path:{path}"),
        }
    }
}

/// One pod or subspec of the resolved graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    pub name: String,
    pub root_name: String,
    pub version: String,
    pub provenance: Provenance,
    /// Linkable name of the compiled artifact
    pub module_name: String,
    /// Dependencies declared by the spec itself
    pub direct_dependency_names: Vec<String>,
    /// Every name this node recursively requires, in discovery order
    pub dependency_names: Vec<String>,
    pub is_static: bool,
    pub build_configuration: BuildConfiguration,
    pub vendored_items: Vec<String>,
}

impl PackageNode {
    /// Construct a node from raw spec data
    ///
    /// `all_specs` is used to compute the recursive dependency names.
    pub fn new(
        spec: &SpecMetadata,
        all_specs: &[SpecMetadata],
        checkout_options: &BTreeMap<String, CheckoutOptions>,
        overrides: &BTreeMap<String, SpecOverride>,
    ) -> Result<Self, SpecError> {
        let graph = DependencyGraph::from_specs(all_specs);
        Self::with_graph(spec, &graph, checkout_options, overrides)
    }

    fn with_graph(
        spec: &SpecMetadata,
        graph: &DependencyGraph,
        checkout_options: &BTreeMap<String, CheckoutOptions>,
        overrides: &BTreeMap<String, SpecOverride>,
    ) -> Result<Self, SpecError> {
        let raw_name = spec.name.as_deref().map(str::trim).unwrap_or_default();
        if raw_name.is_empty() {
            return Err(SpecError::InvalidSpec {
                name: "<unnamed>".to_string(),
                field: "name".to_string(),
            });
        }
        let root_name = root_of(raw_name).to_string();

        let spec = match overrides.get(raw_name).or_else(|| overrides.get(&root_name)) {
            Some(o) => spec.with_overrides(o),
            None => spec.clone(),
        };

        let version = match spec.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                return Err(SpecError::InvalidSpec {
                    name: raw_name.to_string(),
                    field: "version".to_string(),
                })
            }
        };

        let build_configuration = match spec.build_configuration.as_deref() {
            Some(value) => value
                .parse()
                .map_err(|value| SpecError::InvalidBuildConfiguration {
                    name: raw_name.to_string(),
                    value,
                })?,
            None => BuildConfiguration::default(),
        };

        let provenance = resolve_provenance(&version, &spec.source, checkout_options.get(&root_name));

        let module_name = spec
            .module_name
            .clone()
            .unwrap_or_else(|| default_module_name(&root_name));

        let direct_dependency_names = dedup(spec.dependencies.iter().cloned());
        let dependency_names = graph.reachable_from(&direct_dependency_names);

        let vendored_items = spec
            .vendored_frameworks
            .iter()
            .chain(spec.vendored_libraries.iter())
            .cloned()
            .collect();

        Ok(Self {
            name: raw_name.to_string(),
            root_name,
            version,
            provenance,
            module_name,
            direct_dependency_names,
            dependency_names,
            is_static: spec.static_framework,
            build_configuration,
            vendored_items,
        })
    }

    /// Whether this node is a subspec (`Root/Sub`)
    pub fn is_subspec(&self) -> bool {
        self.name != self.root_name
    }

    /// Whether the node already ships a compiled binary of itself
    pub fn is_prebuilt(&self) -> bool {
        self.vendored_items.iter().any(|item| {
            Path::new(item).components().any(|component| {
                Path::new(component.as_os_str())
                    .file_stem()
                    .is_some_and(|stem| stem == self.root_name.as_str())
            })
        })
    }

    /// Whether the node is a local development pod
    pub fn is_development(&self) -> bool {
        matches!(self.provenance, Provenance::Local { .. })
    }

    /// True iff this node is a subspec and `candidate` is nested directly under it
    ///
    /// "Root matches" is read as `candidate`'s parent path: `Firebase/Core`
    /// has `Firebase/Core/Inner` but neither `Firebase/Core` itself nor
    /// `Firebase/Core/Inner/Deep`. Anything it accepts also satisfies
    /// [`Self::has_common_spec`].
    pub fn has_subspec(&self, candidate: &str) -> bool {
        self.is_subspec()
            && candidate
                .rsplit_once(SUBSPEC_SEPARATOR)
                .is_some_and(|(parent, _)| parent == self.name)
    }

    /// True iff `candidate` shares this node's root, nested subspecs included
    pub fn has_common_spec(&self, candidate: &str) -> bool {
        root_of(candidate) == self.root_name
    }

    /// Whether `name` is among this node's recursive dependencies
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependency_names.iter().any(|d| d == name)
    }

    /// Nodes of `available` this node depends on, in `available` order
    pub fn dependencies<'a>(&self, available: &'a [PackageNode]) -> Vec<&'a PackageNode> {
        available
            .iter()
            .filter(|node| self.depends_on(&node.name))
            .collect()
    }

    /// Closure of this node's direct dependencies over `all_nodes`
    pub fn recursive_dependency_names(&self, all_nodes: &[PackageNode]) -> Vec<String> {
        DependencyGraph::from_nodes(all_nodes).reachable_from(&self.direct_dependency_names)
    }

    /// Copy of this node built with another configuration
    #[must_use]
    pub fn with_build_configuration(&self, build_configuration: BuildConfiguration) -> Self {
        Self {
            build_configuration,
            ..self.clone()
        }
    }
}

impl fmt::Display for PackageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.provenance)
    }
}

/// Build every node of a resolved graph
///
/// Overrides from the configuration are applied before construction.
/// Duplicate names keep their first occurrence.
pub fn build_nodes(
    resolved: &ResolvedGraph,
    config: &Configuration,
) -> Result<Vec<PackageNode>, SpecError> {
    let graph = DependencyGraph::from_specs(&resolved.specs);
    let mut nodes: Vec<PackageNode> = Vec::with_capacity(resolved.specs.len());

    for spec in &resolved.specs {
        let node = PackageNode::with_graph(
            spec,
            &graph,
            &resolved.checkout_options,
            &config.spec_overrides,
        )?;
        if nodes.iter().any(|n| n.name == node.name) {
            tracing::debug!("Ignoring duplicate spec '{}'", node.name);
            continue;
        }
        nodes.push(node);
    }

    tracing::debug!("Built {} nodes from resolved graph", nodes.len());
    Ok(nodes)
}

fn resolve_provenance(
    version: &str,
    source: &SpecSource,
    checkout: Option<&CheckoutOptions>,
) -> Provenance {
    if let Some(checkout) = checkout {
        if let Some(path) = &checkout.path {
            return Provenance::Local { path: path.clone() };
        }
        if let Some(git) = &checkout.git {
            return Provenance::Git {
                repo_url: git.clone(),
                tag: checkout.tag.clone(),
                commit: checkout.commit.clone(),
                branch: checkout.branch.clone(),
            };
        }
    }

    Provenance::Registry {
        version: version.to_string(),
        repo_url: source.git.clone(),
    }
}

fn default_module_name(root_name: &str) -> String {
    let mut module: String = root_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if module.starts_with(|c: char| c.is_ascii_digit()) {
        module.insert(0, '_');
    }
    module
}

fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
