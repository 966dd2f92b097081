//! Build plan execution
//!
//! Each [`BuildPlanGroup`] goes through `Planned -> Hashing -> ReuseOnly |
//! Building -> Completed | Failed`. A group whose roots all resolve to reusable
//! artifacts never reaches the compiler; any other group is compiled with a
//! single [`Compiler::compile`] call, with reusable roots handed over as
//! prebuilt references so they are not recompiled.
//!
//! Groups run one after the other. A failed group aborts the plan but leaves
//! the artifacts of earlier groups (and their records) in place.
//!
//! Artifacts are harvested to `Prebuilt/<root>`, or `Prebuilt/<root>/<subspec>`
//! for a split subspec, so a root and its split subspecs never overwrite each
//! other.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::cache::{Disposition, RebuildReason, ReuseDecision, ReuseEngine, SourceLocator};
use crate::core::config::Configuration;
use crate::core::node::{BuildConfiguration, PackageNode};
use crate::core::planner::{BuildPlan, BuildPlanGroup, GroupKind};
use crate::core::records::{RecordStore, ReuseRecord};
use crate::core::resolver::{closure, dependency_order};
use crate::core::results::{ArtifactMetadata, BuildResults, LicenseEntry};
use crate::error::{BuildError, PodBuilderError};
use crate::infra::dirs::PodBuilderDirs;
use crate::infra::filesystem;

/// External compile step
///
/// Called at most once per group.
pub trait Compiler {
    /// Compile every [`UnitAction::Build`] unit of the request
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError>;

    /// Offer the scratch project for manual inspection after a failure
    fn open_for_inspection(&self, scratch_dir: &Path) -> Result<(), BuildError>;
}

/// What the compiler should do with one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitAction {
    /// Compile from source
    Build,
    /// Link the previously harvested artifact at this path
    Reuse(PathBuf),
    /// Ships its own binary
    Vendored,
}

/// One node of a compile request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub node: PackageNode,
    pub action: UnitAction,
}

/// Input of a single compiler invocation
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Group label, for logs and error messages
    pub label: String,
    pub build_configuration: BuildConfiguration,
    /// Freshly wiped scratch directory
    pub scratch_dir: PathBuf,
    /// Dependencies first
    pub units: Vec<CompileUnit>,
}

impl CompileRequest {
    /// Units that have to be compiled
    pub fn units_to_build(&self) -> impl Iterator<Item = &CompileUnit> {
        self.units.iter().filter(|u| u.action == UnitAction::Build)
    }
}

/// Artifact produced for one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArtifact {
    pub root_name: String,
    /// Framework or library inside the scratch directory
    pub path: PathBuf,
    pub debug_symbols: Vec<PathBuf>,
}

/// Output of a successful compiler invocation
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub artifacts: Vec<BuiltArtifact>,
    pub licenses: Vec<LicenseEntry>,
}

/// Lifecycle of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Planned,
    Hashing,
    ReuseOnly,
    Building,
    Completed,
    Failed,
}

impl GroupState {
    /// Whether `next` may follow `self`
    pub fn can_transition(self, next: GroupState) -> bool {
        use GroupState::{Building, Completed, Failed, Hashing, Planned, ReuseOnly};
        match (self, next) {
            (Planned, Hashing)
            | (Hashing, ReuseOnly | Building)
            | (ReuseOnly | Building, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planned => "planned",
            Self::Hashing => "hashing",
            Self::ReuseOnly => "reuse-only",
            Self::Building => "building",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// What happened to one group
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub label: String,
    pub kind: GroupKind,
    /// Every state the group went through, in order
    pub states: Vec<GroupState>,
    pub reused: Vec<String>,
    pub rebuilt: Vec<(String, RebuildReason)>,
    pub vendored: Vec<String>,
}

impl GroupReport {
    fn new(group: &BuildPlanGroup) -> Self {
        Self {
            label: group.label(),
            kind: group.kind,
            states: vec![GroupState::Planned],
            reused: Vec::new(),
            rebuilt: Vec::new(),
            vendored: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> GroupState {
        self.states.last().copied().unwrap_or(GroupState::Planned)
    }

    fn transition(&mut self, next: GroupState) {
        let current = self.state();
        debug_assert!(current.can_transition(next), "{current} -> {next}");
        tracing::debug!("Group {}: {current} -> {next}", self.label);
        self.states.push(next);
    }

    fn record_decisions(&mut self, decisions: &[ReuseDecision]) {
        for decision in decisions {
            match &decision.disposition {
                Disposition::Vendored => self.vendored.push(decision.key.clone()),
                Disposition::Reuse(_) => self.reused.push(decision.key.clone()),
                Disposition::Rebuild(reason) => {
                    self.rebuilt.push((decision.key.clone(), reason.clone()));
                }
            }
        }
    }
}

/// Runs build plans against a [`Compiler`]
pub struct Assembler<'a, C: Compiler + ?Sized> {
    compiler: &'a C,
    config: &'a Configuration,
    dirs: &'a PodBuilderDirs,
    locator: SourceLocator,
    records: RecordStore,
    reports: Vec<GroupReport>,
}

impl<'a, C: Compiler + ?Sized> Assembler<'a, C> {
    /// Create an assembler, loading the record store of the project
    pub fn new(compiler: &'a C, config: &'a Configuration, dirs: &'a PodBuilderDirs) -> Self {
        Self {
            compiler,
            config,
            dirs,
            locator: SourceLocator::new(dirs.project_root(), &dirs.checkouts_dir()),
            records: RecordStore::load(&dirs.records_path()),
            reports: Vec::new(),
        }
    }

    /// Current record store
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Reports of the groups executed so far, including a failed one
    pub fn reports(&self) -> &[GroupReport] {
        &self.reports
    }

    /// Members of a group with any missing transitive dependency added back,
    /// dependencies first
    pub fn assemble_members(
        &self,
        group: &BuildPlanGroup,
        all_nodes: &[PackageNode],
    ) -> Result<Vec<PackageNode>, PodBuilderError> {
        let closed = closure(all_nodes, &group.members)?;
        Ok(dependency_order(&closed)?
            .iter()
            .map(|n| n.with_build_configuration(group.build_configuration))
            .collect())
    }

    /// Reuse decisions for a group without executing it
    pub fn decisions(
        &self,
        group: &BuildPlanGroup,
        all_nodes: &[PackageNode],
    ) -> Result<Vec<ReuseDecision>, PodBuilderError> {
        let members = self.assemble_members(group, all_nodes)?;
        let prebuilt_dir = self.dirs.prebuilt_dir();
        Ok(ReuseEngine::new(&self.records, &self.locator, &prebuilt_dir, self.config)
            .decide_group(group, &members))
    }

    /// Execute every group of `plan` in order, folding results into `results`
    ///
    /// Stops at the first failing group.
    pub fn execute(
        &mut self,
        plan: &BuildPlan,
        all_nodes: &[PackageNode],
        results: &mut BuildResults,
    ) -> Result<(), PodBuilderError> {
        for group in &plan.groups {
            self.execute_group(group, all_nodes, results)?;
        }
        Ok(())
    }

    /// Execute a single group
    pub fn execute_group(
        &mut self,
        group: &BuildPlanGroup,
        all_nodes: &[PackageNode],
        results: &mut BuildResults,
    ) -> Result<(), PodBuilderError> {
        let mut report = GroupReport::new(group);
        let outcome = self.run_group(group, all_nodes, results, &mut report);
        if outcome.is_err() && !report.state().is_terminal() {
            report.transition(GroupState::Failed);
        }
        tracing::info!("Group {} {}", report.label, report.state());
        self.reports.push(report);
        outcome
    }

    fn run_group(
        &mut self,
        group: &BuildPlanGroup,
        all_nodes: &[PackageNode],
        results: &mut BuildResults,
        report: &mut GroupReport,
    ) -> Result<(), PodBuilderError> {
        report.transition(GroupState::Hashing);
        let members = self.assemble_members(group, all_nodes)?;
        let prebuilt_dir = self.dirs.prebuilt_dir();
        let decisions = ReuseEngine::new(&self.records, &self.locator, &prebuilt_dir, self.config)
            .decide_group(group, &members);
        report.record_decisions(&decisions);

        let mut group_results = BuildResults::default();
        for record in decisions.iter().filter_map(ReuseDecision::reused) {
            group_results
                .metadata
                .insert(record.key().to_string(), ArtifactMetadata::from(record));
        }

        if !decisions.iter().any(ReuseDecision::needs_build) {
            report.transition(GroupState::ReuseOnly);
            results.merge(group_results);
            report.transition(GroupState::Completed);
            return Ok(());
        }

        report.transition(GroupState::Building);
        let scratch_dir = self.dirs.build_dir();
        filesystem::reset_dir(&scratch_dir)?;

        let request = CompileRequest {
            label: group.label(),
            build_configuration: group.build_configuration,
            scratch_dir: scratch_dir.clone(),
            units: members
                .iter()
                .map(|node| CompileUnit {
                    node: node.clone(),
                    action: unit_action(node, &decisions, &prebuilt_dir),
                })
                .collect(),
        };

        tracing::info!(
            "Compiling group {} ({} of {} roots)",
            request.label,
            decisions.iter().filter(|d| d.needs_build()).count(),
            decisions.len()
        );

        let output = match self.compiler.compile(&request) {
            Ok(output) => output,
            Err(err) => {
                report.transition(GroupState::Failed);
                if self.config.debug {
                    if let Err(inspect_err) = self.compiler.open_for_inspection(&scratch_dir) {
                        tracing::warn!("Failed to open build project for inspection: {inspect_err}");
                    }
                }
                return Err(err.into());
            }
        };

        for decision in decisions.iter().filter(|d| d.needs_build()) {
            let record = self.harvest(decision, &members, group.build_configuration, &output)?;

            // Split subspecs now compiled into this artifact
            let superseded: Vec<String> = record
                .specs
                .iter()
                .filter(|spec| {
                    spec.as_str() != record.key()
                        && self.records.get(spec).is_some_and(|r| r.subspec.is_some())
                })
                .cloned()
                .collect();
            for key in superseded {
                tracing::debug!("{key}: split artifact superseded by {}", record.key());
                self.records.remove(&key);
                results.metadata.remove(&key);
            }

            group_results
                .metadata
                .insert(record.key().to_string(), ArtifactMetadata::from(&record));
            if record.content_hash.is_empty() {
                tracing::warn!("{}: sources unreadable, no reuse record written", record.key());
            } else {
                self.records.insert(record);
            }
        }
        group_results.licenses = output.licenses;

        self.records.save(&self.dirs.records_path())?;
        results.merge(group_results);

        if !self.config.debug {
            filesystem::remove_dir_all(&scratch_dir)?;
        }
        report.transition(GroupState::Completed);
        Ok(())
    }

    /// Copy a rebuilt root's artifact and debug symbols out of the scratch
    /// directory and describe them
    fn harvest(
        &self,
        decision: &ReuseDecision,
        members: &[PackageNode],
        build_configuration: BuildConfiguration,
        output: &CompileOutput,
    ) -> Result<ReuseRecord, PodBuilderError> {
        let root_name = &decision.root_name;
        let key = &decision.key;
        let artifact = output
            .artifacts
            .iter()
            .find(|a| &a.root_name == root_name)
            .ok_or_else(|| BuildError::MissingArtifact {
                package: key.clone(),
            })?;

        let root_members: Vec<&PackageNode> =
            members.iter().filter(|m| &m.root_name == root_name).collect();
        let Some(first) = root_members.first() else {
            return Err(BuildError::MissingArtifact {
                package: key.clone(),
            }
            .into());
        };
        let specs = root_specs(&root_members);

        let artifact_dir = self.dirs.prebuilt_dir().join(key);
        let nested = self.nested_split_dirs(key, &specs);
        let keep: Vec<&std::ffi::OsStr> = nested.iter().map(OsString::as_os_str).collect();
        filesystem::reset_dir_except(&artifact_dir, &keep)?;
        if let Some(file_name) = artifact.path.file_name() {
            filesystem::copy_path(&artifact.path, &artifact_dir.join(file_name))?;
        }

        let split = key != root_name;
        let mut dsym_dir = self.dirs.dsym_dir().join(build_configuration.to_string());
        if split {
            dsym_dir = dsym_dir.join(key);
        }
        for symbols in &artifact.debug_symbols {
            if let Some(file_name) = symbols.file_name() {
                filesystem::copy_path(symbols, &dsym_dir.join(file_name))?;
            }
        }

        // Hash again when it failed before compiling; empty means "don't record"
        let content_hash = match &decision.content_hash {
            Some(hash) => hash.clone(),
            None => {
                let prebuilt_dir = self.dirs.prebuilt_dir();
                ReuseEngine::new(&self.records, &self.locator, &prebuilt_dir, self.config)
                    .fingerprint(first)
                    .unwrap_or_default()
            }
        };

        tracing::debug!("Harvested {} into {}", key, artifact_dir.display());

        Ok(ReuseRecord {
            root_name: root_name.clone(),
            content_hash,
            build_configuration,
            artifact_path: PathBuf::from(key),
            version: first.version.clone(),
            module_name: first.module_name.clone(),
            is_static: first.is_static,
            specs,
            subspec: split.then(|| key.clone()),
        })
    }

    /// Directories under `Prebuilt/<key>` holding split subspec artifacts that
    /// outlive a rebuild of `key` producing `specs`
    fn nested_split_dirs(&self, key: &str, specs: &[String]) -> Vec<OsString> {
        let prefix = Path::new(key);
        let mut nested: Vec<OsString> = Vec::new();
        for record in self.records.iter() {
            let Some(subspec) = record.subspec.as_deref() else {
                continue;
            };
            if subspec == key || specs.iter().any(|s| s == subspec) {
                continue;
            }
            let Ok(relative) = Path::new(subspec).strip_prefix(prefix) else {
                continue;
            };
            if let Some(first) = relative.components().next() {
                let name = first.as_os_str().to_os_string();
                if !nested.contains(&name) {
                    nested.push(name);
                }
            }
        }
        nested
    }
}

/// Names of a root's members plus the sibling subspecs they pull in
fn root_specs(root_members: &[&PackageNode]) -> Vec<String> {
    let mut specs: Vec<String> = Vec::new();
    for member in root_members {
        let siblings = member
            .dependency_names
            .iter()
            .filter(|d| member.has_common_spec(d));
        for name in std::iter::once(&member.name).chain(siblings) {
            if !specs.contains(name) {
                specs.push(name.clone());
            }
        }
    }
    specs
}

fn unit_action(node: &PackageNode, decisions: &[ReuseDecision], prebuilt_dir: &Path) -> UnitAction {
    match decisions
        .iter()
        .find(|d| d.root_name == node.root_name)
        .map(|d| &d.disposition)
    {
        Some(Disposition::Reuse(record)) => UnitAction::Reuse(prebuilt_dir.join(&record.artifact_path)),
        Some(Disposition::Vendored) => UnitAction::Vendored,
        Some(Disposition::Rebuild(_)) | None => UnitAction::Build,
    }
}
