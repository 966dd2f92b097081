//! Build command implementation
//!
//! Implements `podbuilder build` to validate a request, split it into groups
//! and compile whatever can't be reused.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::commands::Project;
use crate::cli::output::{create_spinner, print_detail, print_info, print_success, print_warning};
use crate::core::assembler::{Assembler, GroupReport};
use crate::core::cache::{Disposition, ReuseDecision};
use crate::core::node::PackageNode;
use crate::core::planner::{check_not_requesting_subspecs, plan, BuildPlan};
use crate::core::results::BuildResults;
use crate::infra::compiler::{PodInstallHook, XcodebuildCompiler};
use crate::infra::project_lock::ProjectLock;
use crate::infra::writer::{ManifestWriter, MetadataStore, ReferenceFileWriter};

/// Build options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Requested root names, or `*`
    pub pods: Vec<String>,
    pub allow_warnings: bool,
    pub update_repos: bool,
    pub force_rebuild: bool,
    /// Stop after planning
    pub dry_run: bool,
    pub debug: bool,
}

/// Execute the build command
pub fn execute(project_dir: &Path, options: &BuildOptions) -> Result<()> {
    let mut project = Project::load(project_dir)?;
    check_not_requesting_subspecs(&options.pods)?;
    project.config = project.config.with_cli_overrides(
        options.allow_warnings,
        options.force_rebuild,
        options.debug,
    );

    let _lock = if options.dry_run {
        None
    } else {
        Some(ProjectLock::acquire(&project.dirs.lock_path())?)
    };

    let graph = project.resolve(options.update_repos)?;
    let nodes = project.nodes(&graph)?;
    let build_plan = plan(&nodes, &options.pods, &project.config)?;
    for warning in &build_plan.warnings {
        print_warning(warning);
    }

    let compiler = XcodebuildCompiler::new(Box::new(PodInstallHook::new(
        project.dirs.project_root(),
        graph.platforms.first().map(String::as_str),
    )));
    let mut assembler = Assembler::new(&compiler, &project.config, &project.dirs);

    if options.dry_run {
        return print_dry_run(&assembler, &build_plan, &nodes);
    }

    run_plan(&project, &mut assembler, &build_plan, &nodes)
}

/// Execute a validated plan and persist results, also after a failed group
pub(crate) fn run_plan(
    project: &Project,
    assembler: &mut Assembler<'_, XcodebuildCompiler>,
    build_plan: &BuildPlan,
    nodes: &[PackageNode],
) -> Result<()> {
    let metadata = MetadataStore::new(&project.dirs.licenses_path(), &project.dirs.metadata_path());
    let mut results = metadata
        .load()
        .with_context(|| "Failed to load previous build results")?;

    let spinner = create_spinner(&format!("Building {} group(s)", build_plan.groups.len()));
    let outcome = assembler.execute(build_plan, nodes, &mut results);
    spinner.finish_and_clear();

    persist(project, &metadata, &results)?;
    for report in assembler.reports() {
        print_report(report);
    }
    outcome?;

    print_success("Build complete");
    Ok(())
}

fn persist(project: &Project, metadata: &MetadataStore, results: &BuildResults) -> Result<()> {
    metadata
        .save(results)
        .with_context(|| "Failed to save build results")?;
    ReferenceFileWriter::new(&project.dirs.references_path())
        .write_references(&results.references(&project.dirs.prebuilt_dir()))
        .with_context(|| "Failed to write references")?;
    Ok(())
}

fn print_report(report: &GroupReport) {
    print_info(&format!("Group {} {}", report.label, report.state()));
    for root in &report.reused {
        print_detail(&format!("{root}: reused"));
    }
    for (root, reason) in &report.rebuilt {
        print_detail(&format!("{root}: rebuilt ({reason})"));
    }
    for root in &report.vendored {
        print_detail(&format!("{root}: vendored"));
    }
}

fn print_dry_run(
    assembler: &Assembler<'_, XcodebuildCompiler>,
    build_plan: &BuildPlan,
    nodes: &[PackageNode],
) -> Result<()> {
    for group in &build_plan.groups {
        print_info(&format!(
            "Group {} ({})",
            group.label(),
            group.build_configuration
        ));
        for decision in assembler.decisions(group, nodes)? {
            print_detail(&describe(&decision));
        }
    }
    print_success("Plan is valid, nothing was built");
    Ok(())
}

fn describe(decision: &ReuseDecision) -> String {
    match &decision.disposition {
        Disposition::Vendored => format!("{}: vendored", decision.key),
        Disposition::Reuse(_) => format!("{}: reuse", decision.key),
        Disposition::Rebuild(reason) => format!("{}: build ({reason})", decision.key),
    }
}
