//! CLI implementation for `podbuilder update` command

use anyhow::Result;
use std::path::Path;

use crate::cli::commands::build::run_plan;
use crate::cli::commands::Project;
use crate::cli::output::{print_detail, print_info, print_success};
use crate::core::assembler::Assembler;
use crate::core::cache::{RebuildReason, ReuseEngine, SourceLocator};
use crate::core::planner::{buildable_nodes, plan};
use crate::core::records::RecordStore;
use crate::core::update::{describe_version_change, find_stale, planned_decisions};
use crate::infra::compiler::{PodInstallHook, XcodebuildCompiler};
use crate::infra::project_lock::ProjectLock;

/// Execute the update command
pub fn execute(project_dir: &Path, allow_warnings: bool, update_repos: bool, dry_run: bool) -> Result<()> {
    let mut project = Project::load(project_dir)?;
    project.config = project.config.with_cli_overrides(allow_warnings, false, false);
    let _lock = ProjectLock::acquire(&project.dirs.lock_path())?;

    let graph = project.resolve(update_repos)?;
    let nodes = project.nodes(&graph)?;
    let buildable = buildable_nodes(&nodes, &project.config);

    let records = RecordStore::load(&project.dirs.records_path());
    let locator = SourceLocator::new(project.dirs.project_root(), &project.dirs.checkouts_dir());
    let prebuilt_dir = project.dirs.prebuilt_dir();
    let engine = ReuseEngine::new(&records, &locator, &prebuilt_dir, &project.config);
    let decisions = planned_decisions(&nodes, &project.config, &engine)?;

    let update = find_stale(&buildable, &decisions);
    if update.is_up_to_date() {
        print_success("All prebuilt pods are up to date");
        return Ok(());
    }

    print_info(&format!("{} stale prebuilt pod(s)", update.stale.len()));
    for (root, reason) in &update.stale {
        let detail = match reason {
            RebuildReason::VersionChanged { from, to } => describe_version_change(from, to),
            other => other.to_string(),
        };
        print_detail(&format!("{root}: {detail}"));
    }

    if dry_run {
        return Ok(());
    }

    let build_plan = plan(&nodes, &update.request, &project.config)?;
    let compiler = XcodebuildCompiler::new(Box::new(PodInstallHook::new(
        project.dirs.project_root(),
        graph.platforms.first().map(String::as_str),
    )));
    let mut assembler = Assembler::new(&compiler, &project.config, &project.dirs);
    run_plan(&project, &mut assembler, &build_plan, &nodes)
}
