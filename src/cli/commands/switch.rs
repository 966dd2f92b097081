//! CLI implementation for `podbuilder switch` command

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::commands::Project;
use crate::cli::output::{print_detail, print_success};
use crate::core::planner::check_not_requesting_subspecs;
use crate::core::records::RecordStore;
use crate::core::switch::{development_roots, switch_references, ReferenceDescriptor, SwitchMode};
use crate::infra::project_lock::ProjectLock;
use crate::infra::writer::{ManifestWriter, ReferenceFileWriter};

/// Execute the switch command
pub fn execute(project_dir: &Path, pods: &[String], mode: SwitchMode) -> Result<()> {
    let project = Project::load(project_dir)?;
    check_not_requesting_subspecs(pods)?;
    let _lock = ProjectLock::acquire(&project.dirs.lock_path())?;

    let graph = project.resolve(false)?;
    let nodes = project.nodes(&graph)?;
    let records = RecordStore::load(&project.dirs.records_path());

    let references = switch_references(
        &nodes,
        pods,
        mode,
        &records,
        &project.dirs.prebuilt_dir(),
        &development_roots(&project.config, project.dirs.project_root()),
    )?;

    ReferenceFileWriter::new(&project.dirs.references_path())
        .write_references(&references)
        .with_context(|| "Failed to write references")?;

    print_success(&format!("Switched {} pod(s)", references.len()));
    for (name, reference) in &references {
        let target = match reference {
            ReferenceDescriptor::Prebuilt { path } => format!("prebuilt {}", path.display()),
            ReferenceDescriptor::Development { path } => format!("development {}", path.display()),
            ReferenceDescriptor::Source { version, git, .. } => match git {
                Some(git) => format!("source {git}"),
                None => format!("source {version}"),
            },
        };
        print_detail(&format!("{name}: {target}"));
    }
    Ok(())
}
