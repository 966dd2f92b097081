//! CLI implementation for `podbuilder clean` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::Project;
use crate::cli::output::{print_detail, print_success};
use crate::core::clean::clean_project;
use crate::core::records::RecordStore;
use crate::infra::project_lock::ProjectLock;
use crate::infra::writer::MetadataStore;

/// Execute the clean command
pub fn execute(project_dir: &Path) -> Result<()> {
    let project = Project::load(project_dir)?;
    let _lock = ProjectLock::acquire(&project.dirs.lock_path())?;

    let graph = project.resolve(false)?;
    let nodes = project.nodes(&graph)?;

    let records_path = project.dirs.records_path();
    let mut records = RecordStore::load(&records_path);
    let metadata = MetadataStore::new(&project.dirs.licenses_path(), &project.dirs.metadata_path());
    let mut results = metadata.load().with_context(|| "Failed to load build results")?;

    let result = clean_project(&project.dirs, &nodes, &mut records, &mut results)
        .with_context(|| "Failed to clean build artifacts")?;

    if result.is_empty() {
        print_success("Nothing to clean");
        return Ok(());
    }

    records.save(&records_path)?;
    metadata.save(&results)?;

    print_success("Cleaned build artifacts:");
    for root in &result.removed_roots {
        print_detail(&format!("Removed prebuilt {root}"));
    }
    for path in &result.removed_paths {
        print_detail(&format!("Removed {}", path.display()));
    }
    Ok(())
}
