//! CLI implementation for `podbuilder info` command

use anyhow::Result;
use std::path::Path;

use crate::cli::commands::Project;
use crate::cli::output::{print_detail, print_info};
use crate::core::records::RecordStore;

/// Execute the info command
pub fn execute(project_dir: &Path) -> Result<()> {
    let project = Project::load(project_dir)?;
    let graph = project.resolve(false)?;
    let nodes = project.nodes(&graph)?;
    let records = RecordStore::load(&project.dirs.records_path());

    print_info(&format!(
        "podbuilder {} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    ));
    print_info(&format!("{} pods", nodes.len()));

    for node in &nodes {
        let status = if node.is_prebuilt() {
            "vendored".to_string()
        } else if project.config.is_skipped(&node.root_name) {
            "skipped".to_string()
        } else {
            match records.for_node(node) {
                Some(record) if record.version == node.version => {
                    format!("prebuilt {}", record.build_configuration)
                }
                Some(record) => format!("prebuilt {} (stale: {})", record.build_configuration, record.version),
                None => "not built".to_string(),
            }
        };
        print_detail(&format!(
            "{} [{}] {}: {}",
            node,
            node.build_configuration,
            if node.is_static { "static" } else { "dynamic" },
            status
        ));
    }
    Ok(())
}
