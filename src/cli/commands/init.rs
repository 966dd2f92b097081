//! CLI implementation for `podbuilder init` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success};
use crate::core::init::init_project;
use crate::infra::dirs::PodBuilderDirs;

/// Execute the init command
pub fn execute(path: &Path, force: bool) -> Result<()> {
    let dirs = PodBuilderDirs::new(path);
    let result = init_project(&dirs, force).with_context(|| "Failed to initialize project")?;

    print_success(&format!("Initialized PodBuilder in {}", dirs.podbuilder_dir().display()));
    if result.config_created {
        print_detail(&format!("Created {}", result.config_path.display()));
    } else {
        print_detail(&format!(
            "Kept existing {} (use --force to overwrite)",
            result.config_path.display()
        ));
    }
    if result.gitignore_updated {
        print_detail("Updated .gitignore");
    }
    Ok(())
}
