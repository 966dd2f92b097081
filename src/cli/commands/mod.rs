//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod info;
pub mod init;
pub mod switch;
pub mod update;

use anyhow::{Context, Result};
use clap::{ArgGroup, Subcommand};
use std::path::Path;

use crate::core::config::Configuration;
use crate::core::node::{build_nodes, PackageNode, ResolvedGraph};
use crate::core::switch::SwitchMode;
use crate::infra::dirs::PodBuilderDirs;
use crate::infra::resolver::{ManifestResolver, SnapshotResolver};

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the PodBuilder directory and default configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Prebuild pods (`*` for every buildable pod)
    Build {
        /// Root names of the pods to build
        #[arg(required = true)]
        pods: Vec<String>,

        /// Downgrade unsafe split configurations to warnings
        #[arg(long)]
        allow_warnings: bool,

        /// Run `pod repo update` before resolving
        #[arg(long)]
        update_repos: bool,

        /// Ignore reuse records and rebuild everything requested
        #[arg(long)]
        force_rebuild: bool,

        /// Validate and print the plan without compiling
        #[arg(long)]
        dry_run: bool,

        /// Keep the scratch project and open it on failure
        #[arg(long)]
        debug: bool,
    },

    /// Switch pods between prebuilt, development and source references
    #[command(group(ArgGroup::new("mode").required(true).args(["prebuilt", "development", "default"])))]
    Switch {
        /// Root names of the pods to switch (`*` for all)
        #[arg(required = true)]
        pods: Vec<String>,

        /// Use the prebuilt framework
        #[arg(short, long)]
        prebuilt: bool,

        /// Use a local development checkout
        #[arg(short, long)]
        development: bool,

        /// Use the source declared in the Podfile
        #[arg(short = 's', long)]
        default: bool,
    },

    /// Remove artifacts of pods no longer in the project
    Clean,

    /// Rebuild prebuilt pods whose sources, version or configuration changed
    Update {
        /// Downgrade unsafe split configurations to warnings
        #[arg(long)]
        allow_warnings: bool,

        /// Run `pod repo update` before resolving
        #[arg(long)]
        update_repos: bool,

        /// Only report stale pods
        #[arg(long)]
        dry_run: bool,
    },

    /// Show every pod with its source, configuration and prebuilt status
    Info,
}

impl Commands {
    /// Execute the command
    pub fn run(self, project_dir: &Path) -> Result<()> {
        match self {
            Self::Init { force } => init::execute(project_dir, force),
            Self::Build {
                pods,
                allow_warnings,
                update_repos,
                force_rebuild,
                dry_run,
                debug,
            } => {
                let options = build::BuildOptions {
                    pods,
                    allow_warnings,
                    update_repos,
                    force_rebuild,
                    dry_run,
                    debug,
                };
                build::execute(project_dir, &options)
            }
            Self::Switch {
                pods,
                prebuilt,
                development,
                default: _,
            } => {
                let mode = if prebuilt {
                    SwitchMode::Prebuilt
                } else if development {
                    SwitchMode::Development
                } else {
                    SwitchMode::Default
                };
                switch::execute(project_dir, &pods, mode)
            }
            Self::Clean => clean::execute(project_dir),
            Self::Update {
                allow_warnings,
                update_repos,
                dry_run,
            } => update::execute(project_dir, allow_warnings, update_repos, dry_run),
            Self::Info => info::execute(project_dir),
        }
    }
}

/// Configuration and resolved graph of a project, shared by the commands
pub struct Project {
    pub dirs: PodBuilderDirs,
    pub config: Configuration,
}

impl Project {
    /// Load the layered configuration of the project at `project_dir`
    pub fn load(project_dir: &Path) -> Result<Self> {
        let dirs = PodBuilderDirs::new(project_dir);
        let config_path = dirs.config_path();
        if !dirs.podbuilder_dir().exists() {
            anyhow::bail!(
                "No PodBuilder directory found in {}. Run 'podbuilder init' first.",
                project_dir.display()
            );
        }
        let global_path = dirs.global_config_path();
        let config = Configuration::load(&config_path, Some(global_path.as_path()))
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        Ok(Self { dirs, config })
    }

    /// Resolve the dependency graph
    pub fn resolve(&self, update_repos: bool) -> Result<ResolvedGraph> {
        let path = self.dirs.resolve(&self.config.resolved_graph);
        Ok(SnapshotResolver::new(&path).resolve(update_repos)?)
    }

    /// Package nodes of the resolved graph
    pub fn nodes(&self, graph: &ResolvedGraph) -> Result<Vec<PackageNode>> {
        Ok(build_nodes(graph, &self.config)?)
    }
}
