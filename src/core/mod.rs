//! Core business logic module
//!
//! Process spawning and collaborator I/O belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`node`] - Package nodes built from resolved specs
//! - [`resolver`] - Dependency graph, closure and ordering
//! - [`planner`] - Request validation and partitioning into build groups
//! - [`fingerprint`] - Source tree fingerprints
//! - [`cache`] - Reuse versus rebuild decisions
//! - [`records`] - Reuse record store
//! - [`assembler`] - Build plan execution
//! - [`results`] - Licenses and artifact metadata
//! - [`switch`] - Prebuilt/development/source references
//! - [`clean`] - Stale artifact removal
//! - [`update`] - Stale record detection
//! - [`init`] - Project initialization
//! - [`config`] - Configuration loading

pub mod assembler;
pub mod cache;
pub mod clean;
pub mod config;
pub mod fingerprint;
pub mod init;
pub mod node;
pub mod planner;
pub mod records;
pub mod resolver;
pub mod results;
pub mod switch;
pub mod update;
