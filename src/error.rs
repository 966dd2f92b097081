//! Error types for podbuilder
//!
//! Domain-specific error types using thiserror. Every validation error names
//! the offending package(s) and, where one exists, the command to run instead.

use std::path::PathBuf;
use thiserror::Error;

/// Spec construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// Missing required field in the raw spec metadata
    #[error("Spec '{name}' is missing required field '{field}'")]
    InvalidSpec { name: String, field: String },

    /// Build configuration is neither debug nor release
    #[error("Spec '{name}' has unsupported build configuration '{value}' (expected debug or release)")]
    InvalidBuildConfiguration { name: String, value: String },
}

/// Dependency resolution errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Missing dependency
    #[error("Missing dependency: '{dependency}' required by '{package}'")]
    MissingDependency { package: String, dependency: String },
}

/// Build request validation errors
///
/// All of these are raised before any compiler invocation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// A subspec was requested instead of its root
    #[error("Can't build subspec '{name}'. Use `podbuilder build {root}` instead")]
    InvalidRequest { name: String, root: String },

    /// Requested name is not a buildable root
    #[error("Package '{name}' is not buildable. Available: {}", available.join(", "))]
    UnknownPackage {
        name: String,
        available: Vec<String>,
    },

    /// Requested package shares a dependency with a package that isn't being built
    #[error(
        "Can't build '{package}' because it has common dependencies ('{dependency}') with '{other}'. \
         Use `podbuilder build {}` instead",
        suggestion.join(" ")
    )]
    ConflictingDependency {
        package: String,
        dependency: String,
        other: String,
        suggestion: Vec<String>,
    },

    /// Requested package is a dependency of a package that isn't being built
    #[error("No need to build '{package}' since it's a dependency of '{parent}'. Use `podbuilder build {parent_root}` instead")]
    RequestsDependency {
        package: String,
        parent: String,
        parent_root: String,
    },

    /// Packages with common dependencies have different build configurations
    #[error(
        "Dependencies of '{package}' don't have the same build configuration ({configuration}) of '{}' dependencies",
        others.join(", ")
    )]
    BuildConfigMismatch {
        package: String,
        configuration: String,
        others: Vec<String>,
    },

    /// Split subspecs must be statically linked
    #[error(
        "The following pods '{}' are non static frameworks which are being split over different targets. \
         This is an unsafe setup, use --allow-warnings to continue anyway",
        names.join(" ")
    )]
    UnsafeSplitConfig { names: Vec<String> },

    /// Nothing left to build after filtering
    #[error("Nothing to build")]
    NothingToBuild,
}

/// Project lock errors
#[derive(Error, Debug)]
pub enum LockError {
    /// Another invocation holds the project lock
    #[error("Another podbuilder process is already running in this project (lock: {path})")]
    ConcurrentRun { path: PathBuf },

    /// Lock file could not be created
    #[error("Failed to create lock file '{path}': {error}")]
    CreateFailed { path: PathBuf, error: String },
}

/// Build errors raised by the compiler collaborator
#[derive(Error, Debug)]
pub enum BuildError {
    /// Native compilation failed
    #[error("Build failed for group '{group}': {error}")]
    CompileFailed {
        group: String,
        error: String,
        /// Captured compiler output (tail)
        output: String,
    },

    /// Required tool not available
    #[error("Tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Preparing the scratch project failed
    #[error("Failed to prepare build project: {error}")]
    PrepareFailed { error: String },

    /// Compiler returned no artifact for a package it was asked to build
    #[error("No artifact produced for '{package}'")]
    MissingArtifact { package: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy a file or directory
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Environment variable substitution failed
    #[error("Failed to substitute environment variables in '{path}': {error}")]
    Substitution { path: PathBuf, error: String },
}

/// Switch errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SwitchError {
    /// No prebuilt artifact recorded for the package
    #[error("No prebuilt artifact found for '{name}'. Run `podbuilder build {name}` first")]
    NotPrebuilt { name: String },

    /// No development checkout found
    #[error("Couldn't find development sources for '{name}' in: {}", searched.join(", "))]
    DevelopmentSourceNotFound { name: String, searched: Vec<String> },
}

/// Top-level podbuilder error type
#[derive(Error, Debug)]
pub enum PodBuilderError {
    /// Spec error
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Plan validation error
    #[error("{0}")]
    Plan(#[from] PlanError),

    /// Lock error
    #[error("{0}")]
    Lock(#[from] LockError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Switch error
    #[error("{0}")]
    Switch(#[from] SwitchError),

    /// Resolved graph snapshot error
    #[error("Failed to load resolved graph '{path}': {error}")]
    Snapshot { path: PathBuf, error: String },

    /// Generic error
    #[error("{0}")]
    Generic(String),
}
