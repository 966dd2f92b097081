//! PodBuilder - prebuild CocoaPods dependencies
//!
//! This library compiles the pods of a CocoaPods project into reusable
//! frameworks, reuses artifacts whose sources haven't changed and tells the
//! Podfile writer where each pod should be taken from.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Node model, planning, reuse decisions and plan execution
//! - [`infra`] - Infrastructure layer (filesystem, processes, persisted files)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
