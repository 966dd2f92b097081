//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, external processes and the
//! collaborators around the core (resolved graph, compiler, writers, lock).

pub mod compiler;
pub mod dirs;
pub mod filesystem;
pub mod project_lock;
pub mod resolver;
pub mod writer;
