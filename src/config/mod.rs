//! Configuration constants
//!
//! Paths and defaults shared across modules.

pub mod defaults;
