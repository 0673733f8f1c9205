//! CLI command implementations.
//!
//! Each submodule exposes an `execute` style entry point taking the loaded
//! [`crate::WitnessContext`]. Reports are written to stdout through
//! [`crate::output::print_lines`]; status messages go through the colored
//! helpers in [`crate::output`].

pub mod compare;
pub mod config;
pub mod context;
pub mod diff;
pub mod dormant;
pub mod scan;
pub mod snapshot;
pub mod watch;
