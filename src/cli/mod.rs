//! Command-line interface for listen-tracker.
//!
//! This module provides commands for recording tracks, running enrichment
//! passes and batches, and inspecting the results.

mod commands;

pub use commands::{Cli, Commands, run_command};
