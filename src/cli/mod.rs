//! Command-line interface for playlist-artwork.
//!
//! This module provides CLI commands for resolving playlist artwork,
//! inspecting how entries are classified, and managing the config file.

mod commands;

pub use commands::{Cli, Commands, ResolveArgs, run_command};
