//! Command-line driver for the WBS engine
//!
//! This module contains argument parsing and the execution of each subcommand
//! against a [`JsonFileStore`](crate::store::JsonFileStore).

pub mod args;
pub mod commands;

pub use args::{Args, Commands};
pub use commands::{load_config, render_tree, run};
