//! Content indexer CLI library exports.
//!
//! This crate provides the `content-indexer` binary.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (rebuild, index, delete, search, status)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    init_logging, load_settings, run_delete, run_index, run_optimize, run_rebuild, run_search,
    show_status, IndexContext,
};
