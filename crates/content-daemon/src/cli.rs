//! CLI argument parsing for the content indexer.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Content Indexer
///
/// Keeps a full-text index in step with a content tree.
#[derive(Parser, Debug)]
#[command(name = "content-indexer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/content-index/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override index directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Indexer commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index every node in a nodes file
    Rebuild {
        /// JSON array of nodes
        #[arg(short, long)]
        nodes: PathBuf,

        /// Remove all documents before rebuilding
        #[arg(long)]
        clear: bool,
    },

    /// Index or re-index selected nodes from a nodes file
    Index {
        /// JSON array of nodes
        #[arg(short, long)]
        nodes: PathBuf,

        /// Node ids to index
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
    },

    /// Delete a node and all of its indexed descendants
    Delete {
        /// Node id to delete
        #[arg(allow_negative_numbers = true)]
        id: i64,

        /// JSON array of nodes, for protection lookups
        #[arg(short, long)]
        nodes: Option<PathBuf>,
    },

    /// Free-text search over the index
    Search {
        /// Query string
        query: String,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Only nodes of this item type
        #[arg(short = 't', long)]
        item_type: Option<String>,

        /// Only media nodes
        #[arg(long)]
        media: bool,
    },

    /// Merge index segments
    Optimize,

    /// Show index status
    Status,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
