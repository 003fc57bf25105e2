//! Content Indexer
//!
//! Maintains a full-text index mirroring a hierarchical content tree.
//!
//! # Usage
//!
//! ```bash
//! content-indexer rebuild --nodes nodes.json [--clear]
//! content-indexer index --nodes nodes.json 1050 1100
//! content-indexer delete 1050
//! content-indexer search "summer sale" [--item-type textPage] [--media]
//! content-indexer status
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/content-index/config.toml)
//! 3. Environment variables (CONTENT_INDEX_*)
//! 4. CLI flags

use anyhow::Result;

use content_daemon::{
    init_logging, load_settings, run_delete, run_index, run_optimize, run_rebuild, run_search,
    show_status, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.index_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Rebuild { nodes, clear } => {
            run_rebuild(&settings, &nodes, clear).await?;
        }
        Commands::Index { nodes, ids } => {
            run_index(&settings, &nodes, &ids).await?;
        }
        Commands::Delete { id, nodes } => {
            run_delete(&settings, id, nodes.as_deref()).await?;
        }
        Commands::Search {
            query,
            limit,
            item_type,
            media,
        } => {
            run_search(&settings, &query, limit, item_type.as_deref(), media)?;
        }
        Commands::Optimize => {
            run_optimize(&settings).await?;
        }
        Commands::Status => {
            show_status(&settings)?;
        }
    }

    Ok(())
}
