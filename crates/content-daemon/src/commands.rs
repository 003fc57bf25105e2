//! Command implementations for the content indexer CLI.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use content_indexing::{
    ContentIndexer, ContentRepository, InMemoryContentRepository, IndexOperationQueue,
    IndexOutcome, IndexerConfig, LoggingProgressCallback, QueueConfig, RebuildConfig,
    TantivyIndexUpdater, TracingObserver,
};
use content_search::{
    FieldPolicyRegistry, NodeSearcher, SearchIndex, SearchIndexConfig, SearchIndexer,
    SearchOptions,
};
use content_types::{IndexType, NodeId, Settings};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(index_path) = index_path_override {
        settings.index_path = index_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn field_registry(settings: &Settings) -> Arc<FieldPolicyRegistry> {
    Arc::new(FieldPolicyRegistry::new().with_overrides(&settings.field_policies))
}

fn open_index(settings: &Settings) -> Result<SearchIndex> {
    let config = SearchIndexConfig::new(settings.expanded_index_path())
        .with_memory_mb(settings.writer_memory_mb);
    SearchIndex::open_or_create(config, field_registry(settings))
        .context("Failed to open search index")
}

fn load_repository(nodes: Option<&Path>) -> Result<Arc<InMemoryContentRepository>> {
    let repository = match nodes {
        Some(path) => InMemoryContentRepository::load(path)
            .with_context(|| format!("Failed to load nodes from {}", path.display()))?,
        None => InMemoryContentRepository::new(),
    };
    Ok(Arc::new(repository))
}

/// Index, writer queue and indexer wired together over one index directory.
pub struct IndexContext {
    pub index: SearchIndex,
    pub searcher: Arc<NodeSearcher>,
    pub indexer: ContentIndexer,
}

impl IndexContext {
    /// Open the index and start its writer. Must be called within a Tokio runtime.
    pub fn open(settings: &Settings, repository: Arc<dyn ContentRepository>) -> Result<Self> {
        let index = open_index(settings)?;
        let writer = Arc::new(SearchIndexer::new(&index).context("Failed to open index writer")?);
        let searcher = Arc::new(NodeSearcher::new(&index).context("Failed to open searcher")?);

        let observer = Arc::new(TracingObserver);
        let updater = Arc::new(TantivyIndexUpdater::new(
            writer,
            settings.index_set_name.clone(),
        ));
        let queue = Arc::new(IndexOperationQueue::start(
            updater,
            observer.clone(),
            QueueConfig::from_settings(settings),
        ));
        let indexer = ContentIndexer::new(
            IndexerConfig::from_settings(settings),
            repository,
            searcher.clone(),
            queue,
            observer,
        );

        Ok(Self {
            index,
            searcher,
            indexer,
        })
    }
}

/// Index every node in a nodes file.
pub async fn run_rebuild(settings: &Settings, nodes: &Path, clear: bool) -> Result<()> {
    let repository = load_repository(Some(nodes))?;
    let context = IndexContext::open(settings, repository)?;

    let config = RebuildConfig::default().with_clear_first(clear);
    let result = context
        .indexer
        .rebuild_with(&config, &LoggingProgressCallback)
        .await
        .context("Rebuild failed")?;
    context.indexer.shutdown().await?;

    let progress = &result.progress;
    println!(
        "Rebuilt {} in {} ms: {} indexed, {} skipped, {} missing, {} errors",
        settings.index_set_name,
        result.elapsed_ms,
        progress.indexed,
        progress.skipped,
        progress.missing,
        progress.errors
    );
    Ok(())
}

/// Index the given node ids from a nodes file.
pub async fn run_index(settings: &Settings, nodes: &Path, ids: &[i64]) -> Result<()> {
    let repository = load_repository(Some(nodes))?;
    let context = IndexContext::open(settings, repository.clone())?;

    for &raw in ids {
        let id = NodeId::new(raw);
        let Some(item) = repository.get_item(id)? else {
            warn!(node_id = %id, "Node not found in nodes file");
            println!("{}: not found", id);
            continue;
        };
        match context.indexer.index_node(item).await? {
            IndexOutcome::Enqueued => println!("{}: indexed", id),
            IndexOutcome::Skipped(reason) => println!("{}: skipped ({})", id, reason),
        }
    }

    context.indexer.shutdown().await?;
    Ok(())
}

/// Delete a node and its descendants.
pub async fn run_delete(settings: &Settings, id: i64, nodes: Option<&Path>) -> Result<()> {
    let repository = load_repository(nodes)?;
    let context = IndexContext::open(settings, repository)?;

    let outcome = context.indexer.delete_node(NodeId::new(id)).await;
    context.indexer.shutdown().await?;

    let deleted = outcome.context("Delete failed")?;
    println!("Deleted {} document(s) for node {}", deleted, id);
    Ok(())
}

/// Request a segment merge.
pub async fn run_optimize(settings: &Settings) -> Result<()> {
    let context = IndexContext::open(settings, load_repository(None)?)?;
    context.indexer.optimize().await?;
    context.indexer.shutdown().await?;
    println!("Optimize requested for {}", settings.index_set_name);
    Ok(())
}

/// Free-text search.
pub fn run_search(
    settings: &Settings,
    query: &str,
    limit: usize,
    item_type: Option<&str>,
    media: bool,
) -> Result<()> {
    let index = open_index(settings)?;
    let searcher = NodeSearcher::new(&index)?;

    let mut options = SearchOptions::new().with_limit(limit);
    if let Some(item_type) = item_type {
        options = options.with_item_type(item_type);
    }
    if media {
        options = options.with_index_type(IndexType::Media);
    }

    let hits = searcher.search(query, options).context("Search failed")?;
    info!(query, hits = hits.len(), "Search finished");

    if hits.is_empty() {
        println!("No results for {:?}", query);
        return Ok(());
    }
    for hit in hits {
        println!(
            "{:>8.3}  {:<8}  {:<16}  {}",
            hit.score,
            hit.node_id,
            hit.item_type.as_deref().unwrap_or("-"),
            hit.path.map(|p| p.to_string()).unwrap_or_default()
        );
    }
    Ok(())
}

/// Print index location and size.
pub fn show_status(settings: &Settings) -> Result<()> {
    let path = settings.expanded_index_path();
    if !path.join("meta.json").exists() {
        println!("{}: no index at {:?}", settings.index_set_name, path);
        return Ok(());
    }

    let index = open_index(settings)?;
    let searcher = NodeSearcher::new(&index)?;
    println!("Index set:   {}", settings.index_set_name);
    println!("Path:        {:?}", index.path());
    println!("Documents:   {}", searcher.num_docs()?);
    println!(
        "Queue mode:  {}",
        if settings.async_queue { "async" } else { "sync" }
    );
    println!(
        "Visibility:  supportUnpublished={} supportProtected={}",
        settings.support_unpublished, settings.support_protected
    );
    Ok(())
}
