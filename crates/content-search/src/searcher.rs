//! Point-in-time reads over the content index.
//!
//! Raw criteria (regex over a raw field, or an exact term) back the cascade
//! delete's descendant discovery. Free-text search uses BM25 scoring over
//! the full-text fields.

use std::fmt;
use std::sync::Arc;

use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, RegexQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{DocAddress, IndexReader, Searcher, TantivyDocument, Term};
use tracing::{debug, info};

use content_types::{IndexType, NodeId, NodePath};

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::policy::FieldPolicyRegistry;
use crate::schema::SearchSchema;

/// A raw query against one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    /// Regular expression matched against whole indexed terms
    Pattern { field: String, pattern: String },
    /// Exact indexed term
    Term { field: String, value: String },
}

impl Criteria {
    /// Raw pattern query over a field.
    pub fn raw(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Criteria::Pattern {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Exact-term query over a field.
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Criteria::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Criteria::Pattern { field, .. } | Criteria::Term { field, .. } => field,
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Pattern { field, pattern } => write!(f, "{}:/{}/", field, pattern),
            Criteria::Term { field, value } => write!(f, "{}:\"{}\"", field, value),
        }
    }
}

/// Read surface the indexer queries for node ids.
///
/// Implementations must answer from one consistent snapshot per call.
pub trait SearchSurface: Send + Sync {
    fn search_ids(&self, criteria: &Criteria) -> Result<Vec<NodeId>, SearchError>;
}

/// A free-text search result with relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub node_id: NodeId,
    pub index_type: Option<IndexType>,
    pub path: Option<NodePath>,
    /// Lower-cased item type
    pub item_type: Option<String>,
    pub score: f32,
}

/// Search options for filtering and limiting results.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Filter by index type (None = all types)
    pub index_type: Option<IndexType>,
    /// Filter by item type, matched case-insensitively
    pub item_type: Option<String>,
    /// Maximum results to return
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self {
            index_type: None,
            item_type: None,
            limit: 10,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }
}

/// Searcher over node documents.
pub struct NodeSearcher {
    reader: IndexReader,
    schema: SearchSchema,
    registry: Arc<FieldPolicyRegistry>,
    query_parser: QueryParser,
}

impl NodeSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();
        let registry = index.registry().clone();

        let query_parser = QueryParser::for_index(index.index(), schema.text_fields(&registry));

        Ok(Self {
            reader,
            schema,
            registry,
            query_parser,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Latest committed snapshot. Stays consistent while writes continue.
    pub fn snapshot(&self) -> Result<Searcher, SearchError> {
        self.reload()?;
        Ok(self.reader.searcher())
    }

    fn criteria_query(&self, criteria: &Criteria) -> Result<Box<dyn Query>, SearchError> {
        let field = self
            .schema
            .schema()
            .get_field(criteria.field())
            .map_err(|_| SearchError::UnknownField(criteria.field().to_string()))?;

        Ok(match criteria {
            Criteria::Pattern { pattern, .. } => Box::new(RegexQuery::from_pattern(pattern, field)?),
            Criteria::Term { value, .. } => Box::new(TermQuery::new(
                Term::from_field_text(field, value),
                IndexRecordOption::Basic,
            )),
        })
    }

    fn node_id_of(&self, searcher: &Searcher, address: DocAddress) -> Result<NodeId, SearchError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let raw = doc
            .get_first(self.schema.node_id)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SearchError::CorruptDocument(format!("{:?} has no node id", address)))?;
        raw.parse::<NodeId>()
            .map_err(|e| SearchError::CorruptDocument(e.to_string()))
    }

    /// Search with a query string.
    ///
    /// Uses BM25 scoring over the full-text fields.
    pub fn search(
        &self,
        query_str: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.snapshot()?;
        let text_query = self.query_parser.parse_query(query_str)?;

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, text_query)];
        if let Some(index_type) = options.index_type {
            let term = Term::from_field_text(self.schema.index_type, index_type.as_str());
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }
        if let Some(item_type) = &options.item_type {
            let term = Term::from_field_text(self.schema.node_type_alias, &item_type.to_lowercase());
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }
        let final_query = BooleanQuery::new(clauses);

        let top_docs = searcher.search(&final_query, &TopDocs::with_limit(options.limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let text = |field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };

            let node_id = text(self.schema.node_id)
                .and_then(|s| s.parse::<NodeId>().ok())
                .ok_or_else(|| {
                    SearchError::CorruptDocument(format!("{:?} has no node id", doc_address))
                })?;

            results.push(SearchHit {
                node_id,
                index_type: text(self.schema.index_type).and_then(|s| IndexType::parse(&s)),
                path: text(self.schema.path).and_then(|s| NodePath::parse(&s).ok()),
                item_type: text(self.schema.node_type_alias),
                score,
            });
        }

        info!(query = query_str, results = results.len(), "Search complete");
        Ok(results)
    }

    /// Tokens a value would be indexed as under this index's policies.
    pub fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>, SearchError> {
        self.registry.tokenize(field, text)
    }

    /// Get the number of indexed documents in the latest snapshot.
    pub fn num_docs(&self) -> Result<u64, SearchError> {
        let searcher = self.snapshot()?;
        Ok(searcher
            .segment_readers()
            .iter()
            .map(|r| r.num_docs() as u64)
            .sum())
    }
}

impl SearchSurface for NodeSearcher {
    fn search_ids(&self, criteria: &Criteria) -> Result<Vec<NodeId>, SearchError> {
        let searcher = self.snapshot()?;
        let query = self.criteria_query(criteria)?;
        let addresses = searcher.search(&query, &DocSetCollector)?;

        let mut ids = addresses
            .into_iter()
            .map(|address| self.node_id_of(&searcher, address))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort();
        ids.dedup();

        debug!(criteria = %criteria, hits = ids.len(), "Raw query complete");
        Ok(ids)
    }
}
