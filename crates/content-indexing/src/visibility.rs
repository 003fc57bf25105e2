//! Eligibility of nodes for the index.
//!
//! The published/protected table decides first; the index set's criteria
//! (item types, parent node, supported index types) apply after it.

use std::fmt;

use content_types::{IndexItem, IndexType, IndexerOptions, NodeId, Settings};

use crate::repository::ContentRepository;

/// Why a node was not indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Protected node while protected content is not supported
    Protected,
    /// Item type missing from a non-empty include list
    ItemTypeNotIncluded,
    /// Item type on the exclude list
    ItemTypeExcluded,
    /// Path does not pass through the configured parent node
    OutsideParent,
    /// Index type this indexer does not handle
    UnsupportedIndexType,
    /// Path missing or malformed where a check needs it
    InvalidPath,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Protected => "protected",
            SkipReason::ItemTypeNotIncluded => "item_type_not_included",
            SkipReason::ItemTypeExcluded => "item_type_excluded",
            SkipReason::OutsideParent => "outside_parent",
            SkipReason::UnsupportedIndexType => "unsupported_index_type",
            SkipReason::InvalidPath => "invalid_path",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index set criteria. Empty criteria admit everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCriteria {
    /// When non-empty, only these item types are indexed
    pub include_item_types: Vec<String>,
    pub exclude_item_types: Vec<String>,
    /// Only index nodes below this node
    pub parent_id: Option<NodeId>,
    pub supported_types: Vec<IndexType>,
}

impl Default for IndexCriteria {
    fn default() -> Self {
        Self {
            include_item_types: Vec::new(),
            exclude_item_types: Vec::new(),
            parent_id: None,
            supported_types: vec![IndexType::Content, IndexType::Media],
        }
    }
}

impl IndexCriteria {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            include_item_types: settings.include_item_types.clone(),
            exclude_item_types: settings.exclude_item_types.clone(),
            parent_id: settings.parent_node(),
            ..Default::default()
        }
    }

    pub fn with_include(mut self, item_type: impl Into<String>) -> Self {
        self.include_item_types.push(item_type.into());
        self
    }

    pub fn with_exclude(mut self, item_type: impl Into<String>) -> Self {
        self.exclude_item_types.push(item_type.into());
        self
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_supported_types(mut self, types: Vec<IndexType>) -> Self {
        self.supported_types = types;
        self
    }

    fn lists(list: &[String], item_type: &str) -> bool {
        list.iter().any(|t| t.eq_ignore_ascii_case(item_type))
    }
}

/// Stateless eligibility predicate.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    options: IndexerOptions,
    criteria: IndexCriteria,
}

impl VisibilityFilter {
    pub fn new(options: IndexerOptions, criteria: IndexCriteria) -> Self {
        Self { options, criteria }
    }

    pub fn options(&self) -> IndexerOptions {
        self.options
    }

    pub fn criteria(&self) -> &IndexCriteria {
        &self.criteria
    }

    /// Replace the published/protected options, keeping the criteria.
    pub fn with_options(mut self, options: IndexerOptions) -> Self {
        self.options = options;
        self
    }

    /// The published/protected decision table.
    ///
    /// `is_protected` is only called when the outcome depends on it.
    pub fn admits(&self, is_protected: impl FnOnce() -> bool) -> bool {
        if self.options.support_unpublished || self.options.support_protected {
            return true;
        }
        !is_protected()
    }

    /// Decide whether an item may be indexed.
    pub fn validate_item(
        &self,
        item: &IndexItem,
        repository: &dyn ContentRepository,
    ) -> Result<(), SkipReason> {
        // Checked first: the path must end at the item's own id.
        let path = item.path().map_err(|_| SkipReason::InvalidPath)?;

        if !self.admits(|| repository.is_protected(item.id, &path)) {
            return Err(SkipReason::Protected);
        }

        if !self.criteria.supported_types.contains(&item.index_type) {
            return Err(SkipReason::UnsupportedIndexType);
        }

        let item_type = item.value_set.item_type.as_str();
        if !self.criteria.include_item_types.is_empty()
            && !IndexCriteria::lists(&self.criteria.include_item_types, item_type)
        {
            return Err(SkipReason::ItemTypeNotIncluded);
        }
        if IndexCriteria::lists(&self.criteria.exclude_item_types, item_type) {
            return Err(SkipReason::ItemTypeExcluded);
        }

        if let Some(parent_id) = self.criteria.parent_id {
            if !path.contains_segment(parent_id) {
                return Err(SkipReason::OutsideParent);
            }
        }

        Ok(())
    }
}
