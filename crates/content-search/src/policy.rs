//! Field value policies.
//!
//! Decides, per field name, whether a value is stored as one exact-match
//! token (`Raw`), tokenized for free-text search (`FullText`), or tokenized
//! with a named analyzer (`Custom`). The registry is built once at startup
//! and shared read-only.

use std::collections::BTreeMap;
use std::fmt;

use tantivy::tokenizer::{
    LowerCaser, RawTokenizer, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream,
    TokenizerManager, WhitespaceTokenizer,
};

use crate::error::SearchError;
use crate::schema::{INDEX_TYPE_FIELD, NODE_ID_FIELD, NODE_TYPE_ALIAS_FIELD, PATH_FIELD};

/// Tantivy's built-in exact-match tokenizer.
pub const RAW_TOKENIZER: &str = "raw";
/// Tantivy's built-in free-text tokenizer.
pub const DEFAULT_TOKENIZER: &str = "default";
/// Whitespace split + lower-casing, independent of culture.
pub const CULTURE_INVARIANT_WHITESPACE: &str = "culture-invariant-whitespace";

/// Structural fields stored as a single token.
const RAW_FIELDS: &[&str] = &[
    "id",
    "version",
    "parentID",
    "level",
    "writerID",
    "creatorID",
    "nodeType",
    "template",
    "sortOrder",
    "createDate",
    "updateDate",
    "urlName",
    "writerName",
    "creatorName",
    "path",
];

/// Human-authored fields tokenized for free text.
const FULL_TEXT_FIELDS: &[&str] = &["nodeName", "nodeTypeAlias"];

/// How a field's values are indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPolicy {
    /// One indivisible token, exact-match retrieval
    Raw,
    /// Tokenized for free-text search
    FullText,
    /// Tokenized with a named analyzer registered on the registry
    Custom(String),
}

impl FieldPolicy {
    /// Parse a policy name: `raw`, `fulltext`, anything else names a tokenizer.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("raw") {
            FieldPolicy::Raw
        } else if trimmed.eq_ignore_ascii_case("fulltext") {
            FieldPolicy::FullText
        } else {
            FieldPolicy::Custom(trimmed.to_string())
        }
    }

    /// Name of the Tantivy tokenizer backing this policy.
    pub fn tokenizer_name(&self) -> &str {
        match self {
            FieldPolicy::Raw => RAW_TOKENIZER,
            FieldPolicy::FullText => DEFAULT_TOKENIZER,
            FieldPolicy::Custom(name) => name,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, FieldPolicy::Raw)
    }
}

impl fmt::Display for FieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPolicy::Raw => f.write_str("raw"),
            FieldPolicy::FullText => f.write_str("fulltext"),
            FieldPolicy::Custom(name) => f.write_str(name),
        }
    }
}

/// Lower-cased whitespace analyzer used for the derived item-type field.
pub fn culture_invariant_whitespace() -> TextAnalyzer {
    TextAnalyzer::builder(WhitespaceTokenizer::default())
        .filter(LowerCaser)
        .build()
}

/// Field name -> policy lookup table.
#[derive(Clone)]
pub struct FieldPolicyRegistry {
    policies: BTreeMap<String, FieldPolicy>,
    default_policy: FieldPolicy,
    analyzers: BTreeMap<String, TextAnalyzer>,
}

impl fmt::Debug for FieldPolicyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPolicyRegistry")
            .field("policies", &self.policies)
            .field("default_policy", &self.default_policy)
            .field("analyzers", &self.analyzers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for FieldPolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldPolicyRegistry {
    /// Registry seeded with the structural and system fields.
    pub fn new() -> Self {
        let mut registry = Self::empty(FieldPolicy::FullText)
            .with_analyzer(CULTURE_INVARIANT_WHITESPACE, culture_invariant_whitespace());

        for name in RAW_FIELDS {
            registry.policies.insert((*name).to_string(), FieldPolicy::Raw);
        }
        for name in FULL_TEXT_FIELDS {
            registry
                .policies
                .insert((*name).to_string(), FieldPolicy::FullText);
        }

        registry.policies.insert(NODE_ID_FIELD.into(), FieldPolicy::Raw);
        registry.policies.insert(INDEX_TYPE_FIELD.into(), FieldPolicy::Raw);
        registry.policies.insert(PATH_FIELD.into(), FieldPolicy::Raw);
        registry.policies.insert(
            NODE_TYPE_ALIAS_FIELD.into(),
            FieldPolicy::Custom(CULTURE_INVARIANT_WHITESPACE.into()),
        );
        registry
    }

    /// Registry with no fields at all.
    pub fn empty(default_policy: FieldPolicy) -> Self {
        Self {
            policies: BTreeMap::new(),
            default_policy,
            analyzers: BTreeMap::new(),
        }
    }

    /// Set the policy for fields without an entry.
    pub fn with_default_policy(mut self, policy: FieldPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Register or override the policy of one field.
    pub fn with_field(mut self, name: impl Into<String>, policy: FieldPolicy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Register a named analyzer usable by `FieldPolicy::Custom`.
    pub fn with_analyzer(mut self, name: impl Into<String>, analyzer: TextAnalyzer) -> Self {
        self.analyzers.insert(name.into(), analyzer);
        self
    }

    /// Apply overrides of the form field name -> policy name.
    pub fn with_overrides<'a>(
        self,
        overrides: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        overrides.into_iter().fold(self, |registry, (field, policy)| {
            registry.with_field(field.clone(), FieldPolicy::parse(policy))
        })
    }

    /// Policy of a field, falling back to the default policy.
    pub fn policy_for(&self, field: &str) -> &FieldPolicy {
        self.policies.get(field).unwrap_or(&self.default_policy)
    }

    pub fn default_policy(&self) -> &FieldPolicy {
        &self.default_policy
    }

    /// All fields with an entry, in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldPolicy)> {
        self.policies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check that every custom policy refers to a registered analyzer.
    pub fn validate(&self) -> Result<(), SearchError> {
        let policies = self
            .policies
            .values()
            .chain(std::iter::once(&self.default_policy));
        for policy in policies {
            if let FieldPolicy::Custom(name) = policy {
                if !self.analyzers.contains_key(name) {
                    return Err(SearchError::UnknownTokenizer(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Register the custom analyzers on an index's tokenizer manager.
    ///
    /// Tantivy does not persist custom analyzers, so this runs on every open.
    pub fn install(&self, tokenizers: &TokenizerManager) {
        for (name, analyzer) in &self.analyzers {
            tokenizers.register(name, analyzer.clone());
        }
    }

    /// Analyzer for a policy.
    pub fn analyzer(&self, policy: &FieldPolicy) -> Result<TextAnalyzer, SearchError> {
        match policy {
            FieldPolicy::Raw => Ok(TextAnalyzer::from(RawTokenizer::default())),
            FieldPolicy::FullText => Ok(TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(40))
                .filter(LowerCaser)
                .build()),
            FieldPolicy::Custom(name) => self
                .analyzers
                .get(name)
                .cloned()
                .ok_or_else(|| SearchError::UnknownTokenizer(name.clone())),
        }
    }

    /// Tokens a value of `field` is indexed as.
    pub fn tokenize(&self, field: &str, text: &str) -> Result<Vec<String>, SearchError> {
        let mut analyzer = self.analyzer(self.policy_for(field))?;
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        Ok(tokens)
    }
}
