//! Configuration loading for content-index.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/content-index/config.toml and
//! environment variables use the `CONTENT_INDEX_` prefix with `__` as the
//! nesting separator (e.g. `CONTENT_INDEX_SUPPORT_PROTECTED=true`).

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ContentError;
use crate::node::NodeId;

/// Option name for indexing unpublished content.
pub const SUPPORT_UNPUBLISHED: &str = "supportUnpublished";
/// Option name for indexing protected content.
pub const SUPPORT_PROTECTED: &str = "supportProtected";

/// Parse a boolean option the lenient way: `true`/`false`, any ASCII case,
/// surrounding whitespace ignored. Anything else counts as absent.
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Visibility options of an indexer.
///
/// Both default to `false` when absent or unparsable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerOptions {
    /// Include unpublished nodes; protection is not checked at all.
    pub support_unpublished: bool,
    /// Include protected nodes. Ignored when `support_unpublished` is set.
    pub support_protected: bool,
}

impl IndexerOptions {
    pub fn new(support_unpublished: bool, support_protected: bool) -> Self {
        Self {
            support_unpublished,
            support_protected,
        }
    }

    /// Read the options from a provider-style name/value collection.
    pub fn initialize<S: AsRef<str>>(options: &HashMap<String, S>) -> Self {
        let flag = |name: &str| {
            parse_flag(options.get(name).map(AsRef::as_ref)).unwrap_or(false)
        };
        Self {
            support_unpublished: flag(SUPPORT_UNPUBLISHED),
            support_protected: flag(SUPPORT_PROTECTED),
        }
    }
}

/// Accepts a bool, or a string parsed with [`parse_flag`]; everything else is `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => parse_flag(Some(&s)).unwrap_or(false),
        Flag::Other(_) => false,
    })
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Name of the index set, reported with indexing errors
    #[serde(default = "default_index_set_name")]
    pub index_set_name: String,

    /// Path to the Tantivy index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Queue mode: true returns after enqueue, false waits for the write
    #[serde(default = "default_async_queue")]
    pub async_queue: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Index unpublished content
    #[serde(
        default,
        alias = "supportUnpublished",
        alias = "supportunpublished",
        deserialize_with = "lenient_flag"
    )]
    pub support_unpublished: bool,

    /// Index protected content
    #[serde(
        default,
        alias = "supportProtected",
        alias = "supportprotected",
        deserialize_with = "lenient_flag"
    )]
    pub support_protected: bool,

    /// Only index these item types (empty = all)
    #[serde(default)]
    pub include_item_types: Vec<String>,

    /// Never index these item types
    #[serde(default)]
    pub exclude_item_types: Vec<String>,

    /// Only index nodes below this node
    #[serde(default)]
    pub parent_id: Option<i64>,

    /// Field policy overrides: field name -> `raw`, `fulltext` or a tokenizer name
    #[serde(default)]
    pub field_policies: BTreeMap<String, String>,
}

fn default_index_set_name() -> String {
    "ContentIndexSet".to_string()
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "content-index")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./content-index"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_async_queue() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_set_name: default_index_set_name(),
            index_path: default_index_path(),
            writer_memory_mb: default_writer_memory_mb(),
            async_queue: default_async_queue(),
            log_level: default_log_level(),
            support_unpublished: false,
            support_protected: false,
            include_item_types: Vec::new(),
            exclude_item_types: Vec::new(),
            parent_id: None,
            field_policies: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/content-index/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (CONTENT_INDEX_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ContentError> {
        let config_dir = ProjectDirs::from("", "", "content-index")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_set_name", default_index_set_name())
            .map_err(|e| ContentError::Config(e.to_string()))?
            .set_default("index_path", default_index_path())
            .map_err(|e| ContentError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| ContentError::Config(e.to_string()))?
            .set_default("async_queue", default_async_queue())
            .map_err(|e| ContentError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| ContentError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::from(PathBuf::from(path)).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CONTENT_INDEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ContentError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ContentError::Config(e.to_string()))
    }

    /// Visibility options derived from these settings.
    pub fn indexer_options(&self) -> IndexerOptions {
        IndexerOptions::new(self.support_unpublished, self.support_protected)
    }

    pub fn parent_node(&self) -> Option<NodeId> {
        self.parent_id.map(NodeId::new)
    }

    /// Expand ~ in index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        if let Some(rest) = self.index_path.strip_prefix("~/") {
            if let Some(dirs) = directories::BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.index_path)
    }
}
