//! Node identifiers and hierarchy paths.
//!
//! A path is the chain of ancestor ids from the synthetic root (`-1`) down to
//! and including the node itself, serialized comma-delimited: `-1,1050,1100`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ContentError;

/// Delimiter between path segments.
pub const PATH_DELIMITER: char = ',';

/// Identifier of a node in the content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Synthetic root every path starts from.
    pub const ROOT: NodeId = NodeId(-1);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(NodeId)
            .map_err(|_| ContentError::InvalidNodeId(s.to_string()))
    }
}

/// Ancestor chain of a node, root sentinel first, the node itself last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<NodeId>,
}

impl NodePath {
    /// Path of the synthetic root: `-1`.
    pub fn root() -> Self {
        Self {
            segments: vec![NodeId::ROOT],
        }
    }

    /// Path of a direct child of this node.
    pub fn child(&self, id: NodeId) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id);
        Self { segments }
    }

    /// Parse the delimited form, e.g. `-1,1050,1100`.
    pub fn parse(s: &str) -> Result<Self, ContentError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContentError::InvalidPath {
                path: s.to_string(),
                reason: "empty path".into(),
            });
        }

        let segments = trimmed
            .split(PATH_DELIMITER)
            .map(|segment| {
                if segment.trim().is_empty() {
                    return Err(ContentError::InvalidPath {
                        path: s.to_string(),
                        reason: "empty segment".into(),
                    });
                }
                segment.parse::<NodeId>().map_err(|_| ContentError::InvalidPath {
                    path: s.to_string(),
                    reason: format!("segment {:?} is not a node id", segment),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if segments.first() != Some(&NodeId::ROOT) {
            return Err(ContentError::InvalidPath {
                path: s.to_string(),
                reason: "path must start at the root sentinel -1".into(),
            });
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[NodeId] {
        &self.segments
    }

    /// The node this path points to (the last segment).
    pub fn node_id(&self) -> NodeId {
        // Construction guarantees at least the root segment.
        self.segments.last().copied().unwrap_or(NodeId::ROOT)
    }

    /// Depth below the root sentinel (root = 0).
    pub fn level(&self) -> usize {
        self.segments.len() - 1
    }

    /// True when `id` appears as a whole segment after the root sentinel.
    pub fn contains_segment(&self, id: NodeId) -> bool {
        self.segments.iter().skip(1).any(|segment| *segment == id)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_DELIMITER)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
