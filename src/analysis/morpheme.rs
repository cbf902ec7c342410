//! Morpheme nodes and owned chunk results.
//!
//! An analyzer returns its nodes as a borrowed slice that is only valid until
//! its next call. [`MorphemeChunk`] is the session-owned copy taken while the
//! analyzer lock is still held; from then on the session never touches the
//! analyzer's buffers again.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{KiridashiError, Result};

/// Status tag of a morpheme node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// A dictionary word
    #[default]
    Normal,
    /// A word the dictionary does not know
    Unknown,
    /// Beginning-of-sentence marker
    Begin,
    /// End-of-sentence marker
    End,
}

/// One unit of analyzer output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphemeNode {
    /// Byte range of the surface in the analyzed input
    pub surface: Range<usize>,
    /// Node status
    pub status: NodeStatus,
    /// Feature string (part of speech first, comma separated)
    pub feature: Vec<u8>,
}

impl MorphemeNode {
    /// A dictionary word spanning `surface`.
    pub fn normal<F: Into<Vec<u8>>>(surface: Range<usize>, feature: F) -> Self {
        MorphemeNode {
            surface,
            status: NodeStatus::Normal,
            feature: feature.into(),
        }
    }

    /// An unknown word spanning `surface`.
    pub fn unknown<F: Into<Vec<u8>>>(surface: Range<usize>, feature: F) -> Self {
        MorphemeNode {
            surface,
            status: NodeStatus::Unknown,
            feature: feature.into(),
        }
    }

    /// Beginning-of-sentence marker.
    pub fn begin() -> Self {
        MorphemeNode {
            surface: 0..0,
            status: NodeStatus::Begin,
            feature: Vec::new(),
        }
    }

    /// End-of-sentence marker placed at byte `at`.
    pub fn end(at: usize) -> Self {
        MorphemeNode {
            surface: at..at,
            status: NodeStatus::End,
            feature: Vec::new(),
        }
    }

    /// Surface length in bytes.
    pub fn length(&self) -> usize {
        self.surface.len()
    }

    /// Whether this node is a sentence boundary marker.
    pub fn is_marker(&self) -> bool {
        matches!(self.status, NodeStatus::Begin | NodeStatus::End)
    }
}

/// The session-owned result of parsing one chunk.
///
/// Leading begin markers are dropped; node ranges are absolute offsets into
/// the session input.
#[derive(Clone, Debug, Default)]
pub struct MorphemeChunk {
    nodes: Vec<MorphemeNode>,
    start: usize,
    end: usize,
}

impl MorphemeChunk {
    /// Copy analyzer nodes for the input slice that starts at `base` and is
    /// `length` bytes long.
    pub fn copy_from(nodes: &[MorphemeNode], base: usize, length: usize) -> Result<Self> {
        let first = nodes
            .iter()
            .position(|node| node.status != NodeStatus::Begin)
            .unwrap_or(nodes.len());
        let nodes = &nodes[first..];

        let mut owned = Vec::new();
        owned.try_reserve_exact(nodes.len()).map_err(|e| {
            KiridashiError::resource(format!(
                "failed to buffer {} morpheme nodes: {e}",
                nodes.len()
            ))
        })?;

        for node in nodes {
            if node.surface.start > node.surface.end || node.surface.end > length {
                return Err(KiridashiError::analyzer(format!(
                    "node surface {:?} lies outside the {length}-byte input",
                    node.surface
                )));
            }
            owned.push(MorphemeNode {
                surface: node.surface.start + base..node.surface.end + base,
                status: node.status,
                feature: node.feature.clone(),
            });
        }

        Ok(MorphemeChunk {
            nodes: owned,
            start: base,
            end: base + length,
        })
    }

    /// Nodes of this chunk.
    pub fn nodes(&self) -> &[MorphemeNode] {
        &self.nodes
    }

    /// Node at `index`.
    pub fn get(&self, index: usize) -> Option<&MorphemeNode> {
        self.nodes.get(index)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chunk has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the node at `index` is followed by another word in this chunk.
    pub fn has_successor(&self, index: usize) -> bool {
        self.nodes
            .get(index + 1)
            .is_some_and(|next| !next.is_marker())
    }

    /// Absolute byte range of the input this chunk was parsed from.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
