//! Token status and skip classification.
//!
//! Each morpheme node becomes one token. Its [`TokenStatus`] depends on
//! whether anything follows it, in the same chunk or in input not yet
//! parsed. Its [`SkipMode`] depends on whether it is a sentence marker and,
//! when a part-of-speech filter is configured, on its feature string.

use regex::bytes::Regex;

use crate::analysis::morpheme::{MorphemeNode, NodeStatus};
use crate::analysis::token::{SkipMode, TokenStatus};
use crate::config::PosFilterConfig;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::TextEncoding;

/// Decides which morphemes are indexed, by part of speech.
#[derive(Clone, Debug)]
pub struct PosFilter {
    keep: Vec<Vec<u8>>,
    keep_unknown: bool,
    pattern: Option<Regex>,
    skip_mode: SkipMode,
}

impl PosFilter {
    /// Build a filter for features in the dictionary `encoding`.
    pub fn new(config: &PosFilterConfig, encoding: TextEncoding) -> Result<Self> {
        let keep = config
            .keep
            .iter()
            .map(|pos| encoding.encode(pos).into_owned())
            .collect();
        let pattern = config
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| KiridashiError::configuration(format!("invalid pos_filter pattern: {e}")))?;

        Ok(PosFilter {
            keep,
            keep_unknown: config.keep_unknown,
            pattern,
            skip_mode: config.skip_mode,
        })
    }

    /// The part of speech before the first comma of `feature`.
    pub fn coarse_pos(feature: &[u8]) -> &[u8] {
        match feature.iter().position(|&b| b == b',') {
            Some(comma) => &feature[..comma],
            None => feature,
        }
    }

    /// Whether `node` should be indexed.
    pub fn should_index(&self, node: &MorphemeNode) -> bool {
        if node.status == NodeStatus::Unknown && self.keep_unknown {
            return true;
        }
        let pos = Self::coarse_pos(&node.feature);
        if self.keep.iter().any(|keep| keep.as_slice() == pos) {
            return true;
        }
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&node.feature))
    }

    /// Skip mode given to filtered morphemes.
    pub fn skip_mode(&self) -> SkipMode {
        self.skip_mode
    }
}

/// Maps nodes to token status and skip mode.
#[derive(Clone, Debug, Default)]
pub struct TokenClassifier {
    filter: Option<PosFilter>,
}

impl TokenClassifier {
    /// Create a classifier, optionally filtering by part of speech.
    pub fn new(filter: Option<PosFilter>) -> Self {
        TokenClassifier { filter }
    }

    /// Build from filter settings for the dictionary `encoding`.
    pub fn from_config(config: Option<&PosFilterConfig>, encoding: TextEncoding) -> Result<Self> {
        let filter = config
            .map(|config| PosFilter::new(config, encoding))
            .transpose()?;
        Ok(TokenClassifier { filter })
    }

    /// Classify `node`.
    ///
    /// `has_successor` tells whether another word follows it in its chunk and
    /// `remainder_empty` whether the whole input has been handed to the
    /// analyzer. Sentence markers are never indexed; the final one does not
    /// take a position.
    pub fn classify(
        &self,
        node: &MorphemeNode,
        has_successor: bool,
        remainder_empty: bool,
    ) -> (TokenStatus, SkipMode) {
        let status = if has_successor || !remainder_empty {
            TokenStatus::Continue
        } else {
            TokenStatus::Last
        };

        let skip = if node.is_marker() {
            match status {
                TokenStatus::Continue => SkipMode::SkipWithPosition,
                TokenStatus::Last => SkipMode::Skip,
            }
        } else {
            match &self.filter {
                Some(filter) if !filter.should_index(node) => filter.skip_mode(),
                _ => SkipMode::None,
            }
        };

        (status, skip)
    }
}
