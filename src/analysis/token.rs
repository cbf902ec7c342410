//! Token types emitted by tokenizer sessions.
//!
//! A [`Token`] carries the raw surface bytes of one morpheme (in the input's
//! encoding, never transcoded), its byte range in the input, and the flags an
//! indexer needs to consume it:
//!
//! - [`TokenStatus`] says whether more tokens follow.
//! - [`SkipMode`] says whether the token text should be indexed, and if not,
//!   whether it still occupies a position.
//!
//! ```text
//! Input: "これは。" (chunked after "。" with remainder "テスト")
//!
//!   pos 0 "これ"  Continue
//!   pos 1 "は"    Continue
//!   pos 2 "。"    Continue
//!   pos 3 ""      Continue, SkipWithPosition   <- end of chunk
//!   pos 4 "テスト" Last
//! ```
//!
//! # Examples
//!
//! ```
//! use kiridashi::analysis::token::{SkipMode, Token, TokenStatus};
//!
//! let token = Token::with_offsets("日本", 0, 0, 6);
//! assert_eq!(token.surface, "日本".as_bytes());
//! assert_eq!(token.status, TokenStatus::Continue);
//! assert_eq!(token.skip, SkipMode::None);
//! assert!(token.is_indexed());
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::encoding::TextEncoding;

/// A single morpheme-level token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface bytes, in the encoding of the tokenized input
    pub surface: Vec<u8>,

    /// Position of the token in the stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the input
    pub start_offset: usize,

    /// The byte offset where this token ends in the input
    pub end_offset: usize,

    /// Whether more tokens follow
    pub status: TokenStatus,

    /// Whether the consumer should index this token
    pub skip: SkipMode,

    /// The analyzer did not find this morpheme in its dictionary
    pub unknown: bool,

    /// Analyzer feature string (part of speech etc.), in the dictionary encoding
    pub feature: Option<Vec<u8>>,
}

/// Continuation status of a token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// More tokens follow
    #[default]
    Continue,
    /// This is the final token of the stream
    Last,
}

/// Indexing modifier of a token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMode {
    /// Index the token
    #[default]
    None,
    /// Do not index the token and do not advance the position
    Skip,
    /// Do not index the token but advance the position
    SkipWithPosition,
}

impl SkipMode {
    /// Whether a token with this mode advances the position counter.
    pub fn advances_position(&self) -> bool {
        !matches!(self, SkipMode::Skip)
    }
}

impl Token {
    /// Create a token over `surface` with the given byte offsets.
    pub fn with_offsets<S: Into<Vec<u8>>>(
        surface: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            surface: surface.into(),
            position,
            start_offset,
            end_offset,
            status: TokenStatus::Continue,
            skip: SkipMode::None,
            unknown: false,
            feature: None,
        }
    }

    /// Get the length of the surface in bytes.
    pub fn len(&self) -> usize {
        self.surface.len()
    }

    /// Check if the surface is empty.
    pub fn is_empty(&self) -> bool {
        self.surface.is_empty()
    }

    /// Whether the consumer should index this token's text.
    pub fn is_indexed(&self) -> bool {
        self.skip == SkipMode::None
    }

    /// Whether this is the final token of its stream.
    pub fn is_last(&self) -> bool {
        self.status == TokenStatus::Last
    }

    /// Set the continuation status.
    pub fn with_status(mut self, status: TokenStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the skip mode.
    pub fn with_skip(mut self, skip: SkipMode) -> Self {
        self.skip = skip;
        self
    }

    /// Attach the analyzer feature string.
    pub fn with_feature<F: Into<Vec<u8>>>(mut self, feature: F) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Mark the token as an unknown word.
    pub fn with_unknown(mut self, unknown: bool) -> Self {
        self.unknown = unknown;
        self
    }

    /// Surface decoded from `encoding` for display.
    pub fn text(&self, encoding: TextEncoding) -> Cow<'_, str> {
        encoding.decode_lossy(&self.surface)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.surface))
    }
}

/// A token stream represents a sequence of tokens from a tokenizer.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
