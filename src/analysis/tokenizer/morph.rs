//! Streaming morphological tokenizer.
//!
//! A [`TokenizerSession`] walks one input buffer. It parses the input a chunk
//! at a time through the shared analyzer and hands out one [`Token`] per
//! morpheme; the next chunk is parsed right after the final morpheme of the
//! current one has been handed out. Any number of sessions may be open at
//! once, each on its own thread; only the parse calls are serialized.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use kiridashi::analysis::analyzer::{ScriptAnalyzer, SharedAnalyzer};
//! use kiridashi::analysis::tokenizer::MorphTokenizer;
//! use kiridashi::config::TokenizerConfig;
//! use kiridashi::util::encoding::TextEncoding;
//!
//! let analyzer = Arc::new(SharedAnalyzer::from_analyzer(ScriptAnalyzer::new(TextEncoding::Utf8)));
//! let tokenizer = MorphTokenizer::with_analyzer(analyzer, TokenizerConfig::default()).unwrap();
//!
//! let session = tokenizer.open("東京タワーに行く。".as_bytes()).unwrap();
//! let surfaces: Vec<String> = session.map(|token| token.to_string()).collect();
//! assert_eq!(surfaces, vec!["東京", "タワー", "に", "行", "く", "。"]);
//! ```

use std::sync::Arc;

use log::{debug, error};

use super::Tokenizer;
use super::delimited::{contains_delimiter, next_piece, piece_token};

use crate::analysis::analyzer::SharedAnalyzer;
use crate::analysis::classify::TokenClassifier;
use crate::analysis::morpheme::{MorphemeChunk, NodeStatus};
use crate::analysis::retry::{ParseBudget, parse_with_retry};
use crate::analysis::token::{Token, TokenStatus, TokenStream};
use crate::config::TokenizerConfig;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::{EncodedBuffer, TextEncoding};

/// Opens tokenizer sessions over a shared analyzer.
#[derive(Clone)]
pub struct MorphTokenizer {
    analyzer: Arc<SharedAnalyzer>,
    config: TokenizerConfig,
    classifier: TokenClassifier,
}

impl MorphTokenizer {
    /// Create a tokenizer over the process-wide analyzer.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        Self::with_analyzer(SharedAnalyzer::global(), config)
    }

    /// Create a tokenizer over `analyzer`.
    ///
    /// The analyzer is not constructed here; that happens when the first
    /// session is opened.
    pub fn with_analyzer(analyzer: Arc<SharedAnalyzer>, config: TokenizerConfig) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;
        let classifier = TokenClassifier::from_config(config.pos_filter.as_ref(), config.encoding)?;
        Ok(MorphTokenizer {
            analyzer,
            config,
            classifier,
        })
    }

    /// The effective configuration.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// The analyzer handle sessions parse through.
    pub fn analyzer(&self) -> &Arc<SharedAnalyzer> {
        &self.analyzer
    }

    /// Open a session over `input`, which must be in the configured encoding.
    ///
    /// Fails when the analyzer cannot be built, when its dictionary encoding
    /// differs from the configured one, or when the first chunk cannot be
    /// parsed even at the smallest budget.
    pub fn open<'a>(&self, input: &'a [u8]) -> Result<TokenizerSession<'a>> {
        self.open_buffer(EncodedBuffer::new(input, self.config.encoding))
    }

    /// Open a session that owns its input.
    pub fn open_owned(&self, input: Vec<u8>) -> Result<TokenizerSession<'static>> {
        self.open_buffer(EncodedBuffer::owned(input, self.config.encoding))
    }

    fn open_buffer<'a>(&self, input: EncodedBuffer<'a>) -> Result<TokenizerSession<'a>> {
        let encoding = input.encoding();
        let budget = ParseBudget::from(&self.config);

        let state = if self.config.tokenized_delimiter_mode
            && encoding == TextEncoding::Utf8
            && contains_delimiter(input.bytes())
        {
            SessionState::Delimited { offset: 0 }
        } else {
            let dictionary = self.analyzer.dictionary_encoding()?;
            if dictionary != encoding {
                return Err(KiridashiError::configuration(format!(
                    "dictionary charset ({dictionary}) does not match the input encoding ({encoding})"
                )));
            }
            if input.is_empty() {
                SessionState::Empty
            } else {
                let chunk = parse_with_retry(&self.analyzer, input.bytes(), encoding, 0, budget)?;
                SessionState::Chunked { chunk, cursor: 0 }
            }
        };

        debug!(
            "[tokenizer][kiridashi] opened session on {} bytes ({})",
            input.len(),
            encoding
        );

        Ok(TokenizerSession {
            analyzer: Arc::clone(&self.analyzer),
            classifier: self.classifier.clone(),
            budget,
            input,
            state,
            position: 0,
            emitted: 0,
            failure: None,
        })
    }
}

impl Tokenizer for MorphTokenizer {
    /// Encodes `text` into the configured encoding and tokenizes it; token
    /// offsets refer to the encoded bytes.
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let input = self.config.encoding.encode(text).into_owned();
        Ok(Box::new(self.open_owned(input)?))
    }

    fn name(&self) -> &'static str {
        "morph"
    }
}

#[derive(Debug)]
enum SessionState {
    /// Empty input; nothing to emit
    Empty,
    /// Handing out the nodes of a parsed chunk
    Chunked { chunk: MorphemeChunk, cursor: usize },
    /// Splitting pre-segmented input
    Delimited { offset: usize },
    Exhausted,
}

/// One pass over one input buffer.
///
/// Iterating yields tokens until the one marked [`TokenStatus::Last`]. If a
/// later chunk cannot be parsed, iteration ends early and [`failure`]
/// reports why.
///
/// [`failure`]: TokenizerSession::failure
pub struct TokenizerSession<'a> {
    analyzer: Arc<SharedAnalyzer>,
    classifier: TokenClassifier,
    budget: ParseBudget,
    input: EncodedBuffer<'a>,
    state: SessionState,
    position: usize,
    emitted: usize,
    failure: Option<KiridashiError>,
}

impl<'a> TokenizerSession<'a> {
    /// The error that ended the stream early, if any.
    pub fn failure(&self) -> Option<&KiridashiError> {
        self.failure.as_ref()
    }

    /// Position the next indexed token will get.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the stream has ended.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, SessionState::Exhausted)
    }

    /// Encoding of the session input.
    pub fn encoding(&self) -> TextEncoding {
        self.input.encoding()
    }

    fn next_chunk_token(&mut self) -> Option<Token> {
        loop {
            let (chunk, cursor) = match &mut self.state {
                SessionState::Chunked { chunk, cursor } => (chunk, cursor),
                _ => return None,
            };
            let remainder_empty = chunk.range().end >= self.input.len();

            let Some(node) = chunk.get(*cursor) else {
                // A chunk without nodes: move on as if its last node was emitted.
                let next = chunk.range().end;
                if remainder_empty {
                    self.state = SessionState::Exhausted;
                    return None;
                }
                self.reparse(next);
                continue;
            };

            let has_successor = chunk.has_successor(*cursor);
            let (status, skip) = self.classifier.classify(node, has_successor, remainder_empty);

            let bytes = self.input.bytes();
            let mut token = Token::with_offsets(
                &bytes[node.surface.clone()],
                self.position,
                node.surface.start,
                node.surface.end,
            )
            .with_status(status)
            .with_skip(skip)
            .with_unknown(node.status == NodeStatus::Unknown);
            if !node.feature.is_empty() {
                token = token.with_feature(node.feature.as_slice());
            }

            *cursor += 1;
            let chunk_done = *cursor >= chunk.len();
            let next = chunk.range().end;

            if skip.advances_position() {
                self.position += 1;
            }
            if status == TokenStatus::Last {
                self.state = SessionState::Exhausted;
            } else if chunk_done && !remainder_empty {
                self.reparse(next);
            }
            return Some(token);
        }
    }

    fn reparse(&mut self, start: usize) {
        let encoding = self.input.encoding();
        match parse_with_retry(&self.analyzer, self.input.bytes(), encoding, start, self.budget) {
            Ok(chunk) => {
                self.state = SessionState::Chunked { chunk, cursor: 0 };
            }
            Err(e) => {
                error!(
                    "[tokenizer][kiridashi] failed to parse remaining {} bytes at offset {start}: {e}",
                    self.input.len() - start
                );
                self.failure = Some(KiridashiError::mid_stream(format!(
                    "stream ended at offset {start}: {e}"
                )));
                self.state = SessionState::Exhausted;
            }
        }
    }

    fn next_delimited_token(&mut self) -> Option<Token> {
        let SessionState::Delimited { offset } = self.state else {
            return None;
        };
        let bytes = self.input.bytes();
        let (piece, last, next) = next_piece(bytes, offset);
        let token = piece_token(bytes, piece, last, self.position);
        if token.skip.advances_position() {
            self.position += 1;
        }
        self.state = if last {
            SessionState::Exhausted
        } else {
            SessionState::Delimited { offset: next }
        };
        Some(token)
    }
}

impl Iterator for TokenizerSession<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = match self.state {
            SessionState::Empty => {
                self.state = SessionState::Exhausted;
                None
            }
            SessionState::Chunked { .. } => self.next_chunk_token(),
            SessionState::Delimited { .. } => self.next_delimited_token(),
            SessionState::Exhausted => None,
        };
        if token.is_some() {
            self.emitted += 1;
        }
        token
    }
}

impl Drop for TokenizerSession<'_> {
    fn drop(&mut self) {
        debug!(
            "[tokenizer][kiridashi] closed session after {} tokens{}",
            self.emitted,
            if self.failure.is_some() {
                " (ended early)"
            } else {
                ""
            }
        );
    }
}
