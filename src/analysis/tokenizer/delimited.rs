//! Tokenizer for pre-segmented input.
//!
//! Text that was already split into words upstream carries U+FFFE between
//! them. Each piece between two delimiters becomes one token and no analyzer
//! is involved.

use std::ops::Range;

use super::Tokenizer;

use crate::analysis::token::{SkipMode, Token, TokenStatus, TokenStream};
use crate::error::Result;

/// U+FFFE in UTF-8.
pub const TOKENIZED_DELIMITER: &[u8] = b"\xEF\xBF\xBE";

/// Whether `input` contains the delimiter.
pub fn contains_delimiter(input: &[u8]) -> bool {
    find_delimiter(input, 0).is_some()
}

fn find_delimiter(input: &[u8], from: usize) -> Option<usize> {
    input
        .get(from..)?
        .windows(TOKENIZED_DELIMITER.len())
        .position(|window| window == TOKENIZED_DELIMITER)
        .map(|found| from + found)
}

/// The piece starting at `offset`, whether it is the final one, and the
/// offset of the piece after it.
pub(crate) fn next_piece(input: &[u8], offset: usize) -> (Range<usize>, bool, usize) {
    match find_delimiter(input, offset) {
        Some(found) => (offset..found, false, found + TOKENIZED_DELIMITER.len()),
        None => (offset..input.len(), true, input.len()),
    }
}

/// Build the token for one piece. Empty pieces (adjacent delimiters) are
/// skipped without taking a position.
pub(crate) fn piece_token(input: &[u8], piece: Range<usize>, last: bool, position: usize) -> Token {
    let skip = if piece.is_empty() {
        SkipMode::Skip
    } else {
        SkipMode::None
    };
    let status = if last {
        TokenStatus::Last
    } else {
        TokenStatus::Continue
    };
    Token::with_offsets(&input[piece.clone()], position, piece.start, piece.end)
        .with_status(status)
        .with_skip(skip)
}

/// Iterator over the pieces of a delimited buffer.
#[derive(Clone, Debug)]
pub struct DelimitedPieces<'a> {
    input: &'a [u8],
    offset: usize,
    position: usize,
    done: bool,
}

impl<'a> DelimitedPieces<'a> {
    /// Iterate over the pieces of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        DelimitedPieces {
            input,
            offset: 0,
            position: 0,
            done: input.is_empty(),
        }
    }
}

impl Iterator for DelimitedPieces<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (piece, last, next) = next_piece(self.input, self.offset);
        let token = piece_token(self.input, piece, last, self.position);
        if token.skip.advances_position() {
            self.position += 1;
        }
        self.offset = next;
        self.done = last;
        Some(token)
    }
}

/// A tokenizer that only splits on U+FFFE.
#[derive(Clone, Debug, Default)]
pub struct DelimitedTokenizer;

impl DelimitedTokenizer {
    /// Create a new delimited tokenizer.
    pub fn new() -> Self {
        DelimitedTokenizer
    }
}

impl Tokenizer for DelimitedTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = DelimitedPieces::new(text.as_bytes()).collect();
        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "delimited"
    }
}
