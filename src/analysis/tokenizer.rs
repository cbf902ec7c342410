//! Tokenizer implementations for text analysis.
//!
//! # Available Tokenizers
//!
//! - [`morph::MorphTokenizer`] - Chunked morphological analysis through a shared analyzer
//! - [`delimited::DelimitedTokenizer`] - Splits pre-segmented text on U+FFFE
//!
//! # Examples
//!
//! ```
//! use kiridashi::analysis::tokenizer::Tokenizer;
//! use kiridashi::analysis::tokenizer::delimited::DelimitedTokenizer;
//!
//! let tokenizer = DelimitedTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("形態素\u{FFFE}解析").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so one tokenizer can serve many threads.
///
/// # Examples
///
/// ```
/// use kiridashi::analysis::token::{Token, TokenStream};
/// use kiridashi::analysis::tokenizer::Tokenizer;
/// use kiridashi::error::Result;
///
/// struct CommaTokenizer;
///
/// impl Tokenizer for CommaTokenizer {
///     fn tokenize(&self, text: &str) -> Result<TokenStream> {
///         let mut offset = 0;
///         let mut tokens = Vec::new();
///         for (i, piece) in text.split(',').enumerate() {
///             tokens.push(Token::with_offsets(piece, i, offset, offset + piece.len()));
///             offset += piece.len() + 1;
///         }
///         Ok(Box::new(tokens.into_iter()))
///     }
///
///     fn name(&self) -> &'static str {
///         "comma"
///     }
/// }
/// ```
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod delimited;
pub mod morph;

pub use delimited::DelimitedTokenizer;
pub use morph::{MorphTokenizer, TokenizerSession};
