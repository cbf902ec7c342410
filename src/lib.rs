//! # Kiridashi
//!
//! A streaming Japanese tokenizer built around a morphological analyzer.
//!
//! ## Features
//!
//! - Chunked analysis of arbitrarily long inputs, cut at punctuation
//! - Halve-and-retry when the analyzer rejects a chunk
//! - UTF-8, EUC-JP and Shift-JIS input, never transcoded
//! - One lazily built analyzer shared by all sessions
//! - Optional part-of-speech filtering
//! - Pluggable analyzers (built-in character-class analyzer, Lindera)

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod util;

pub mod prelude {
    pub use crate::analysis::analyzer::{MorphAnalyzer, ScriptAnalyzer, SharedAnalyzer};
    pub use crate::analysis::token::{SkipMode, Token, TokenStatus};
    pub use crate::analysis::tokenizer::{MorphTokenizer, Tokenizer, TokenizerSession};
    pub use crate::config::{PosFilterConfig, TokenizerConfig};
    pub use crate::error::{KiridashiError, Result};
    pub use crate::util::encoding::TextEncoding;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
