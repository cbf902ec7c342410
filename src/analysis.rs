//! Text analysis module for Kiridashi.
//!
//! Input flows through four stages: the [`splitter`] cuts it into chunks an
//! analyzer will accept, [`retry`] feeds each chunk to the shared
//! [`analyzer`] and backs off on failure, [`classify`] decides status and
//! skip flags, and a [`tokenizer`] session hands the result out as
//! [`token::Token`]s.

pub mod analyzer;
pub mod classify;
pub mod morpheme;
pub mod retry;
pub mod splitter;
pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use classify::*;
pub use morpheme::*;
pub use splitter::*;
pub use token::*;
pub use tokenizer::*;
