//! Morphological analyzers used as the segmentation oracle.
//!
//! The tokenizer treats the analyzer as a black box: it hands over a byte
//! slice and gets back a node list framed by begin/end markers. Analyzers
//! are expensive to build and not reentrant, so sessions reach them only
//! through a [`shared::SharedAnalyzer`].
//!
//! # Available Analyzers
//!
//! - [`script::ScriptAnalyzer`] - Character-class segmentation, no dictionary
//! - `lindera::LinderaAnalyzer` - Dictionary-based analysis (requires `lindera` feature)

use crate::analysis::morpheme::MorphemeNode;
use crate::error::Result;
use crate::util::encoding::TextEncoding;

/// Trait for morphological analyzers.
///
/// # Examples
///
/// An analyzer that treats its whole input as one unknown word:
///
/// ```
/// use kiridashi::analysis::analyzer::MorphAnalyzer;
/// use kiridashi::analysis::morpheme::MorphemeNode;
/// use kiridashi::error::Result;
///
/// struct WholeAnalyzer {
///     nodes: Vec<MorphemeNode>,
/// }
///
/// impl MorphAnalyzer for WholeAnalyzer {
///     fn analyze(&mut self, input: &[u8]) -> Result<&[MorphemeNode]> {
///         self.nodes.clear();
///         self.nodes.push(MorphemeNode::begin());
///         self.nodes.push(MorphemeNode::unknown(0..input.len(), "名詞"));
///         self.nodes.push(MorphemeNode::end(input.len()));
///         Ok(&self.nodes)
///     }
///
///     fn dictionary_charset(&self) -> &str {
///         "utf-8"
///     }
///
///     fn name(&self) -> &'static str {
///         "whole"
///     }
/// }
/// ```
pub trait MorphAnalyzer: Send {
    /// Analyze `input` and return its node list.
    ///
    /// The list starts with a [`NodeStatus::Begin`] marker and ends with a
    /// [`NodeStatus::End`] marker; surfaces are byte ranges into `input`. The
    /// returned slice borrows the analyzer and is invalidated by the next
    /// call. An `Err` means the analyzer rejected the input, typically
    /// because it exceeded an internal buffer.
    ///
    /// [`NodeStatus::Begin`]: crate::analysis::morpheme::NodeStatus::Begin
    /// [`NodeStatus::End`]: crate::analysis::morpheme::NodeStatus::End
    fn analyze(&mut self, input: &[u8]) -> Result<&[MorphemeNode]>;

    /// Charset name of the loaded dictionary (e.g. `"EUC-JP"`).
    fn dictionary_charset(&self) -> &str;

    /// Encoding of the loaded dictionary.
    fn dictionary_encoding(&self) -> TextEncoding {
        TextEncoding::from_charset(self.dictionary_charset())
    }

    /// Message describing the most recent failure, if the analyzer keeps one.
    fn last_error(&self) -> Option<&str> {
        None
    }

    /// Get the name of this analyzer (for logging).
    fn name(&self) -> &'static str;
}

#[cfg(feature = "lindera")]
pub mod lindera;
pub mod script;
pub mod shared;

pub use script::ScriptAnalyzer;
pub use shared::SharedAnalyzer;
