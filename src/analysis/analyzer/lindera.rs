//! Dictionary-backed analyzer built on Lindera.
//!
//! Lindera dictionaries are UTF-8, so sessions using this analyzer must be
//! configured for UTF-8 text.

use std::borrow::Cow;
use std::str::FromStr;

use lindera::dictionary::{load_dictionary, load_user_dictionary};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;

use crate::analysis::analyzer::MorphAnalyzer;
use crate::analysis::morpheme::MorphemeNode;
use crate::error::{KiridashiError, Result};

const UNKNOWN_DETAIL: &str = "UNK";

/// Lindera-backed analyzer.
pub struct LinderaAnalyzer {
    inner: Segmenter,
    nodes: Vec<MorphemeNode>,
    last_error: Option<String>,
}

impl LinderaAnalyzer {
    /// Create a Lindera analyzer.
    pub fn new(mode_str: &str, dict_uri: &str) -> Result<Self> {
        Self::with_user_dictionary(mode_str, dict_uri, None)
    }

    /// Create a Lindera analyzer with an additional user dictionary.
    pub fn with_user_dictionary(
        mode_str: &str,
        dict_uri: &str,
        user_dict_uri: Option<&str>,
    ) -> Result<Self> {
        let mode = Mode::from_str(mode_str).map_err(|e| {
            KiridashiError::configuration(format!("Invalid mode '{}': {}", mode_str, e))
        })?;
        let dict = load_dictionary(dict_uri)
            .map_err(|e| KiridashiError::analyzer(format!("Failed to load dictionary: {}", e)))?;
        let metadata = &dict.metadata;
        let user_dict = match user_dict_uri {
            Some(uri) => Some(load_user_dictionary(uri, metadata).map_err(|e| {
                KiridashiError::analyzer(format!("Failed to load user dictionary: {}", e))
            })?),
            None => None,
        };
        let inner = Segmenter::new(mode, dict, user_dict);

        Ok(Self {
            inner,
            nodes: Vec::new(),
            last_error: None,
        })
    }
}

impl MorphAnalyzer for LinderaAnalyzer {
    fn analyze(&mut self, input: &[u8]) -> Result<&[MorphemeNode]> {
        let text = match std::str::from_utf8(input) {
            Ok(text) => text,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(KiridashiError::analyzer("input is not valid UTF-8"));
            }
        };

        let tokens = match self.inner.segment(Cow::Borrowed(text)) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(KiridashiError::analyzer("failed to segment text"));
            }
        };

        let mut nodes = Vec::with_capacity(tokens.len() + 2);
        nodes.push(MorphemeNode::begin());
        for mut token in tokens {
            let range = token.byte_start..token.byte_end;
            let details = token.details();
            let feature = details.join(",");
            if details.first() == Some(&UNKNOWN_DETAIL) {
                nodes.push(MorphemeNode::unknown(range, feature));
            } else {
                nodes.push(MorphemeNode::normal(range, feature));
            }
        }
        nodes.push(MorphemeNode::end(input.len()));

        self.last_error = None;
        self.nodes = nodes;
        Ok(&self.nodes)
    }

    fn dictionary_charset(&self) -> &str {
        "utf-8"
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn name(&self) -> &'static str {
        "lindera"
    }
}
