//! Tokenizer configuration.
//!
//! Settings can be built in code or loaded from JSON. The lookback may also
//! be given under its legacy name `rfind_punct_offset`, and a limit of 0
//! means "use the default".
//!
//! ```json
//! {
//!   "parse_limit": 300000,
//!   "rfind_punct_offset": 300,
//!   "encoding": "euc-jp",
//!   "pos_filter": { "keep": ["名詞", "動詞"] }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::token::SkipMode;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::TextEncoding;

/// Default maximum number of bytes handed to the analyzer at once.
pub const DEFAULT_PARSE_LIMIT: usize = 300_000;

/// Default backward search window for punctuation, in bytes.
pub const DEFAULT_PUNCTUATION_LOOKBACK: usize = 300;

/// Default floor below which halve-and-retry gives up.
pub const DEFAULT_MIN_PARSE_LIMIT: usize = 4096;

/// Configuration of a [`MorphTokenizer`](crate::analysis::tokenizer::MorphTokenizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Maximum bytes per analyzer call before backoff.
    pub parse_limit: usize,

    /// Maximum distance searched backward for punctuation when cutting a chunk.
    #[serde(alias = "rfind_punct_offset")]
    pub punctuation_lookback: usize,

    /// Smallest chunk budget the retry loop will try.
    pub min_parse_limit: usize,

    /// Encoding of the text to tokenize; must match the analyzer dictionary.
    pub encoding: TextEncoding,

    /// Split pre-segmented input on U+FFFE instead of calling the analyzer.
    pub tokenized_delimiter_mode: bool,

    /// Part-of-speech filtering. `None` indexes every morpheme.
    pub pos_filter: Option<PosFilterConfig>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            parse_limit: DEFAULT_PARSE_LIMIT,
            punctuation_lookback: DEFAULT_PUNCTUATION_LOOKBACK,
            min_parse_limit: DEFAULT_MIN_PARSE_LIMIT,
            encoding: TextEncoding::Utf8,
            tokenized_delimiter_mode: false,
            pos_filter: None,
        }
    }
}

impl TokenizerConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TokenizerConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Load a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace zero limits with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.parse_limit == 0 {
            self.parse_limit = DEFAULT_PARSE_LIMIT;
        }
        if self.punctuation_lookback == 0 {
            self.punctuation_lookback = DEFAULT_PUNCTUATION_LOOKBACK;
        }
        if self.min_parse_limit == 0 {
            self.min_parse_limit = DEFAULT_MIN_PARSE_LIMIT;
        }
        self
    }

    /// Check that the parse limit exceeds the retry floor and the filter pattern compiles.
    pub fn validate(&self) -> Result<()> {
        if self.min_parse_limit == 0 {
            return Err(KiridashiError::configuration(
                "min_parse_limit must be at least 1",
            ));
        }
        if self.parse_limit <= self.min_parse_limit {
            return Err(KiridashiError::configuration(format!(
                "parse_limit ({}) must be greater than min_parse_limit ({})",
                self.parse_limit, self.min_parse_limit
            )));
        }
        if let Some(filter) = &self.pos_filter {
            if let Some(pattern) = &filter.pattern {
                regex::bytes::Regex::new(pattern).map_err(|e| {
                    KiridashiError::configuration(format!("invalid pos_filter pattern: {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Set the parse limit.
    pub fn with_parse_limit(mut self, parse_limit: usize) -> Self {
        self.parse_limit = parse_limit;
        self
    }

    /// Set the punctuation lookback.
    pub fn with_punctuation_lookback(mut self, lookback: usize) -> Self {
        self.punctuation_lookback = lookback;
        self
    }

    /// Set the retry floor.
    pub fn with_min_parse_limit(mut self, min_parse_limit: usize) -> Self {
        self.min_parse_limit = min_parse_limit;
        self
    }

    /// Set the expected text encoding.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable or disable tokenized-delimiter mode.
    pub fn with_tokenized_delimiter_mode(mut self, enabled: bool) -> Self {
        self.tokenized_delimiter_mode = enabled;
        self
    }

    /// Set part-of-speech filtering.
    pub fn with_pos_filter(mut self, filter: PosFilterConfig) -> Self {
        self.pos_filter = Some(filter);
        self
    }
}

/// Part-of-speech filter settings.
///
/// A morpheme is indexed when its coarse part of speech (the feature up to
/// the first comma) is in `keep`, when it is an unknown word and
/// `keep_unknown` is set, or when `pattern` matches its whole feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosFilterConfig {
    /// Coarse parts of speech to index.
    pub keep: Vec<String>,

    /// Index words the dictionary does not know.
    pub keep_unknown: bool,

    /// Regular expression over the raw feature bytes.
    pub pattern: Option<String>,

    /// How filtered morphemes are marked.
    pub skip_mode: SkipMode,
}

impl Default for PosFilterConfig {
    fn default() -> Self {
        Self {
            keep: ["名詞", "動詞", "形容詞", "連体詞"]
                .iter()
                .map(|pos| pos.to_string())
                .collect(),
            keep_unknown: true,
            pattern: None,
            skip_mode: SkipMode::SkipWithPosition,
        }
    }
}
