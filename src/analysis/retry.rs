//! Analyzer invocation with halve-and-retry.
//!
//! The chunk size that an analyzer accepts is not known in advance. Each
//! chunk is first cut at the configured budget; whenever the analyzer
//! rejects it, the budget is halved and the chunk cut again, until it parses
//! or the budget drops below the floor. The next chunk starts over from the
//! configured budget.

use log::{debug, info};

use crate::analysis::analyzer::SharedAnalyzer;
use crate::analysis::morpheme::MorphemeChunk;
use crate::analysis::splitter::split;
use crate::config::TokenizerConfig;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::TextEncoding;

/// Size limits for one parse with retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseBudget {
    /// Budget of the first attempt
    pub initial: usize,
    /// Smallest budget still attempted
    pub floor: usize,
    /// Punctuation search window for the splitter
    pub punctuation_lookback: usize,
}

impl From<&TokenizerConfig> for ParseBudget {
    fn from(config: &TokenizerConfig) -> Self {
        ParseBudget {
            initial: config.parse_limit,
            floor: config.min_parse_limit.max(1),
            punctuation_lookback: config.punctuation_lookback,
        }
    }
}

/// Parse the chunk of `buffer` that starts at `start`.
///
/// Returns the parsed chunk; its [`MorphemeChunk::range`] ends where the
/// next chunk begins. Errors other than analyzer rejections (for example a
/// failed allocation while copying nodes) are returned without retrying.
pub fn parse_with_retry(
    analyzer: &SharedAnalyzer,
    buffer: &[u8],
    encoding: TextEncoding,
    start: usize,
    budget: ParseBudget,
) -> Result<MorphemeChunk> {
    let mut limit = budget.initial;
    loop {
        if limit < budget.floor {
            return Err(KiridashiError::analyzer(format!(
                "cannot parse input at offset {start}: chunk budget fell below {} bytes",
                budget.floor
            )));
        }

        let end = split(buffer, encoding, start, limit, budget.punctuation_lookback);
        match analyzer.parse(&buffer[start..end], start) {
            Ok(chunk) => {
                debug!(
                    "[tokenizer][kiridashi] parsed bytes {}..{} into {} nodes",
                    start,
                    end,
                    chunk.len()
                );
                return Ok(chunk);
            }
            Err(e) if e.is_retryable() => {
                info!(
                    "[tokenizer][kiridashi] {e}; retrying offset {start} with a {}-byte budget",
                    limit / 2
                );
                limit /= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::ScriptAnalyzer;

    fn budget(initial: usize, floor: usize) -> ParseBudget {
        ParseBudget {
            initial,
            floor,
            punctuation_lookback: 300,
        }
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let analyzer = SharedAnalyzer::from_analyzer(ScriptAnalyzer::new(TextEncoding::Utf8));
        let text = "吾輩は猫である。".as_bytes();
        let chunk = parse_with_retry(&analyzer, text, TextEncoding::Utf8, 0, budget(1000, 10))
            .unwrap();
        assert_eq!(chunk.range(), 0..text.len());
        assert_eq!(analyzer.invocations(), 1);
    }

    #[test]
    fn test_budget_halves_until_accepted() {
        let analyzer = SharedAnalyzer::from_analyzer(
            ScriptAnalyzer::new(TextEncoding::Utf8).with_max_input(20_000),
        );
        let text = "a".repeat(150_000);
        let chunk = parse_with_retry(
            &analyzer,
            text.as_bytes(),
            TextEncoding::Utf8,
            0,
            budget(100_000, 4096),
        )
        .unwrap();

        // 100000, 50000 and 25000 are rejected; 12500 fits.
        assert_eq!(analyzer.invocations(), 4);
        assert_eq!(chunk.range(), 0..12_500);
    }

    #[test]
    fn test_floor_stops_retrying() {
        let analyzer = SharedAnalyzer::from_analyzer(
            ScriptAnalyzer::new(TextEncoding::Utf8).with_max_input(1000),
        );
        let text = "a".repeat(20_000);
        let error = parse_with_retry(
            &analyzer,
            text.as_bytes(),
            TextEncoding::Utf8,
            0,
            budget(16_384, 4096),
        )
        .unwrap_err();

        // 16384, 8192 and 4096 are attempted; 2048 is below the floor.
        assert_eq!(analyzer.invocations(), 3);
        assert!(matches!(error, KiridashiError::Analyzer(_)));
        assert!(error.to_string().contains("below 4096"));
    }

    #[test]
    fn test_each_call_starts_from_initial_budget() {
        let analyzer = SharedAnalyzer::from_analyzer(
            ScriptAnalyzer::new(TextEncoding::Utf8).with_max_input(3000),
        );
        let text = "a".repeat(10_000);
        let first = parse_with_retry(
            &analyzer,
            text.as_bytes(),
            TextEncoding::Utf8,
            0,
            budget(4000, 1000),
        )
        .unwrap();
        assert_eq!(first.range(), 0..2000);
        assert_eq!(analyzer.invocations(), 2);

        let second = parse_with_retry(
            &analyzer,
            text.as_bytes(),
            TextEncoding::Utf8,
            first.range().end,
            budget(4000, 1000),
        )
        .unwrap();
        assert_eq!(second.range(), 2000..4000);
        assert_eq!(analyzer.invocations(), 4);
    }

    #[test]
    fn test_budget_from_config() {
        let config = TokenizerConfig::default().with_punctuation_lookback(64);
        let budget = ParseBudget::from(&config);
        assert_eq!(budget.initial, 300_000);
        assert_eq!(budget.floor, 4096);
        assert_eq!(budget.punctuation_lookback, 64);
    }
}
