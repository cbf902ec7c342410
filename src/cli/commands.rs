//! Command implementations for the Kiridashi CLI.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::warn;

use crate::analysis::analyzer::{ScriptAnalyzer, SharedAnalyzer};
use crate::analysis::splitter::ChunkSplitter;
use crate::analysis::tokenizer::MorphTokenizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{PosFilterConfig, TokenizerConfig};
use crate::error::{KiridashiError, Result};
use crate::util::encoding::TextEncoding;

/// Exit status for a failed command. A stream that ended early still printed
/// the tokens it produced, so it is told apart from a command that printed
/// nothing.
pub fn exit_code(error: &KiridashiError) -> i32 {
    match error {
        KiridashiError::MidStream(_) => 2,
        _ => 1,
    }
}

/// Execute a CLI command.
pub fn execute_command(args: KiridashiArgs) -> Result<()> {
    match &args.command {
        Command::Tokenize(tokenize_args) => tokenize(tokenize_args, &args),
        Command::Split(split_args) => split(split_args, &args),
    }
}

/// Tokenize the input and print its tokens.
fn tokenize(args: &TokenizeArgs, cli_args: &KiridashiArgs) -> Result<()> {
    let config = build_config(args)?;
    let encoding = config.encoding;
    let analyzer = build_analyzer(args, encoding);
    let tokenizer = MorphTokenizer::with_analyzer(analyzer, config)?;

    let input = read_input(args.file.as_deref(), args.transcode, encoding)?;
    let calls_before = tokenizer.analyzer().invocations();
    let start_time = Instant::now();

    let mut session = tokenizer.open(&input)?;
    let mut tokens = Vec::new();
    let mut total_tokens = 0;
    let mut indexed_tokens = 0;
    for token in session.by_ref() {
        total_tokens += 1;
        if token.is_indexed() {
            indexed_tokens += 1;
        } else if !args.show_skipped {
            continue;
        }
        tokens.push(TokenRecord::from_token(&token, encoding));
    }
    let failure = session.failure().map(|e| e.to_string());
    drop(session);

    let result = TokenizeResult {
        encoding,
        input_bytes: input.len(),
        tokens,
        total_tokens,
        indexed_tokens,
        analyzer_calls: tokenizer.analyzer().invocations() - calls_before,
        duration_ms: start_time.elapsed().as_millis() as u64,
        failure,
    };
    output_result("Tokens", &result, cli_args)?;

    match result.failure {
        Some(_) => Err(KiridashiError::mid_stream(format!(
            "input ended early after {total_tokens} tokens"
        ))),
        None => Ok(()),
    }
}

/// Print the chunk bounds the splitter would produce.
fn split(args: &SplitArgs, cli_args: &KiridashiArgs) -> Result<()> {
    if args.parse_limit == 0 {
        return Err(KiridashiError::invalid_argument(
            "--parse-limit must be at least 1",
        ));
    }
    let input = read_input(args.file.as_deref(), args.transcode, args.encoding)?;
    let splitter = ChunkSplitter::new(args.encoding, args.parse_limit, args.lookback);

    let result = SplitResult {
        encoding: args.encoding,
        input_bytes: input.len(),
        chunks: splitter.chunks(&input).collect(),
    };
    output_result("Chunks", &result, cli_args)
}

fn build_config(args: &TokenizeArgs) -> Result<TokenizerConfig> {
    let mut config = match &args.config {
        Some(path) => TokenizerConfig::from_json_file(path)?,
        None => TokenizerConfig::default(),
    };

    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if let Some(parse_limit) = args.parse_limit {
        config.parse_limit = parse_limit;
    }
    if let Some(lookback) = args.lookback {
        config.punctuation_lookback = lookback;
    }
    if args.delimited {
        config.tokenized_delimiter_mode = true;
    }
    if args.pos_filter && config.pos_filter.is_none() {
        config.pos_filter = Some(PosFilterConfig::default());
    }

    let mut config = config.normalized();
    // A file with inconsistent limits is left for validation to reject.
    if args.parse_limit.is_some() && config.parse_limit <= config.min_parse_limit {
        let floor = config.parse_limit.saturating_sub(1).max(1);
        warn!(
            "[tokenizer][kiridashi] --parse-limit {} is not above the retry floor {}; lowering the floor to {}",
            config.parse_limit, config.min_parse_limit, floor
        );
        config.min_parse_limit = floor;
    }

    Ok(config)
}

/// The process-wide analyzer, unless the arguments ask for a built-in one
/// with particular settings.
fn build_analyzer(args: &TokenizeArgs, encoding: TextEncoding) -> Arc<SharedAnalyzer> {
    if args.dictionary_charset.is_none() && args.max_analyzer_input.is_none() {
        return SharedAnalyzer::global();
    }

    let charset = args
        .dictionary_charset
        .as_deref()
        .map_or(encoding, TextEncoding::from_charset);
    let mut analyzer = ScriptAnalyzer::new(charset);
    if let Some(max_input) = args.max_analyzer_input {
        analyzer = analyzer.with_max_input(max_input);
    }
    Arc::new(SharedAnalyzer::from_analyzer(analyzer))
}

/// Read the raw input bytes from `file` or stdin.
fn read_input(file: Option<&Path>, transcode: bool, encoding: TextEncoding) -> Result<Vec<u8>> {
    let bytes = match file {
        Some(path) => fs::read(path)?,
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            bytes
        }
    };

    if !transcode {
        return Ok(bytes);
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| KiridashiError::invalid_argument(format!("input is not UTF-8: {e}")))?;
    Ok(encoding.encode(&text).into_owned())
}
