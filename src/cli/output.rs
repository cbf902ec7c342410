//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::analysis::classify::PosFilter;
use crate::analysis::splitter::ChunkBounds;
use crate::analysis::token::{SkipMode, Token, TokenStatus};
use crate::cli::args::{KiridashiArgs, OutputFormat};
use crate::error::Result;
use crate::util::encoding::TextEncoding;

/// One token as printed by the CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    pub position: usize,
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub status: TokenStatus,
    pub skip: SkipMode,
    pub unknown: bool,
    pub pos: Option<String>,
}

impl TokenRecord {
    /// Decode `token` for display; its bytes are in `encoding`.
    pub fn from_token(token: &Token, encoding: TextEncoding) -> Self {
        TokenRecord {
            position: token.position,
            surface: token.text(encoding).into_owned(),
            start: token.start_offset,
            end: token.end_offset,
            status: token.status,
            skip: token.skip,
            unknown: token.unknown,
            pos: token
                .feature
                .as_deref()
                .map(|feature| encoding.decode_lossy(PosFilter::coarse_pos(feature)).into_owned()),
        }
    }
}

/// Result structure for tokenization.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenizeResult {
    pub encoding: TextEncoding,
    pub input_bytes: usize,
    pub tokens: Vec<TokenRecord>,
    pub total_tokens: usize,
    pub indexed_tokens: usize,
    pub analyzer_calls: usize,
    pub duration_ms: u64,
    pub failure: Option<String>,
}

/// Result structure for chunk splitting.
#[derive(Debug, Serialize, Deserialize)]
pub struct SplitResult {
    pub encoding: TextEncoding,
    pub input_bytes: usize,
    pub chunks: Vec<ChunkBounds>,
}

/// Human-readable rendering of a result.
pub trait HumanOutput {
    fn print_human(&self, args: &KiridashiArgs);
}

impl HumanOutput for TokenizeResult {
    fn print_human(&self, args: &KiridashiArgs) {
        for token in &self.tokens {
            let mut flags = Vec::new();
            if token.unknown {
                flags.push("unknown");
            }
            match token.skip {
                SkipMode::None => {}
                SkipMode::Skip => flags.push("skip"),
                SkipMode::SkipWithPosition => flags.push("skip+pos"),
            }
            if token.status == TokenStatus::Last {
                flags.push("last");
            }
            println!(
                "{:>6}  {:>8}..{:<8}  {}\t{}\t{}",
                token.position,
                token.start,
                token.end,
                token.surface,
                token.pos.as_deref().unwrap_or("-"),
                flags.join(",")
            );
        }

        if args.verbosity() > 0 {
            println!();
            println!(
                "{} tokens ({} indexed) from {} bytes of {} in {} analyzer calls, {}ms",
                self.total_tokens,
                self.indexed_tokens,
                self.input_bytes,
                self.encoding,
                self.analyzer_calls,
                self.duration_ms
            );
        }
        if let Some(failure) = &self.failure {
            println!("Stream ended early: {failure}");
        }
    }
}

impl HumanOutput for SplitResult {
    fn print_human(&self, args: &KiridashiArgs) {
        for (i, chunk) in self.chunks.iter().enumerate() {
            println!(
                "{:>4}  {:>10}..{:<10}  {} bytes",
                i,
                chunk.start,
                chunk.end,
                chunk.len()
            );
        }
        if args.verbosity() > 0 {
            println!();
            println!(
                "{} chunks from {} bytes of {}",
                self.chunks.len(),
                self.input_bytes,
                self.encoding
            );
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &KiridashiArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &KiridashiArgs) -> Result<()> {
    let json = format_json(result, args.pretty)?;
    println!("{json}");
    Ok(())
}

fn format_json<T: Serialize>(result: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}
