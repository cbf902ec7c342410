//! Command line argument parsing for the Kiridashi CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::util::encoding::TextEncoding;

/// Kiridashi - chunked morphological tokenization of Japanese text
#[derive(Parser, Debug, Clone)]
#[command(name = "kiridashi")]
#[command(about = "Tokenize Japanese text through a morphological analyzer, chunk by chunk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct KiridashiArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl KiridashiArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Tokenize a file (or stdin) and print its tokens
    Tokenize(TokenizeArgs),

    /// Show where a file (or stdin) would be cut into chunks
    Split(SplitArgs),
}

/// Arguments for tokenizing
#[derive(Parser, Debug, Clone)]
pub struct TokenizeArgs {
    /// Input file; stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Tokenizer configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Encoding of the input
    #[arg(short, long)]
    pub encoding: Option<TextEncoding>,

    /// Dictionary charset of the built-in analyzer (defaults to the input encoding)
    #[arg(long, value_name = "CHARSET")]
    pub dictionary_charset: Option<String>,

    /// Maximum bytes per analyzer call
    #[arg(long)]
    pub parse_limit: Option<usize>,

    /// Backward search window for punctuation, in bytes
    #[arg(long)]
    pub lookback: Option<usize>,

    /// Split on U+FFFE instead of analyzing
    #[arg(long)]
    pub delimited: bool,

    /// Only index nouns, verbs, adjectives and adnominals
    #[arg(long)]
    pub pos_filter: bool,

    /// Make the built-in analyzer reject inputs longer than this
    #[arg(long, value_name = "BYTES")]
    pub max_analyzer_input: Option<usize>,

    /// Also print tokens that are not indexed
    #[arg(long)]
    pub show_skipped: bool,

    /// Read UTF-8 and convert it to the input encoding first
    #[arg(long)]
    pub transcode: bool,
}

/// Arguments for showing chunk bounds
#[derive(Parser, Debug, Clone)]
pub struct SplitArgs {
    /// Input file; stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Encoding of the input
    #[arg(short, long, default_value = "utf-8")]
    pub encoding: TextEncoding,

    /// Maximum chunk size in bytes
    #[arg(long, default_value = "300000")]
    pub parse_limit: usize,

    /// Backward search window for punctuation, in bytes
    #[arg(long, default_value = "300")]
    pub lookback: usize,

    /// Read UTF-8 and convert it to the input encoding first
    #[arg(long)]
    pub transcode: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    #[default]
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_command() {
        let args = KiridashiArgs::try_parse_from([
            "kiridashi",
            "tokenize",
            "input.txt",
            "--encoding",
            "euc-jp",
            "--parse-limit",
            "65536",
            "--pos-filter",
            "--show-skipped",
        ])
        .unwrap();

        if let Command::Tokenize(tokenize_args) = args.command {
            assert_eq!(tokenize_args.file, Some(PathBuf::from("input.txt")));
            assert_eq!(tokenize_args.encoding, Some(TextEncoding::EucJp));
            assert_eq!(tokenize_args.parse_limit, Some(65536));
            assert!(tokenize_args.pos_filter);
            assert!(tokenize_args.show_skipped);
            assert!(!tokenize_args.delimited);
        } else {
            panic!("Expected Tokenize command");
        }
    }

    #[test]
    fn test_split_defaults() {
        let args = KiridashiArgs::try_parse_from(["kiridashi", "split"]).unwrap();

        if let Command::Split(split_args) = args.command {
            assert!(split_args.file.is_none());
            assert_eq!(split_args.encoding, TextEncoding::Utf8);
            assert_eq!(split_args.parse_limit, 300_000);
            assert_eq!(split_args.lookback, 300);
        } else {
            panic!("Expected Split command");
        }
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let result = KiridashiArgs::try_parse_from(["kiridashi", "split", "-e", "latin1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = KiridashiArgs::try_parse_from(["kiridashi", "split"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = KiridashiArgs::try_parse_from(["kiridashi", "-vv", "split"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = KiridashiArgs::try_parse_from(["kiridashi", "--quiet", "split"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            KiridashiArgs::try_parse_from(["kiridashi", "--format", "json", "split"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }
}
