//! Error types for the Kiridashi library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`KiridashiError`] enum. The variants follow the failure classes of a
//! tokenizer session: configuration problems and resource exhaustion are
//! fatal when a session opens, analyzer rejections are retried with a
//! smaller chunk first, and mid-stream failures are recorded on the session
//! instead of being returned.
//!
//! # Examples
//!
//! ```
//! use kiridashi::error::{KiridashiError, Result};
//!
//! fn open_session() -> Result<()> {
//!     Err(KiridashiError::configuration("dictionary charset mismatch"))
//! }
//!
//! match open_session() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Kiridashi operations.
#[derive(Error, Debug)]
pub enum KiridashiError {
    /// I/O errors (reading input files, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors (encoding mismatch, invalid limits, bad patterns)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session state could not be allocated
    #[error("Resource error: {0}")]
    Resource(String),

    /// The morphological analyzer rejected its input or could not be built
    #[error("Analyzer error: {0}")]
    Analyzer(String),

    /// Re-parsing the remainder failed while a session was being iterated
    #[error("Mid-stream error: {0}")]
    MidStream(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with KiridashiError.
pub type Result<T> = std::result::Result<T, KiridashiError>;

impl KiridashiError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        KiridashiError::Configuration(msg.into())
    }

    /// Create a new resource error.
    pub fn resource<S: Into<String>>(msg: S) -> Self {
        KiridashiError::Resource(msg.into())
    }

    /// Create a new analyzer error.
    pub fn analyzer<S: Into<String>>(msg: S) -> Self {
        KiridashiError::Analyzer(msg.into())
    }

    /// Create a new mid-stream error.
    pub fn mid_stream<S: Into<String>>(msg: S) -> Self {
        KiridashiError::MidStream(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        KiridashiError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        KiridashiError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        KiridashiError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether the halve-and-retry loop may recover from this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KiridashiError::Analyzer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = KiridashiError::configuration("charset mismatch");
        assert_eq!(error.to_string(), "Configuration error: charset mismatch");

        let error = KiridashiError::analyzer("buffer exhausted");
        assert_eq!(error.to_string(), "Analyzer error: buffer exhausted");

        let error = KiridashiError::mid_stream("re-parse failed");
        assert_eq!(error.to_string(), "Mid-stream error: re-parse failed");

        let error = KiridashiError::internal("lost analyzer");
        assert_eq!(error.to_string(), "Error: Internal error: lost analyzer");
    }

    #[test]
    fn test_retryable() {
        assert!(KiridashiError::analyzer("x").is_retryable());
        assert!(!KiridashiError::configuration("x").is_retryable());
        assert!(!KiridashiError::resource("x").is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = KiridashiError::from(io_error);

        match error {
            KiridashiError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_anyhow_conversion() {
        let error = KiridashiError::from(anyhow::anyhow!("dictionary missing"));
        assert_eq!(error.to_string(), "Anyhow error: dictionary missing");
    }
}
