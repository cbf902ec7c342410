//! Utility modules for Kiridashi.

pub mod encoding;

// Re-export commonly used types
pub use encoding::*;
