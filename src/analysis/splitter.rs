//! Chunk splitting at punctuation boundaries.
//!
//! Analyzers fail outright on very long inputs, so a session feeds them
//! bounded chunks. A chunk ends right after the last punctuation mark found
//! within `punctuation_lookback` bytes of the size limit; when there is none
//! the chunk is cut at the last character boundary under the limit.
//!
//! ```text
//!   start                                   start + max_chunk_size
//!     |.......... text 。 text 、 text text text|text text ...
//!                              ^         ^     ^
//!                              |         |     raw cut (snapped to a boundary)
//!                              |         lookback window begins
//!                              cut (after 、)
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use crate::util::encoding::{TextEncoding, char_length_at, is_punctuation, previous_char_boundary};

/// Byte range of one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkBounds {
    /// First byte of the chunk
    pub start: usize,
    /// One past the last byte of the chunk
    pub end: usize,
}

impl ChunkBounds {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The bounds as a range.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Find where the chunk starting at `start` should end.
///
/// Returns `buffer.len()` when the remainder is shorter than
/// `max_chunk_size`. The result never exceeds `start + max_chunk_size` and
/// is greater than `start` whenever input remains.
pub fn split(
    buffer: &[u8],
    encoding: TextEncoding,
    start: usize,
    max_chunk_size: usize,
    punctuation_lookback: usize,
) -> usize {
    let start = start.min(buffer.len());
    let rest = &buffer[start..];
    if rest.len() < max_chunk_size {
        return buffer.len();
    }
    if rest.is_empty() {
        return start;
    }

    let limit = max_chunk_size.max(1);
    let mut cut = previous_char_boundary(rest, encoding, limit);
    if cut == 0 {
        cut = limit;
    }

    let window = previous_char_boundary(rest, encoding, cut.saturating_sub(punctuation_lookback));
    let mut offset = window;
    let mut punctuation_end = None;
    while offset < cut {
        let length = char_length_at(rest, offset, encoding);
        if length == 0 || offset + length > cut {
            break;
        }
        if is_punctuation(&rest[offset..offset + length], encoding) {
            punctuation_end = Some(offset + length);
        }
        offset += length;
    }

    match punctuation_end {
        Some(end) => start + end,
        None => {
            warn!(
                "[tokenizer][kiridashi] no punctuation within {} bytes before offset {}; cutting at {}",
                punctuation_lookback,
                start + limit,
                start + cut
            );
            start + cut
        }
    }
}

/// Splits buffers of one encoding into analyzer-sized chunks.
///
/// # Examples
///
/// ```
/// use kiridashi::analysis::splitter::ChunkSplitter;
/// use kiridashi::util::encoding::TextEncoding;
///
/// let text = "今日は晴れ。明日は雨。".as_bytes();
/// let splitter = ChunkSplitter::new(TextEncoding::Utf8, 20, 300);
/// let bounds = splitter.split(text, 0);
/// assert_eq!(&text[bounds.range()], "今日は晴れ。".as_bytes());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSplitter {
    encoding: TextEncoding,
    max_chunk_size: usize,
    punctuation_lookback: usize,
}

impl ChunkSplitter {
    /// Create a splitter.
    pub fn new(encoding: TextEncoding, max_chunk_size: usize, punctuation_lookback: usize) -> Self {
        ChunkSplitter {
            encoding,
            max_chunk_size,
            punctuation_lookback,
        }
    }

    /// Bounds of the chunk starting at `start`.
    pub fn split(&self, buffer: &[u8], start: usize) -> ChunkBounds {
        let end = split(
            buffer,
            self.encoding,
            start,
            self.max_chunk_size,
            self.punctuation_lookback,
        );
        ChunkBounds {
            start: start.min(end),
            end,
        }
    }

    /// Iterate over consecutive chunks covering `buffer`.
    pub fn chunks<'a>(&self, buffer: &'a [u8]) -> Chunks<'a> {
        Chunks {
            splitter: *self,
            buffer,
            offset: 0,
        }
    }
}

/// Iterator returned by [`ChunkSplitter::chunks`].
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    splitter: ChunkSplitter,
    buffer: &'a [u8],
    offset: usize,
}

impl Iterator for Chunks<'_> {
    type Item = ChunkBounds;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.buffer.len() {
            return None;
        }
        let bounds = self.splitter.split(self.buffer, self.offset);
        if bounds.is_empty() {
            return None;
        }
        self.offset = bounds.end;
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_remainder_is_one_chunk() {
        let text = "短い文。".as_bytes();
        assert_eq!(split(text, TextEncoding::Utf8, 0, 100, 300), text.len());
        assert_eq!(split(text, TextEncoding::Utf8, 3, 100, 300), text.len());
    }

    #[test]
    fn test_cut_lands_after_punctuation() {
        // "あいう。えお" + "かきくけこ": the 。 ends at byte 12.
        let text = "あいう。えおかきくけこ".as_bytes();
        assert_eq!(split(text, TextEncoding::Utf8, 0, 20, 300), 12);
    }

    #[test]
    fn test_ascii_punctuation() {
        let text = b"one, two three four";
        assert_eq!(split(text, TextEncoding::Utf8, 0, 12, 300), 4);
    }

    #[test]
    fn test_hard_cut_snaps_to_boundary() {
        let text = "あいうえおかきくけこ".as_bytes();
        // Byte 10 falls inside "え" (bytes 9..12).
        assert_eq!(split(text, TextEncoding::Utf8, 0, 10, 300), 9);
    }

    #[test]
    fn test_degenerate_window_uses_raw_cut() {
        let text = "あいう".as_bytes();
        assert_eq!(split(text, TextEncoding::Utf8, 0, 2, 300), 2);
    }

    #[test]
    fn test_lookback_limits_search() {
        // 。 ends at byte 6, raw cut at 30: outside a 9-byte window.
        let text = "あ。いうえおかきくけこさしすせ".as_bytes();
        assert_eq!(split(text, TextEncoding::Utf8, 0, 30, 9), 30);
        assert_eq!(split(text, TextEncoding::Utf8, 0, 30, 30), 6);
    }

    #[test]
    fn test_nonzero_start() {
        let text = "前文。あいう、えおかき".as_bytes();
        // From byte 9, the 、 ends at byte 9 + 12 = 21.
        assert_eq!(split(text, TextEncoding::Utf8, 9, 20, 300), 21);
    }

    #[test]
    fn test_legacy_encodings() {
        for encoding in [TextEncoding::EucJp, TextEncoding::ShiftJis] {
            let text = encoding.encode("あいう。えおかきくけこ").into_owned();
            // Two bytes per character: 。 ends at byte 8.
            assert_eq!(split(&text, encoding, 0, 14, 300), 8, "{encoding}");
            // No punctuation: 13 snaps back to 12.
            let plain = encoding.encode("かきくけこさしすせそ").into_owned();
            assert_eq!(split(&plain, encoding, 0, 13, 300), 12, "{encoding}");
        }
    }

    #[test]
    fn test_cut_never_exceeds_limit() {
        let text = "吾輩は猫である。名前はまだ無い、どこで生れたかとんと見当がつかぬ。".as_bytes();
        for max in 1..text.len() {
            let cut = split(text, TextEncoding::Utf8, 0, max, 300);
            assert!(cut <= max, "max {max} gave {cut}");
            assert!(cut >= 1);
        }
    }

    #[test]
    fn test_chunks_cover_buffer() {
        let text = "一文目です。二文目です、三文目。".repeat(20);
        let splitter = ChunkSplitter::new(TextEncoding::Utf8, 64, 30);
        let chunks: Vec<ChunkBounds> = splitter.chunks(text.as_bytes()).collect();

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().unwrap().end, text.len());
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for chunk in &chunks {
            assert!(chunk.len() <= 64);
            assert!(std::str::from_utf8(&text.as_bytes()[chunk.range()]).is_ok());
        }
    }
}
