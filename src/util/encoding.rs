//! Byte-exact character boundary helpers for UTF-8, EUC-JP and Shift-JIS.
//!
//! The tokenizer never decodes its input; it only needs to know where a
//! character starts, how long it is, and whether it is a punctuation mark.
//! These helpers answer those questions for the three encodings a Japanese
//! dictionary can be compiled in. `TextEncoding::None` treats every byte as
//! one character.
//!
//! # Examples
//!
//! ```
//! use kiridashi::util::encoding::{TextEncoding, previous_char_boundary};
//!
//! let text = "日本語".as_bytes();
//! // Offset 4 is inside "本"; the boundary before it is 3.
//! assert_eq!(previous_char_boundary(text, TextEncoding::Utf8, 4), 3);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KiridashiError, Result};

/// Text encoding of an input buffer or of an analyzer dictionary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// EUC-JP
    #[serde(rename = "euc-jp", alias = "EUC-JP")]
    EucJp,
    /// Shift-JIS
    #[serde(rename = "shift_jis", alias = "shift-jis", alias = "sjis", alias = "Shift_JIS")]
    ShiftJis,
    /// Unknown or single-byte encoding
    #[serde(rename = "none")]
    None,
}

// 。 and 、 in each encoding.
const UTF8_MARKS: &[&[u8]] = &[b"\xE3\x80\x82", b"\xE3\x80\x81"];
const EUC_JP_MARKS: &[&[u8]] = &[b"\xA1\xA3", b"\xA1\xA2"];
const SHIFT_JIS_MARKS: &[&[u8]] = &[b"\x81\x42", b"\x81\x41"];

impl TextEncoding {
    /// Map a dictionary charset name to an encoding.
    ///
    /// Unrecognized names map to [`TextEncoding::None`].
    pub fn from_charset(charset: &str) -> Self {
        let charset = charset.trim();
        if charset.eq_ignore_ascii_case("euc-jp") {
            TextEncoding::EucJp
        } else if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8") {
            TextEncoding::Utf8
        } else if charset.eq_ignore_ascii_case("shift_jis")
            || charset.eq_ignore_ascii_case("shift-jis")
            || charset.eq_ignore_ascii_case("sjis")
        {
            TextEncoding::ShiftJis
        } else {
            TextEncoding::None
        }
    }

    /// Canonical charset name.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::EucJp => "euc-jp",
            TextEncoding::ShiftJis => "shift_jis",
            TextEncoding::None => "none",
        }
    }

    /// The `encoding_rs` codec for this encoding, if it is a real charset.
    pub fn codec(&self) -> Option<&'static encoding_rs::Encoding> {
        match self {
            TextEncoding::Utf8 => Some(encoding_rs::UTF_8),
            TextEncoding::EucJp => Some(encoding_rs::EUC_JP),
            TextEncoding::ShiftJis => Some(encoding_rs::SHIFT_JIS),
            TextEncoding::None => None,
        }
    }

    /// Full-width punctuation marks (ideographic full stop and comma) as
    /// they are spelled in this encoding.
    pub fn punctuation_marks(&self) -> &'static [&'static [u8]] {
        match self {
            TextEncoding::Utf8 => UTF8_MARKS,
            TextEncoding::EucJp => EUC_JP_MARKS,
            TextEncoding::ShiftJis => SHIFT_JIS_MARKS,
            TextEncoding::None => &[],
        }
    }

    /// Encode UTF-8 text into this encoding. Unmappable characters become
    /// numeric character references, as `encoding_rs` does.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self.codec() {
            Some(codec) => codec.encode(text).0,
            None => Cow::Borrowed(text.as_bytes()),
        }
    }

    /// Decode bytes in this encoding for display, replacing malformed
    /// sequences.
    pub fn decode_lossy<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self.codec() {
            Some(codec) => codec.decode_without_bom_handling(bytes).0,
            None => String::from_utf8_lossy(bytes),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = KiridashiError;

    fn from_str(s: &str) -> Result<Self> {
        match TextEncoding::from_charset(s) {
            TextEncoding::None if !s.trim().eq_ignore_ascii_case("none") => Err(
                KiridashiError::invalid_argument(format!("unknown text encoding '{s}'")),
            ),
            encoding => Ok(encoding),
        }
    }
}

/// An immutable byte sequence tagged with its encoding.
///
/// Borrowed for sessions opened over caller-owned bytes, owned when the
/// session must outlive its input (see `Tokenizer::tokenize`).
#[derive(Clone, Debug)]
pub struct EncodedBuffer<'a> {
    bytes: Cow<'a, [u8]>,
    encoding: TextEncoding,
}

impl<'a> EncodedBuffer<'a> {
    /// View over borrowed bytes.
    pub fn new(bytes: &'a [u8], encoding: TextEncoding) -> Self {
        EncodedBuffer {
            bytes: Cow::Borrowed(bytes),
            encoding,
        }
    }

    /// Buffer that owns its bytes.
    pub fn owned(bytes: Vec<u8>, encoding: TextEncoding) -> EncodedBuffer<'static> {
        EncodedBuffer {
            bytes: Cow::Owned(bytes),
            encoding,
        }
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoding of the bytes.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Step backward from `offset` to the nearest offset at which a character
/// begins. Offsets past the end are clamped to `buffer.len()`, which is
/// always a boundary.
///
/// UTF-8 skips back over continuation bytes. Shift-JIS counts the run of
/// lead-range bytes that precedes the offset; an odd run means the offset
/// sits between a lead byte and its trail byte. EUC-JP walks forward from the
/// start of the run of high bytes, so 3-byte JIS X 0212 characters (`0x8F`
/// lead) are stepped over whole.
pub fn previous_char_boundary(buffer: &[u8], encoding: TextEncoding, offset: usize) -> usize {
    let mut offset = offset.min(buffer.len());
    match encoding {
        TextEncoding::Utf8 => {
            while offset > 0 && offset < buffer.len() && is_utf8_continuation(buffer[offset]) {
                offset -= 1;
            }
        }
        TextEncoding::EucJp => offset = euc_jp_boundary(buffer, offset),
        TextEncoding::ShiftJis => {
            while offset > 0 && !shift_jis_boundary(buffer, offset) {
                offset -= 1;
            }
        }
        TextEncoding::None => {}
    }
    offset
}

/// Byte length of the character starting at `offset`.
///
/// Returns 0 when the bytes at `offset` are malformed or truncated, or when
/// `offset` is at or past the end; callers treat 0 as "stop here".
pub fn char_length_at(buffer: &[u8], offset: usize, encoding: TextEncoding) -> usize {
    let Some(&lead) = buffer.get(offset) else {
        return 0;
    };
    let remaining = buffer.len() - offset;

    let length = match encoding {
        TextEncoding::Utf8 => match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 0,
        },
        TextEncoding::EucJp => match lead {
            0x00..=0x7F => 1,
            0x8E => 2,
            0x8F => 3,
            0xA1..=0xFE => 2,
            _ => 0,
        },
        TextEncoding::ShiftJis => match lead {
            0x00..=0x7F | 0xA1..=0xDF => 1,
            lead if is_shift_jis_lead(lead) => 2,
            _ => 0,
        },
        TextEncoding::None => 1,
    };

    if length == 0 || length > remaining {
        return 0;
    }

    let trail_ok = match encoding {
        TextEncoding::Utf8 => buffer[offset + 1..offset + length]
            .iter()
            .all(|&b| is_utf8_continuation(b) && b != 0xC0),
        TextEncoding::EucJp => buffer[offset + 1..offset + length]
            .iter()
            .all(|&b| b >= 0xA1),
        TextEncoding::ShiftJis => buffer[offset + 1..offset + length]
            .iter()
            .all(|&b| (0x40..=0xFC).contains(&b) && b != 0x7F),
        TextEncoding::None => true,
    };

    if trail_ok { length } else { 0 }
}

/// Whether the character at `offset` is ASCII punctuation or one of the
/// full-width marks 。 and 、 in `encoding`.
pub fn is_punctuation_at(buffer: &[u8], offset: usize, encoding: TextEncoding) -> bool {
    match char_length_at(buffer, offset, encoding) {
        0 => false,
        length => is_punctuation(&buffer[offset..offset + length], encoding),
    }
}

/// Whether `character` (exactly one encoded character) is punctuation.
pub(crate) fn is_punctuation(character: &[u8], encoding: TextEncoding) -> bool {
    match character {
        [byte] => byte.is_ascii_punctuation(),
        _ => encoding
            .punctuation_marks()
            .iter()
            .any(|mark| *mark == character),
    }
}

// 0xC0 is never a valid lead byte, so it is stepped over like a continuation.
fn is_utf8_continuation(byte: u8) -> bool {
    (0x80..=0xC0).contains(&byte)
}

fn is_shift_jis_lead(byte: u8) -> bool {
    matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
}

// Every high byte run starts on a character, since ASCII is single-byte.
// Malformed bytes advance one at a time.
fn euc_jp_boundary(buffer: &[u8], offset: usize) -> usize {
    let run = buffer[..offset]
        .iter()
        .rev()
        .take_while(|&&b| b >= 0x80)
        .count();
    let mut position = offset - run;
    while position < offset {
        let length = char_length_at(buffer, position, TextEncoding::EucJp).max(1);
        if position + length > offset {
            break;
        }
        position += length;
    }
    position
}

fn shift_jis_boundary(buffer: &[u8], offset: usize) -> bool {
    let run = buffer[..offset]
        .iter()
        .rev()
        .take_while(|&&b| is_shift_jis_lead(b))
        .count();
    run % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "これはPenです。日本語、テスト!";

    fn encoded(encoding: TextEncoding) -> Vec<u8> {
        encoding.encode(SAMPLE).into_owned()
    }

    /// Offsets at which characters begin, computed by walking forward.
    fn boundaries(buffer: &[u8], encoding: TextEncoding) -> Vec<usize> {
        let mut result = vec![0];
        let mut offset = 0;
        while offset < buffer.len() {
            let length = char_length_at(buffer, offset, encoding);
            assert!(length > 0, "malformed at {offset}");
            offset += length;
            result.push(offset);
        }
        result
    }

    #[test]
    fn test_from_charset() {
        assert_eq!(TextEncoding::from_charset("EUC-JP"), TextEncoding::EucJp);
        assert_eq!(TextEncoding::from_charset("utf8"), TextEncoding::Utf8);
        assert_eq!(TextEncoding::from_charset("UTF-8"), TextEncoding::Utf8);
        assert_eq!(TextEncoding::from_charset("SJIS"), TextEncoding::ShiftJis);
        assert_eq!(TextEncoding::from_charset("shift-jis"), TextEncoding::ShiftJis);
        assert_eq!(TextEncoding::from_charset("latin1"), TextEncoding::None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("sjis".parse::<TextEncoding>().unwrap(), TextEncoding::ShiftJis);
        assert_eq!("none".parse::<TextEncoding>().unwrap(), TextEncoding::None);
        assert!("koi8-r".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_punctuation_marks_match_encoders() {
        for encoding in [TextEncoding::Utf8, TextEncoding::EucJp, TextEncoding::ShiftJis] {
            let marks = encoding.punctuation_marks();
            assert_eq!(marks[0], &*encoding.encode("。"));
            assert_eq!(marks[1], &*encoding.encode("、"));
        }
    }

    #[test]
    fn test_previous_boundary_never_inside_character() {
        for encoding in [TextEncoding::Utf8, TextEncoding::EucJp, TextEncoding::ShiftJis] {
            let buffer = encoded(encoding);
            let valid = boundaries(&buffer, encoding);
            for offset in 0..=buffer.len() {
                let snapped = previous_char_boundary(&buffer, encoding, offset);
                assert!(snapped <= offset);
                assert!(
                    valid.contains(&snapped),
                    "{encoding}: offset {offset} snapped to {snapped}"
                );
                if valid.contains(&offset) {
                    assert_eq!(snapped, offset);
                }
            }
        }
    }

    #[test]
    fn test_euc_jp_three_byte_and_half_width_kana() {
        // 丂 (JIS X 0212), あ, ｱ (half-width kana), 丂 again.
        let buffer: &[u8] = b"\x8F\xB0\xA1\xA4\xA2\x8E\xB1\x8F\xB0\xA1a";
        let valid = boundaries(buffer, TextEncoding::EucJp);
        assert_eq!(valid, vec![0, 3, 5, 7, 10, 11]);

        let snapped: Vec<usize> = (0..=buffer.len())
            .map(|offset| previous_char_boundary(buffer, TextEncoding::EucJp, offset))
            .collect();
        assert_eq!(snapped, vec![0, 0, 0, 3, 3, 5, 5, 7, 7, 7, 10, 11]);
    }

    #[test]
    fn test_euc_jp_long_run_of_three_byte_characters() {
        let buffer = b"\x8F\xB0\xA1".repeat(3000);
        assert_eq!(previous_char_boundary(&buffer, TextEncoding::EucJp, 4096), 4095);
        assert_eq!(previous_char_boundary(&buffer, TextEncoding::EucJp, 4097), 4095);
        assert_eq!(previous_char_boundary(&buffer, TextEncoding::EucJp, 4098), 4098);
    }

    #[test]
    fn test_previous_boundary_clamps_and_none_is_noop() {
        let buffer = "日本".as_bytes();
        assert_eq!(previous_char_boundary(buffer, TextEncoding::Utf8, 100), 6);
        assert_eq!(previous_char_boundary(buffer, TextEncoding::None, 4), 4);
    }

    #[test]
    fn test_shift_jis_trail_byte_backslash() {
        // "表" is 0x95 0x5C; the trail byte is ASCII '\'.
        let buffer = TextEncoding::ShiftJis.encode("a表").into_owned();
        assert_eq!(buffer, b"a\x95\x5C");
        assert_eq!(previous_char_boundary(&buffer, TextEncoding::ShiftJis, 2), 1);
        assert!(!is_punctuation_at(&buffer, 1, TextEncoding::ShiftJis));
    }

    #[test]
    fn test_char_length_at() {
        let utf8 = "aあ𠮷".as_bytes();
        assert_eq!(char_length_at(utf8, 0, TextEncoding::Utf8), 1);
        assert_eq!(char_length_at(utf8, 1, TextEncoding::Utf8), 3);
        assert_eq!(char_length_at(utf8, 4, TextEncoding::Utf8), 4);
        assert_eq!(char_length_at(utf8, 2, TextEncoding::Utf8), 0);
        assert_eq!(char_length_at(utf8, utf8.len(), TextEncoding::Utf8), 0);

        // Truncated multi-byte sequences are malformed.
        assert_eq!(char_length_at(&utf8[..3], 1, TextEncoding::Utf8), 0);

        let sjis = TextEncoding::ShiftJis.encode("ｱあ").into_owned();
        assert_eq!(char_length_at(&sjis, 0, TextEncoding::ShiftJis), 1);
        assert_eq!(char_length_at(&sjis, 1, TextEncoding::ShiftJis), 2);

        let euc = TextEncoding::EucJp.encode("ｱあ").into_owned();
        assert_eq!(char_length_at(&euc, 0, TextEncoding::EucJp), 2);
        assert_eq!(char_length_at(&euc, 2, TextEncoding::EucJp), 2);

        assert_eq!(char_length_at(b"\xFF", 0, TextEncoding::None), 1);
    }

    #[test]
    fn test_is_punctuation_at() {
        for encoding in [TextEncoding::Utf8, TextEncoding::EucJp, TextEncoding::ShiftJis] {
            let buffer = encoding.encode("あ。い、!x").into_owned();
            let valid = boundaries(&buffer, encoding);
            let flags: Vec<bool> = valid[..valid.len() - 1]
                .iter()
                .map(|&offset| is_punctuation_at(&buffer, offset, encoding))
                .collect();
            assert_eq!(flags, vec![false, true, false, true, true, false], "{encoding}");
        }
    }

    #[test]
    fn test_decode_lossy_round_trip() {
        for encoding in [TextEncoding::Utf8, TextEncoding::EucJp, TextEncoding::ShiftJis] {
            let buffer = encoded(encoding);
            assert_eq!(encoding.decode_lossy(&buffer), SAMPLE);
        }
    }

    #[test]
    fn test_encoded_buffer() {
        let buffer = EncodedBuffer::new(b"abc", TextEncoding::Utf8);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.encoding(), TextEncoding::Utf8);

        let owned = EncodedBuffer::owned(Vec::new(), TextEncoding::EucJp);
        assert!(owned.is_empty());
        assert_eq!(owned.bytes(), b"");
    }
}
