//! Dictionary-free analyzer that segments by character class.
//!
//! Consecutive characters of the same script (ideographs, hiragana,
//! katakana, latin letters, digits) form one morpheme; every symbol stands
//! alone and whitespace is dropped. Feature strings follow the IPADIC layout
//! with a rough part of speech guessed from the script, so part-of-speech
//! filters behave sensibly without a dictionary.

use crate::analysis::analyzer::MorphAnalyzer;
use crate::analysis::morpheme::MorphemeNode;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::{TextEncoding, char_length_at};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Space,
    Ideograph,
    Hiragana,
    Katakana,
    Latin,
    Digit,
    Symbol,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        match c {
            c if c.is_whitespace() => CharClass::Space,
            '\u{3005}' | '\u{3006}' => CharClass::Ideograph,
            '\u{3040}'..='\u{309F}' => CharClass::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                CharClass::Katakana
            }
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FFFF}' => CharClass::Ideograph,
            '0'..='9' | '\u{FF10}'..='\u{FF19}' => CharClass::Digit,
            'a'..='z' | 'A'..='Z' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
                CharClass::Latin
            }
            c if c.is_ascii_punctuation() => CharClass::Symbol,
            '\u{2000}'..='\u{206F}'
            | '\u{3000}'..='\u{303F}'
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}' => CharClass::Symbol,
            _ => CharClass::Other,
        }
    }

    fn joins_runs(&self) -> bool {
        !matches!(self, CharClass::Symbol | CharClass::Space)
    }
}

/// Feature strings pre-encoded in the analyzer's charset.
#[derive(Clone, Debug)]
struct Features {
    noun: Vec<u8>,
    number: Vec<u8>,
    other: Vec<u8>,
    period: Vec<u8>,
    comma: Vec<u8>,
    symbol: Vec<u8>,
    unknown: Vec<u8>,
}

impl Features {
    fn new(encoding: TextEncoding) -> Self {
        let encode = |text: &str| encoding.encode(text).into_owned();
        Features {
            noun: encode("名詞,一般,*,*,*,*,*"),
            number: encode("名詞,数,*,*,*,*,*"),
            other: encode("その他,*,*,*,*,*,*"),
            period: encode("記号,句点,*,*,*,*,*"),
            comma: encode("記号,読点,*,*,*,*,*"),
            symbol: encode("記号,一般,*,*,*,*,*"),
            unknown: encode("名詞,一般,*,*,*,*,*"),
        }
    }
}

/// Character-class analyzer.
///
/// # Examples
///
/// ```
/// use kiridashi::analysis::analyzer::{MorphAnalyzer, ScriptAnalyzer};
/// use kiridashi::util::encoding::TextEncoding;
///
/// let mut analyzer = ScriptAnalyzer::new(TextEncoding::Utf8);
/// let input = "東京タワー".as_bytes();
/// let nodes = analyzer.analyze(input).unwrap();
/// // begin, 東京, タワー, end
/// assert_eq!(nodes.len(), 4);
/// assert_eq!(&input[nodes[2].surface.clone()], "タワー".as_bytes());
/// ```
#[derive(Clone, Debug)]
pub struct ScriptAnalyzer {
    encoding: TextEncoding,
    max_input: Option<usize>,
    features: Features,
    nodes: Vec<MorphemeNode>,
    last_error: Option<String>,
}

impl ScriptAnalyzer {
    /// Create an analyzer for text in `encoding`.
    pub fn new(encoding: TextEncoding) -> Self {
        ScriptAnalyzer {
            encoding,
            max_input: None,
            features: Features::new(encoding),
            nodes: Vec::new(),
            last_error: None,
        }
    }

    /// Reject inputs longer than `max_input` bytes, like an analyzer with a
    /// fixed internal buffer.
    pub fn with_max_input(mut self, max_input: usize) -> Self {
        self.max_input = Some(max_input);
        self
    }

    fn classify(&self, character: &[u8]) -> CharClass {
        let decoded = match self.encoding {
            TextEncoding::Utf8 => std::str::from_utf8(character)
                .ok()
                .and_then(|s| s.chars().next()),
            TextEncoding::None => match character {
                [byte] if byte.is_ascii() => Some(*byte as char),
                _ => None,
            },
            TextEncoding::EucJp | TextEncoding::ShiftJis => {
                self.encoding.codec().and_then(|codec| {
                    codec
                        .decode_without_bom_handling_and_without_replacement(character)
                        .and_then(|s| s.chars().next())
                })
            }
        };
        decoded.map_or(CharClass::Other, CharClass::of)
    }

    fn node(&self, class: CharClass, start: usize, end: usize, character: &[u8]) -> MorphemeNode {
        let features = &self.features;
        match class {
            CharClass::Ideograph | CharClass::Katakana | CharClass::Latin => {
                MorphemeNode::normal(start..end, features.noun.clone())
            }
            CharClass::Digit => MorphemeNode::normal(start..end, features.number.clone()),
            CharClass::Hiragana => MorphemeNode::normal(start..end, features.other.clone()),
            CharClass::Symbol => {
                let marks = self.encoding.punctuation_marks();
                let feature = if marks.first().is_some_and(|mark| *mark == character) {
                    &features.period
                } else if marks.get(1).is_some_and(|mark| *mark == character) {
                    &features.comma
                } else {
                    &features.symbol
                };
                MorphemeNode::normal(start..end, feature.clone())
            }
            CharClass::Space | CharClass::Other => {
                MorphemeNode::unknown(start..end, features.unknown.clone())
            }
        }
    }
}

impl MorphAnalyzer for ScriptAnalyzer {
    fn analyze(&mut self, input: &[u8]) -> Result<&[MorphemeNode]> {
        if let Some(limit) = self.max_input {
            if input.len() > limit {
                self.last_error = Some(format!(
                    "input of {} bytes exceeds the {limit}-byte buffer",
                    input.len()
                ));
                return Err(KiridashiError::analyzer("buffer overflow"));
            }
        }
        self.last_error = None;

        let mut nodes = vec![MorphemeNode::begin()];
        let mut run: Option<(CharClass, usize, usize)> = None;
        let mut offset = 0;

        while offset < input.len() {
            // Malformed bytes become one-byte unknown words.
            let (length, class) = match char_length_at(input, offset, self.encoding) {
                0 => (1, CharClass::Other),
                length => (length, self.classify(&input[offset..offset + length])),
            };

            match run {
                Some((current, start, _)) if current == class && class.joins_runs() => {
                    run = Some((current, start, offset + length));
                }
                _ => {
                    if let Some((current, start, end)) = run.take() {
                        nodes.push(self.node(current, start, end, &input[start..end]));
                    }
                    if class != CharClass::Space {
                        run = Some((class, offset, offset + length));
                    }
                }
            }
            offset += length;
        }
        if let Some((current, start, end)) = run {
            nodes.push(self.node(current, start, end, &input[start..end]));
        }
        nodes.push(MorphemeNode::end(input.len()));

        self.nodes = nodes;
        Ok(&self.nodes)
    }

    fn dictionary_charset(&self) -> &str {
        self.encoding.name()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn name(&self) -> &'static str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::morpheme::NodeStatus;

    fn surfaces(encoding: TextEncoding, text: &str) -> Vec<String> {
        let input = encoding.encode(text).into_owned();
        let mut analyzer = ScriptAnalyzer::new(encoding);
        let nodes = analyzer.analyze(&input).unwrap();
        assert_eq!(nodes.first().unwrap().status, NodeStatus::Begin);
        assert_eq!(nodes.last().unwrap().status, NodeStatus::End);
        nodes[1..nodes.len() - 1]
            .iter()
            .map(|node| encoding.decode_lossy(&input[node.surface.clone()]).into_owned())
            .collect()
    }

    #[test]
    fn test_segments_by_script() {
        let expected = vec!["これは", "日本語", "です", "。"];
        for encoding in [TextEncoding::Utf8, TextEncoding::EucJp, TextEncoding::ShiftJis] {
            assert_eq!(surfaces(encoding, "これは日本語です。"), expected, "{encoding}");
        }
    }

    #[test]
    fn test_mixed_scripts_and_whitespace() {
        assert_eq!(
            surfaces(TextEncoding::Utf8, "東京タワー 333m!!"),
            vec!["東京", "タワー", "333", "m", "!", "!"]
        );
    }

    #[test]
    fn test_features_are_encoded_in_dictionary_charset() {
        let encoding = TextEncoding::ShiftJis;
        let input = encoding.encode("本。").into_owned();
        let mut analyzer = ScriptAnalyzer::new(encoding);
        let nodes = analyzer.analyze(&input).unwrap();
        assert_eq!(
            encoding.decode_lossy(&nodes[1].feature),
            "名詞,一般,*,*,*,*,*"
        );
        assert_eq!(
            encoding.decode_lossy(&nodes[2].feature),
            "記号,句点,*,*,*,*,*"
        );
    }

    #[test]
    fn test_malformed_bytes_become_unknown_words() {
        let mut analyzer = ScriptAnalyzer::new(TextEncoding::Utf8);
        let nodes = analyzer.analyze(b"a\xFFb").unwrap();
        let statuses: Vec<NodeStatus> = nodes.iter().map(|node| node.status).collect();
        assert_eq!(
            statuses,
            vec![
                NodeStatus::Begin,
                NodeStatus::Normal,
                NodeStatus::Unknown,
                NodeStatus::Normal,
                NodeStatus::End
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let mut analyzer = ScriptAnalyzer::new(TextEncoding::Utf8);
        let nodes = analyzer.analyze(b"").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_max_input() {
        let mut analyzer = ScriptAnalyzer::new(TextEncoding::Utf8).with_max_input(4);
        assert!(analyzer.analyze(b"abcd").is_ok());
        assert!(analyzer.last_error().is_none());
        assert!(analyzer.analyze(b"abcde").is_err());
        assert_eq!(
            analyzer.last_error(),
            Some("input of 5 bytes exceeds the 4-byte buffer")
        );
    }

    #[test]
    fn test_dictionary_encoding() {
        let analyzer = ScriptAnalyzer::new(TextEncoding::EucJp);
        assert_eq!(analyzer.dictionary_charset(), "euc-jp");
        assert_eq!(analyzer.dictionary_encoding(), TextEncoding::EucJp);
    }
}
