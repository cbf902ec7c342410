//! Process-wide analyzer handle.
//!
//! One analyzer instance (with its loaded dictionary) is shared by every
//! session. It is built lazily on first use and every call into it happens
//! under a single mutex, held only for the duration of one parse plus the
//! copy of its result into a [`MorphemeChunk`].

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use lazy_static::lazy_static;
use log::debug;
use parking_lot::Mutex;

use crate::analysis::analyzer::MorphAnalyzer;
use crate::analysis::analyzer::script::ScriptAnalyzer;
use crate::analysis::morpheme::MorphemeChunk;
use crate::error::{KiridashiError, Result};
use crate::util::encoding::TextEncoding;

/// Environment variable naming a Lindera dictionary for the global analyzer.
pub const LINDERA_DICT_ENV: &str = "KIRIDASHI_LINDERA_DICT";

/// Environment variable selecting the charset of the global fallback analyzer.
pub const SCRIPT_CHARSET_ENV: &str = "KIRIDASHI_SCRIPT_CHARSET";

/// Builds the analyzer on first use.
pub type AnalyzerFactory = Box<dyn Fn() -> Result<Box<dyn MorphAnalyzer>> + Send + Sync>;

lazy_static! {
    static ref SOLE_ANALYZER: Arc<SharedAnalyzer> =
        Arc::new(SharedAnalyzer::new(default_analyzer));
}

/// A lazily constructed analyzer guarded by one mutex.
pub struct SharedAnalyzer {
    factory: AnalyzerFactory,
    analyzer: Mutex<Option<Box<dyn MorphAnalyzer>>>,
    encoding: OnceLock<TextEncoding>,
    invocations: AtomicUsize,
}

impl SharedAnalyzer {
    /// Create a handle that builds its analyzer with `factory` on first use.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn MorphAnalyzer>> + Send + Sync + 'static,
    {
        SharedAnalyzer {
            factory: Box::new(factory),
            analyzer: Mutex::new(None),
            encoding: OnceLock::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Create a handle around an already constructed analyzer.
    pub fn from_analyzer<A: MorphAnalyzer + 'static>(analyzer: A) -> Self {
        let encoding = OnceLock::new();
        let _ = encoding.set(analyzer.dictionary_encoding());
        SharedAnalyzer {
            factory: Box::new(|| -> Result<Box<dyn MorphAnalyzer>> {
                Err(KiridashiError::internal("analyzer was supplied prebuilt"))
            }),
            analyzer: Mutex::new(Some(Box::new(analyzer))),
            encoding,
            invocations: AtomicUsize::new(0),
        }
    }

    /// The process-wide handle.
    ///
    /// Its analyzer is a Lindera analyzer when the `lindera` feature is on
    /// and `KIRIDASHI_LINDERA_DICT` is set, otherwise a [`ScriptAnalyzer`]
    /// in the charset named by `KIRIDASHI_SCRIPT_CHARSET` (UTF-8 by default).
    pub fn global() -> Arc<SharedAnalyzer> {
        Arc::clone(&SOLE_ANALYZER)
    }

    /// Encoding of the analyzer's dictionary, constructing the analyzer if
    /// this is the first use.
    pub fn dictionary_encoding(&self) -> Result<TextEncoding> {
        if let Some(encoding) = self.encoding.get() {
            return Ok(*encoding);
        }
        let mut slot = self.analyzer.lock();
        self.ensure_constructed(&mut slot)
    }

    /// Whether the analyzer has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.encoding.get().is_some()
    }

    /// Parse `input`, which starts at byte `base` of the session input, and
    /// copy the result out before the lock is released.
    pub fn parse(&self, input: &[u8], base: usize) -> Result<MorphemeChunk> {
        let mut slot = self.analyzer.lock();
        self.ensure_constructed(&mut slot)?;
        let analyzer = slot
            .as_mut()
            .ok_or_else(|| KiridashiError::internal("analyzer missing after construction"))?;

        self.invocations.fetch_add(1, Ordering::Relaxed);
        let outcome = analyzer
            .analyze(input)
            .and_then(|nodes| MorphemeChunk::copy_from(nodes, base, input.len()));

        match outcome {
            Ok(chunk) => Ok(chunk),
            Err(KiridashiError::Analyzer(message)) => {
                let detail = analyzer
                    .last_error()
                    .map(|detail| format!(" ({detail})"))
                    .unwrap_or_default();
                Err(KiridashiError::analyzer(format!(
                    "{} failed on {} bytes: {message}{detail}",
                    analyzer.name(),
                    input.len()
                )))
            }
            Err(other) => Err(other),
        }
    }

    /// Number of parse calls made so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    fn ensure_constructed(&self, slot: &mut Option<Box<dyn MorphAnalyzer>>) -> Result<TextEncoding> {
        if let Some(analyzer) = slot.as_ref() {
            return Ok(analyzer.dictionary_encoding());
        }

        let analyzer = (self.factory)().map_err(|e| {
            KiridashiError::analyzer(format!("failed to construct analyzer: {e}"))
        })?;
        let encoding = analyzer.dictionary_encoding();
        debug!(
            "[tokenizer][kiridashi] constructed {} analyzer, dictionary charset {}",
            analyzer.name(),
            encoding
        );
        let _ = self.encoding.set(encoding);
        *slot = Some(analyzer);
        Ok(encoding)
    }
}

fn default_analyzer() -> Result<Box<dyn MorphAnalyzer>> {
    if let Some(analyzer) = dictionary_analyzer()? {
        return Ok(analyzer);
    }
    let charset = env::var(SCRIPT_CHARSET_ENV).unwrap_or_else(|_| "utf-8".to_string());
    Ok(Box::new(ScriptAnalyzer::new(TextEncoding::from_charset(&charset))))
}

#[cfg(feature = "lindera")]
fn dictionary_analyzer() -> Result<Option<Box<dyn MorphAnalyzer>>> {
    use crate::analysis::analyzer::lindera::LinderaAnalyzer;

    match env::var(LINDERA_DICT_ENV) {
        Ok(uri) => Ok(Some(Box::new(LinderaAnalyzer::new("normal", &uri)?))),
        Err(_) => Ok(None),
    }
}

#[cfg(not(feature = "lindera"))]
fn dictionary_analyzer() -> Result<Option<Box<dyn MorphAnalyzer>>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::morpheme::MorphemeNode;
    use std::thread;

    struct FixedAnalyzer {
        charset: &'static str,
        nodes: Vec<MorphemeNode>,
        fail: bool,
    }

    impl MorphAnalyzer for FixedAnalyzer {
        fn analyze(&mut self, input: &[u8]) -> Result<&[MorphemeNode]> {
            if self.fail {
                return Err(KiridashiError::analyzer("buffer exhausted"));
            }
            self.nodes = vec![
                MorphemeNode::begin(),
                MorphemeNode::normal(0..input.len(), "名詞"),
                MorphemeNode::end(input.len()),
            ];
            Ok(&self.nodes)
        }

        fn dictionary_charset(&self) -> &str {
            self.charset
        }

        fn last_error(&self) -> Option<&str> {
            self.fail.then_some("input too long")
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn fixed(charset: &'static str, fail: bool) -> FixedAnalyzer {
        FixedAnalyzer {
            charset,
            nodes: Vec::new(),
            fail,
        }
    }

    #[test]
    fn test_lazy_construction_happens_once() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let shared = Arc::new(SharedAnalyzer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(fixed("EUC-JP", false)) as Box<dyn MorphAnalyzer>)
        }));
        assert!(!shared.is_initialized());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.dictionary_encoding().unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), TextEncoding::EucJp);
        }

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(shared.is_initialized());
    }

    #[test]
    fn test_construction_failure_is_reported_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let shared = SharedAnalyzer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(KiridashiError::other("dictionary not found"))
        });

        let error = shared.dictionary_encoding().unwrap_err();
        assert!(error.to_string().contains("dictionary not found"));
        assert!(shared.parse(b"abc", 0).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(shared.invocations(), 0);
    }

    #[test]
    fn test_parse_copies_and_counts() {
        let shared = SharedAnalyzer::from_analyzer(fixed("utf-8", false));
        assert!(shared.is_initialized());

        let chunk = shared.parse(b"abc", 10).unwrap();
        assert_eq!(chunk.range(), 10..13);
        assert_eq!(chunk.get(0).unwrap().surface, 10..13);
        assert_eq!(shared.invocations(), 1);
    }

    #[test]
    fn test_parse_failure_includes_last_error() {
        let shared = SharedAnalyzer::from_analyzer(fixed("utf-8", true));
        let error = shared.parse(b"abc", 0).unwrap_err();
        assert!(error.is_retryable());
        let message = error.to_string();
        assert!(message.contains("fixed failed on 3 bytes"));
        assert!(message.contains("input too long"));
    }
}
