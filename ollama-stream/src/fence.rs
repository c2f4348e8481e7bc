//! Incremental extraction of fenced code blocks from streamed text.
//!
//! Fragments are appended to an accumulation buffer and the whole buffer
//! is rescanned after every append. When at least one closed fence is
//! found, every closed fence is returned and the buffer is cleared, so an
//! opening marker, tag, or closing marker may be split across any number
//! of fragments. An unterminated fence simply stays in the buffer.
//!
//! Content boundary: the line break that ends the opening line belongs to
//! the opening marker; everything after it up to the closing backticks is
//! the code, verbatim.
//!
//! ~~~text
//! ```go\n          -> language "go"
//! fmt.Println()\n  -> code "fmt.Println()\n"
//! ```              -> closing marker
//! ~~~

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Opening run of 3+ backticks, a tag with no whitespace or backticks, an
/// optional line break, then the shortest content up to the next 3+ run.
static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)`{3,}([^\s`]*)(?:\r?\n)?(.*?)`{3,}").expect("valid fence pattern")
});

/// A closed fenced region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Tag directly after the opening marker. May be empty.
    pub language: String,
    /// Everything between the opening line and the closing marker.
    pub code: String,
}

impl CodeBlock {
    /// Create a block.
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
        }
    }
}

/// One closed fence located in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceMatch<'t> {
    /// Language tag.
    pub language: &'t str,
    /// Code content.
    pub code: &'t str,
    /// Byte range of the whole fence, markers included.
    pub span: Range<usize>,
}

impl From<FenceMatch<'_>> for CodeBlock {
    fn from(m: FenceMatch<'_>) -> Self {
        CodeBlock::new(m.language, m.code)
    }
}

/// Finds closed fences in text.
///
/// Implementations must return non-overlapping matches ordered by the
/// position of their opening marker, and must never report an
/// unterminated fence.
pub trait FenceMatcher {
    /// Locate every closed fence in `text`.
    fn find_fences<'t>(&self, text: &'t str) -> Vec<FenceMatch<'t>>;
}

/// Regex-backed [`FenceMatcher`]. Matching is non-greedy.
#[derive(Debug, Clone)]
pub struct RegexFenceMatcher {
    pattern: Regex,
}

impl RegexFenceMatcher {
    /// Matcher using the built-in fence pattern.
    pub fn new() -> Self {
        Self {
            pattern: FENCE_PATTERN.clone(),
        }
    }

    /// Matcher using a caller-supplied pattern.
    ///
    /// Capture group 1 is read as the language tag and group 2 as the
    /// code; a missing group yields an empty string.
    pub fn with_pattern(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl Default for RegexFenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceMatcher for RegexFenceMatcher {
    fn find_fences<'t>(&self, text: &'t str) -> Vec<FenceMatch<'t>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(FenceMatch {
                    language: caps.get(1).map_or("", |m| m.as_str()),
                    code: caps.get(2).map_or("", |m| m.as_str()),
                    span: whole.range(),
                })
            })
            .collect()
    }
}

/// Accumulates fragments for one stream and extracts closed fences.
///
/// Owned by exactly one stream; independent streams use independent
/// extractors.
#[derive(Debug, Clone)]
pub struct FenceExtractor<M = RegexFenceMatcher> {
    matcher: M,
    buffer: String,
}

impl FenceExtractor {
    /// Extractor using [`RegexFenceMatcher`].
    pub fn new() -> Self {
        Self::with_matcher(RegexFenceMatcher::new())
    }
}

impl Default for FenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: FenceMatcher> FenceExtractor<M> {
    /// Extractor using a custom matcher.
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            matcher,
            buffer: String::new(),
        }
    }

    /// Append a fragment and extract any fences it closed.
    pub fn push(&mut self, fragment: &str) -> Vec<CodeBlock> {
        self.buffer.push_str(fragment);
        self.extract()
    }

    /// Rescan the buffer without appending.
    ///
    /// Returns every closed fence in source order and clears the buffer
    /// when the result is non-empty; otherwise the buffer is untouched.
    pub fn extract(&mut self) -> Vec<CodeBlock> {
        let blocks: Vec<CodeBlock> = self
            .matcher
            .find_fences(&self.buffer)
            .into_iter()
            .map(CodeBlock::from)
            .collect();

        if !blocks.is_empty() {
            tracing::trace!(
                blocks = blocks.len(),
                buffered = self.buffer.len(),
                "extracted code blocks"
            );
            self.buffer.clear();
        }
        blocks
    }

    /// Text accumulated since the last extraction.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the buffered text.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
