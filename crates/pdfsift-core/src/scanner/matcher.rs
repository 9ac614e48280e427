//! Pattern matching over raw byte buffers.
//!
//! [`CompiledPattern`] wraps a `regex::bytes::Regex` built from a
//! [`PatternSpec`]. Hex patterns are translated to an equivalent regex first,
//! so both pattern types share one engine. Matching is pull based: the
//! [`Matches`] iterator only searches for the next match when asked.

use crate::error::{Error, Result};
use crate::patterns::{hex_to_regex, PatternSpec, PatternType};
use regex::bytes::{Regex, RegexBuilder};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tracing::trace;

/// Upper bound on the compiled size of a single pattern
const REGEX_SIZE_LIMIT: usize = 16 * 1024 * 1024;

/// A pattern ready to be run against byte buffers
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    name: Arc<str>,
    label: Arc<str>,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles a pattern spec
    ///
    /// Regex patterns are byte oriented: Unicode mode is off and `.` does
    /// not match `\n`, as in YARA.
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        let source = match spec.pattern_type() {
            PatternType::Regex => spec.pattern().to_string(),
            PatternType::Hex => hex_to_regex(spec.pattern())?,
        };

        let regex = RegexBuilder::new(&source)
            .unicode(false)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| Error::pattern_compile(spec.pattern(), e.to_string()))?;

        trace!(
            pattern = spec.pattern(),
            pattern_type = %spec.pattern_type(),
            regex = %source,
            "compiled pattern"
        );

        Ok(Self {
            name: Arc::from(spec.name()),
            label: Arc::from(spec.label()),
            regex,
        })
    }

    /// Name of the spec this was compiled from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label attached to matches
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a lazy iterator over the matches in `haystack`
    ///
    /// Each call starts from the beginning of the buffer.
    pub fn matches<'h>(&self, haystack: &'h [u8]) -> Matches<'h> {
        Matches {
            pattern: self.clone(),
            haystack,
            position: 0,
            surrounding: 0,
        }
    }
}

/// Iterator over the non-overlapping matches of one pattern, in offset order
///
/// Zero-length matches are skipped.
#[derive(Debug, Clone)]
pub struct Matches<'h> {
    pattern: CompiledPattern,
    haystack: &'h [u8],
    position: usize,
    surrounding: usize,
}

impl<'h> Matches<'h> {
    /// Captures up to `num_bytes` of context on each side of every match
    pub fn with_surrounding(mut self, num_bytes: usize) -> Self {
        self.surrounding = num_bytes;
        self
    }
}

impl<'h> Iterator for Matches<'h> {
    type Item = BytesMatch<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position <= self.haystack.len() {
            let found = self.pattern.regex.find_at(self.haystack, self.position)?;

            if found.is_empty() {
                self.position = found.end() + 1;
                continue;
            }

            self.position = found.end();
            return Some(BytesMatch::new(
                &self.pattern,
                self.haystack,
                found.range(),
                self.surrounding,
            ));
        }

        None
    }
}

/// A single match of a pattern inside a byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesMatch<'h> {
    /// Name of the pattern that matched (the stats key)
    pub pattern_name: Arc<str>,
    /// Display label of the pattern
    pub label: Arc<str>,
    /// Offset of the first matched byte
    pub offset: usize,
    /// The matched bytes
    pub bytes: &'h [u8],
    /// The matched bytes plus context on either side
    pub surrounding: &'h [u8],
    /// Offset of the first byte of `surrounding`
    pub surrounding_start: usize,
}

impl<'h> BytesMatch<'h> {
    fn new(pattern: &CompiledPattern, haystack: &'h [u8], range: Range<usize>, context: usize) -> Self {
        let surrounding_start = range.start.saturating_sub(context);
        let surrounding_end = range.end.saturating_add(context).min(haystack.len());

        Self {
            pattern_name: Arc::clone(&pattern.name),
            label: Arc::clone(&pattern.label),
            offset: range.start,
            bytes: &haystack[range],
            surrounding: &haystack[surrounding_start..surrounding_end],
            surrounding_start,
        }
    }

    /// Number of matched bytes
    pub fn length(&self) -> usize {
        self.bytes.len()
    }

    /// Name of the pattern that matched
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    /// Position of the match within [`BytesMatch::surrounding`]
    pub fn range_in_surrounding(&self) -> Range<usize> {
        let start = self.offset - self.surrounding_start;
        start..start + self.bytes.len()
    }
}

impl fmt::Display for BytesMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} match of {} bytes at offset {}",
            self.label,
            self.length(),
            self.offset
        )
    }
}
