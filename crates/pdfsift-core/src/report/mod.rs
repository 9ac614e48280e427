//! Reporting scan results.
//!
//! The scanner never prints anything itself. Everything a human should see
//! is handed to a [`Reporter`], which decides how (and whether) to render
//! it. Reporter failures are logged by the scanner and otherwise ignored, so
//! a broken output sink never aborts a scan.
//!
//! # Example
//!
//! ```
//! use pdfsift_core::report::Reporter;
//! use std::io;
//!
//! #[derive(Default)]
//! struct HeaderCounter(usize);
//!
//! impl Reporter for HeaderCounter {
//!     fn section_header(&mut self, _text: &str) -> io::Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//! ```

mod text;

use crate::decode::DecodeAttempt;
use crate::scanner::{BytesMatch, StreamPreview, SuppressionNotice};
use crate::stats::{MatchStatsTracker, PatternStats};
use std::io;

pub use text::{escape_bytes, hyphen_line, TextReporter, DEFAULT_WIDTH};

/// Sink for structured scan events.
///
/// Every method has a no-op default so implementors only handle what they
/// care about.
pub trait Reporter {
    /// A new scan section starts
    fn section_header(&mut self, text: &str) -> io::Result<()> {
        let _ = text;
        Ok(())
    }

    /// Free-form message, e.g. a skipped extraction
    fn notice(&mut self, text: &str) -> io::Result<()> {
        let _ = text;
        Ok(())
    }

    /// A match that was decoded
    fn report_match(
        &mut self,
        bytes_match: &BytesMatch<'_>,
        attempts: &[DecodeAttempt],
    ) -> io::Result<()> {
        let _ = (bytes_match, attempts);
        Ok(())
    }

    /// Queued notices for suppressed matches, oldest first
    fn suppression_notices(&mut self, notices: &[SuppressionNotice]) -> io::Result<()> {
        let _ = notices;
        Ok(())
    }

    /// Beginning and end of the scanned stream
    fn stream_preview(&mut self, preview: &StreamPreview<'_>) -> io::Result<()> {
        let _ = preview;
        Ok(())
    }

    /// Accumulated per-pattern statistics
    fn pattern_stats(&mut self, stats: &MatchStatsTracker) -> io::Result<()> {
        let _ = stats;
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn section_header(&mut self, text: &str) -> io::Result<()> {
        (**self).section_header(text)
    }

    fn notice(&mut self, text: &str) -> io::Result<()> {
        (**self).notice(text)
    }

    fn report_match(
        &mut self,
        bytes_match: &BytesMatch<'_>,
        attempts: &[DecodeAttempt],
    ) -> io::Result<()> {
        (**self).report_match(bytes_match, attempts)
    }

    fn suppression_notices(&mut self, notices: &[SuppressionNotice]) -> io::Result<()> {
        (**self).suppression_notices(notices)
    }

    fn stream_preview(&mut self, preview: &StreamPreview<'_>) -> io::Result<()> {
        (**self).stream_preview(preview)
    }

    fn pattern_stats(&mut self, stats: &MatchStatsTracker) -> io::Result<()> {
        (**self).pattern_stats(stats)
    }
}

/// A reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// An owned copy of a decoded match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Stats key of the pattern that matched
    pub pattern_name: String,
    /// Display label of the pattern
    pub label: String,
    /// Offset of the match
    pub offset: usize,
    /// The matched bytes
    pub bytes: Vec<u8>,
    /// One attempt per configured encoding
    pub attempts: Vec<DecodeAttempt>,
}

/// An owned copy of anything handed to a [`Reporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// See [`Reporter::section_header`]
    SectionHeader(String),
    /// See [`Reporter::notice`]
    Notice(String),
    /// See [`Reporter::report_match`]
    Match(MatchRecord),
    /// See [`Reporter::suppression_notices`]
    SuppressionNotices(Vec<SuppressionNotice>),
    /// See [`Reporter::stream_preview`]
    StreamPreview {
        /// Preview title
        title: String,
        /// Leading bytes (the whole stream if nothing was skipped)
        head: Vec<u8>,
        /// Trailing bytes, if the stream was long enough to split
        tail: Option<Vec<u8>>,
        /// Bytes left out between head and tail
        skipped: usize,
    },
    /// See [`Reporter::pattern_stats`]
    PatternStats(Vec<(String, PatternStats)>),
}

/// A reporter that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    /// Events in the order they were reported
    pub events: Vec<ReportEvent>,
}

impl CollectingReporter {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded matches, in report order
    pub fn matches(&self) -> impl Iterator<Item = &MatchRecord> {
        self.events.iter().filter_map(|event| match event {
            ReportEvent::Match(record) => Some(record),
            _ => None,
        })
    }

    /// Every suppression notice, flattened, in report order
    pub fn suppressed(&self) -> impl Iterator<Item = &SuppressionNotice> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::SuppressionNotices(notices) => Some(notices),
                _ => None,
            })
            .flatten()
    }

    /// Free-form notices, in report order
    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            ReportEvent::Notice(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Reporter for CollectingReporter {
    fn section_header(&mut self, text: &str) -> io::Result<()> {
        self.events.push(ReportEvent::SectionHeader(text.to_string()));
        Ok(())
    }

    fn notice(&mut self, text: &str) -> io::Result<()> {
        self.events.push(ReportEvent::Notice(text.to_string()));
        Ok(())
    }

    fn report_match(
        &mut self,
        bytes_match: &BytesMatch<'_>,
        attempts: &[DecodeAttempt],
    ) -> io::Result<()> {
        self.events.push(ReportEvent::Match(MatchRecord {
            pattern_name: bytes_match.pattern_name.to_string(),
            label: bytes_match.label.to_string(),
            offset: bytes_match.offset,
            bytes: bytes_match.bytes.to_vec(),
            attempts: attempts.to_vec(),
        }));
        Ok(())
    }

    fn suppression_notices(&mut self, notices: &[SuppressionNotice]) -> io::Result<()> {
        self.events
            .push(ReportEvent::SuppressionNotices(notices.to_vec()));
        Ok(())
    }

    fn stream_preview(&mut self, preview: &StreamPreview<'_>) -> io::Result<()> {
        self.events.push(ReportEvent::StreamPreview {
            title: preview.title.clone(),
            head: preview.head.to_vec(),
            tail: preview.tail.map(<[u8]>::to_vec),
            skipped: preview.skipped,
        });
        Ok(())
    }

    fn pattern_stats(&mut self, stats: &MatchStatsTracker) -> io::Result<()> {
        let snapshot = stats
            .iter()
            .map(|(name, stats)| (name.to_string(), stats.clone()))
            .collect();
        self.events.push(ReportEvent::PatternStats(snapshot));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSpec;
    use crate::scanner::CompiledPattern;

    #[test]
    fn test_null_reporter() {
        let mut reporter = NullReporter;
        assert!(reporter.section_header("anything").is_ok());
        assert!(reporter.pattern_stats(&MatchStatsTracker::new()).is_ok());
    }

    #[test]
    fn test_collecting_reporter_through_mut_ref() {
        fn emit<R: Reporter>(mut reporter: R, m: &BytesMatch<'_>) {
            reporter.report_match(m, &[]).unwrap();
            reporter.notice("done").unwrap();
        }

        let compiled = CompiledPattern::compile(&PatternSpec::literal("/JS")).unwrap();
        let data = b"<< /JS (x) >>";
        let m = compiled.matches(data).next().unwrap();

        let mut collector = CollectingReporter::new();
        emit(&mut collector, &m);

        let record = collector.matches().next().unwrap();
        assert_eq!(record.offset, 3);
        assert_eq!(record.bytes, b"/JS".to_vec());
        assert_eq!(collector.notices().collect::<Vec<_>>(), vec!["done"]);
    }
}
