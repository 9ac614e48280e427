//! Binary scanning of stream bytes.
//!
//! [`BinaryScanner`] owns the scan of one byte buffer. Each pass runs a set
//! of patterns over the buffer and pushes every match through the same
//! pipeline:
//!
//! 1. Count the match in the pattern's stats
//! 2. Ask the [`SuppressionPolicy`] whether it is worth decoding
//! 3. Suppressed matches queue a [`SuppressionNotice`] and count a skip
//! 4. Processed matches first flush the queued notices, then get decoded
//!    under every configured encoding and are handed to the [`Reporter`]
//!
//! ## Example
//!
//! ```
//! use pdfsift_core::report::CollectingReporter;
//! use pdfsift_core::{BinaryScanner, ScannerConfig, StreamOwner};
//!
//! let data = b"app.alert(1); eval(unescape('%u4141'));";
//! let owner = StreamOwner::node("/JS(4)", "/JS");
//! let mut scanner =
//!     BinaryScanner::new(data, owner, ScannerConfig::default(), CollectingReporter::new())?;
//!
//! scanner.scan_dangerous_instructions();
//! assert_eq!(scanner.stats().get("eval").unwrap().match_count, 1);
//! # Ok::<(), pdfsift_core::Error>(())
//! ```

mod matcher;
mod owner;
mod preview;
mod suppression;

use crate::decode::{Encoding, ForcedDecoder, DEFAULT_MAX_REPLACEMENT_RATIO};
use crate::error::{Error, Result};
use crate::patterns::catalog::{self, CURRENTFILE_EEXEC};
use crate::patterns::{PatternSpec, QuoteKind};
use crate::report::Reporter;
use crate::stats::MatchStatsTracker;
use std::collections::VecDeque;
use std::io;
use tracing::{debug, trace, warn};

pub use matcher::{BytesMatch, CompiledPattern, Matches};
pub use owner::StreamOwner;
pub use preview::StreamPreview;
pub use suppression::{should_process, Decision, SuppressReason, SuppressionNotice, SuppressionPolicy};

/// Default minimum decode length (exclusive)
pub const DEFAULT_MIN_DECODE_LENGTH: u64 = 1;

/// Default maximum decode length (exclusive)
pub const DEFAULT_MAX_DECODE_LENGTH: u64 = 256;

/// Default number of context bytes captured on each side of a match
pub const DEFAULT_SURROUNDING_BYTES: usize = 64;

/// Default number of bytes shown from each end of a stream preview
pub const DEFAULT_PREVIEW_BYTES: usize = 160;

/// Section header of the dangerous instruction pass
pub const DANGEROUS_INSTRUCTIONS_HEADER: &str = "Scanning Binary For Anything 'Mad Sus'...";

/// Section header of the byte order mark pass
pub const BOM_HEADER: &str = "Scanning Binary for any BOMs...";

/// Configuration for the scanner
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Matches this long or shorter are not decoded (unless forced)
    pub min_decode_length: u64,
    /// Matches this long or longer are not decoded (unless forced)
    pub max_decode_length: u64,
    /// Context bytes captured on each side of a match
    pub surrounding_bytes: usize,
    /// Bytes shown from each end of a stream preview
    pub preview_bytes: usize,
    /// Encodings forced upon every decoded match, in order
    pub encodings: Vec<Encoding>,
    /// Quote kinds whose contents are extracted, in order
    pub quote_kinds: Vec<QuoteKind>,
    /// Largest share of replacement characters a force decode may contain
    pub max_replacement_ratio: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_decode_length: DEFAULT_MIN_DECODE_LENGTH,
            max_decode_length: DEFAULT_MAX_DECODE_LENGTH,
            surrounding_bytes: DEFAULT_SURROUNDING_BYTES,
            preview_bytes: DEFAULT_PREVIEW_BYTES,
            encodings: Encoding::ALL.to_vec(),
            quote_kinds: Vec::new(),
            max_replacement_ratio: DEFAULT_MAX_REPLACEMENT_RATIO,
        }
    }
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum decode length
    pub fn min_decode_length(mut self, length: u64) -> Self {
        self.min_decode_length = length;
        self
    }

    /// Sets the maximum decode length
    pub fn max_decode_length(mut self, length: u64) -> Self {
        self.max_decode_length = length;
        self
    }

    /// Sets the number of context bytes around each match
    pub fn surrounding_bytes(mut self, num_bytes: usize) -> Self {
        self.surrounding_bytes = num_bytes;
        self
    }

    /// Sets the default stream preview size
    pub fn preview_bytes(mut self, num_bytes: usize) -> Self {
        self.preview_bytes = num_bytes;
        self
    }

    /// Sets the encodings to force upon matches
    pub fn encodings(mut self, encodings: Vec<Encoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Sets the quote kinds to extract
    pub fn quote_kinds(mut self, kinds: Vec<QuoteKind>) -> Self {
        self.quote_kinds = kinds;
        self
    }

    /// Sets the quote kinds to extract from their names
    pub fn quote_kind_names<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.quote_kinds = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Sets the largest share of replacement characters a force decode may contain
    pub fn max_replacement_ratio(mut self, ratio: f64) -> Self {
        self.max_replacement_ratio = ratio;
        self
    }

    /// Checks that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.min_decode_length >= self.max_decode_length {
            return Err(Error::InvalidDecodeBounds {
                min: self.min_decode_length,
                max: self.max_decode_length,
            });
        }
        if !(0.0..=1.0).contains(&self.max_replacement_ratio) {
            return Err(Error::InvalidReplacementRatio(self.max_replacement_ratio));
        }
        Ok(())
    }
}

/// A pattern that could not be compiled during a pass
#[derive(Debug)]
pub struct PatternFailure {
    /// Name of the pattern
    pub pattern_name: String,
    /// Why it failed
    pub error: Error,
}

/// Summary of one or more scan passes
#[derive(Debug, Default)]
pub struct PassReport {
    /// Patterns that were run
    pub patterns_scanned: usize,
    /// Matches found
    pub matches: u64,
    /// Matches that were decoded and reported
    pub decoded: u64,
    /// Matches that were suppressed
    pub suppressed: u64,
    /// Passes skipped entirely (e.g. quote kinds not worth decoding)
    pub skipped_passes: usize,
    /// Patterns that failed to compile
    pub failures: Vec<PatternFailure>,
}

impl PassReport {
    /// Folds another report into this one
    pub fn merge(&mut self, other: PassReport) {
        self.patterns_scanned += other.patterns_scanned;
        self.matches += other.matches;
        self.decoded += other.decoded;
        self.suppressed += other.suppressed;
        self.skipped_passes += other.skipped_passes;
        self.failures.extend(other.failures);
    }

    /// True if every pattern compiled
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Scans one byte buffer for suspicious patterns
pub struct BinaryScanner<'a, R: Reporter> {
    bytes: &'a [u8],
    owner: StreamOwner,
    config: ScannerConfig,
    policy: SuppressionPolicy,
    decoder: ForcedDecoder,
    stats: MatchStatsTracker,
    suppression_queue: VecDeque<SuppressionNotice>,
    reporter: R,
}

impl<'a, R: Reporter> BinaryScanner<'a, R> {
    /// Creates a scanner over `bytes`, validating `config` first
    pub fn new(bytes: &'a [u8], owner: StreamOwner, config: ScannerConfig, reporter: R) -> Result<Self> {
        config.validate()?;

        let policy = SuppressionPolicy::new(config.min_decode_length, config.max_decode_length);
        let decoder = ForcedDecoder::new(config.encodings.clone())
            .max_replacement_ratio(config.max_replacement_ratio);

        Ok(Self {
            bytes,
            owner,
            config,
            policy,
            decoder,
            stats: MatchStatsTracker::new(),
            suppression_queue: VecDeque::new(),
            reporter,
        })
    }

    /// Length of the scanned stream
    pub fn stream_length(&self) -> usize {
        self.bytes.len()
    }

    /// Who the bytes belong to
    pub fn owner(&self) -> &StreamOwner {
        &self.owner
    }

    /// Statistics accumulated so far
    pub fn stats(&self) -> &MatchStatsTracker {
        &self.stats
    }

    /// The reporter events are sent to
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Consumes the scanner, returning its stats and reporter
    pub fn into_parts(self) -> (MatchStatsTracker, R) {
        (self.stats, self.reporter)
    }

    /// Scans for every dangerous instruction; all matches are decoded
    pub fn scan_dangerous_instructions(&mut self) -> PassReport {
        self.scan_patterns(
            DANGEROUS_INSTRUCTIONS_HEADER,
            &catalog::dangerous_instructions(),
            true,
        )
    }

    /// Scans for every known byte order mark; all matches are decoded
    pub fn scan_byte_order_marks(&mut self) -> PassReport {
        self.scan_patterns(BOM_HEADER, &catalog::byte_order_marks(), true)
    }

    /// Extracts and decodes bytes between one kind of quote delimiter.
    ///
    /// Length bounds apply. Front-slash and guillemet extraction is skipped
    /// for page content streams, where it only produces noise.
    pub fn extract_quoted_bytes(&mut self, kind: QuoteKind) -> PassReport {
        if self.owner.is_contents() && matches!(kind, QuoteKind::FrontSlash | QuoteKind::Guillemet) {
            let msg = format!(
                "Not attempting {} decode for {} node type...",
                kind,
                catalog::CONTENTS
            );
            debug!(owner = %self.owner, "{}", msg);
            let result = self.reporter.notice(&msg);
            self.log_report_failure("notice", result);
            return PassReport {
                skipped_passes: 1,
                ..PassReport::default()
            };
        }

        let header = format!("Forcing Decode of {} Quoted Strings", kind.title());
        self.scan_patterns(&header, &[kind.pattern_spec()], false)
    }

    /// Runs [`BinaryScanner::extract_quoted_bytes`] for every configured quote kind
    pub fn force_decode_quoted_bytes(&mut self) -> PassReport {
        let mut report = PassReport::default();

        if self.config.quote_kinds.is_empty() {
            let result = self
                .reporter
                .notice("No quote kinds configured. Skipping extract/decode of quoted bytes.");
            self.log_report_failure("notice", result);
            return report;
        }

        for kind in self.config.quote_kinds.clone() {
            report.merge(self.extract_quoted_bytes(kind));
        }
        report
    }

    /// Reports the first and last `num_bytes` of the stream.
    ///
    /// `None` uses the configured preview size. Does not touch the stats.
    pub fn preview_stream(&mut self, num_bytes: Option<usize>) -> StreamPreview<'a> {
        self.preview_stream_with_suffix(num_bytes, None)
    }

    /// Like [`BinaryScanner::preview_stream`] with extra text appended to the title
    pub fn preview_stream_with_suffix(
        &mut self,
        num_bytes: Option<usize>,
        title_suffix: Option<&str>,
    ) -> StreamPreview<'a> {
        let num_bytes = num_bytes.unwrap_or(self.config.preview_bytes);
        let preview = StreamPreview::new(self.bytes, num_bytes, title_suffix);
        let result = self.reporter.stream_preview(&preview);
        self.log_report_failure("stream preview", result);
        preview
    }

    /// Matches of one quote kind, without recording stats or reporting.
    ///
    /// The iterator is lazy and carries the configured surrounding bytes.
    pub fn quoted_matches(&self, kind: QuoteKind) -> Result<Matches<'a>> {
        let compiled = CompiledPattern::compile(&kind.pattern_spec())?;
        Ok(compiled
            .matches(self.bytes)
            .with_surrounding(self.config.surrounding_bytes))
    }

    /// Bytes after the first `currentfile eexec` marker, or all bytes if absent
    pub fn bytes_after_eexec_marker(&self) -> &'a [u8] {
        bytes_after_eexec_marker(self.bytes)
    }

    /// Position of the first `currentfile eexec` marker
    pub fn eexec_offset(&self) -> Option<usize> {
        eexec_offset(self.bytes)
    }

    /// Runs every pass in the usual order: preview, dangerous instructions,
    /// byte order marks, quoted bytes
    pub fn scan_all(&mut self) -> PassReport {
        self.preview_stream(None);

        let mut report = self.scan_dangerous_instructions();
        report.merge(self.scan_byte_order_marks());
        report.merge(self.force_decode_quoted_bytes());
        report
    }

    /// Reports the stats accumulated so far
    pub fn report_stats(&mut self) {
        let result = self.reporter.pattern_stats(&self.stats);
        self.log_report_failure("pattern stats", result);
    }

    /// Runs `specs` over the buffer under `header`.
    ///
    /// `force` bypasses the decode length bounds. A pattern that fails to
    /// compile is recorded in the returned report and skipped.
    pub fn scan_patterns(&mut self, header: &str, specs: &[PatternSpec], force: bool) -> PassReport {
        debug!(header, patterns = specs.len(), force, "starting scan pass");
        let result = self.reporter.section_header(header);
        self.log_report_failure("section header", result);

        let mut report = PassReport::default();
        for spec in specs {
            match self.process_pattern(spec, force, &mut report) {
                Ok(()) => report.patterns_scanned += 1,
                Err(error) => {
                    warn!(pattern = spec.name(), %error, "skipping pattern");
                    report.failures.push(PatternFailure {
                        pattern_name: spec.name().to_string(),
                        error,
                    });
                }
            }
        }

        debug!(
            header,
            matches = report.matches,
            decoded = report.decoded,
            suppressed = report.suppressed,
            "scan pass complete"
        );
        report
    }

    fn process_pattern(&mut self, spec: &PatternSpec, force: bool, report: &mut PassReport) -> Result<()> {
        let compiled = CompiledPattern::compile(spec)?;
        // Every referenced pattern gets a stats entry, even without matches
        self.stats.entry(spec.name());

        let matches = compiled
            .matches(self.bytes)
            .with_surrounding(self.config.surrounding_bytes);
        for bytes_match in matches {
            self.process_match(&bytes_match, force, report);
        }

        self.flush_suppression_notices();
        Ok(())
    }

    fn process_match(&mut self, bytes_match: &BytesMatch<'a>, force: bool, report: &mut PassReport) {
        let pattern = bytes_match.pattern_name();
        trace!(pattern, offset = bytes_match.offset, length = bytes_match.length(), "tracking stats for match");
        self.stats.record_match(pattern, bytes_match);
        report.matches += 1;

        match self.policy.decide(bytes_match.length() as u64, force) {
            Decision::Suppress(reason) => {
                self.queue_suppression_notice(bytes_match, reason);
                self.stats.record_skip(pattern, bytes_match.length());
                report.suppressed += 1;
            }
            Decision::Process => {
                self.flush_suppression_notices();

                let attempts = self.decoder.decode_attempts(bytes_match.bytes);
                self.stats.record_decode(pattern, &attempts);
                report.decoded += 1;

                let result = self.reporter.report_match(bytes_match, &attempts);
                self.log_report_failure("match", result);
            }
        }
    }

    fn queue_suppression_notice(&mut self, bytes_match: &BytesMatch<'_>, reason: SuppressReason) {
        let notice = SuppressionNotice::new(bytes_match, reason, self.policy.limit_for(reason));
        trace!(%notice, "queueing suppression notice");
        self.suppression_queue.push_back(notice);
    }

    fn flush_suppression_notices(&mut self) {
        if self.suppression_queue.is_empty() {
            return;
        }

        let notices: Vec<SuppressionNotice> = self.suppression_queue.drain(..).collect();
        let result = self.reporter.suppression_notices(&notices);
        self.log_report_failure("suppression notices", result);
    }

    fn log_report_failure(&self, what: &str, result: io::Result<()>) {
        if let Err(e) = result {
            warn!(owner = %self.owner, "failed to report {}: {}", what, e);
        }
    }
}

/// Find a subsequence within a byte slice
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Position of the first `currentfile eexec` marker in `bytes`
pub fn eexec_offset(bytes: &[u8]) -> Option<usize> {
    find_subsequence(bytes, CURRENTFILE_EEXEC)
}

/// Bytes after the first `currentfile eexec` marker, or all of `bytes` if absent
pub fn bytes_after_eexec_marker(bytes: &[u8]) -> &[u8] {
    match eexec_offset(bytes) {
        Some(offset) => &bytes[offset + CURRENTFILE_EEXEC.len()..],
        None => bytes,
    }
}

/// Reads a file and scans it with every pass, reporting to `reporter`
pub fn scan_file<R: Reporter>(
    path: impl AsRef<std::path::Path>,
    owner: StreamOwner,
    config: ScannerConfig,
    reporter: R,
) -> Result<(MatchStatsTracker, PassReport)> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    let mut scanner = BinaryScanner::new(&data, owner, config, reporter)?;
    let report = scanner.scan_all();
    let (stats, _) = scanner.into_parts();
    Ok((stats, report))
}
