//! Plain-text rendering of scan events.

use super::Reporter;
use crate::decode::{DecodeAttempt, DecodeOutcome};
use crate::scanner::{BytesMatch, StreamPreview, SuppressionNotice};
use crate::stats::MatchStatsTracker;
use std::io::{self, Write};

/// Default line width
pub const DEFAULT_WIDTH: usize = 160;

/// Renders bytes the way a byte string literal would: printable ASCII as
/// is, everything else as an escape (`\n`, `\x80`, ...).
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}

/// A line of hyphens `width` long, optionally with `title` centered in it
pub fn hyphen_line(width: usize, title: Option<&str>) -> String {
    let Some(title) = title else {
        return "-".repeat(width);
    };

    let title_len = title.chars().count();
    let side = "-".repeat(width.saturating_sub(title_len) / 2);
    let mut line = format!("{}{}{}", side, title, side);
    if line.chars().count() < width {
        line.push('-');
    }
    line
}

/// Writes human-readable reports to any [`Write`] sink
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    out: W,
    width: usize,
}

impl<W: Write> TextReporter<W> {
    /// Creates a reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: DEFAULT_WIDTH,
        }
    }

    /// Sets the line width used for rules and headers
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_bytes_block(&mut self, bytes: &[u8]) -> io::Result<()> {
        for line in bytes.split(|&b| b == b'\n') {
            writeln!(self.out, "{}", escape_bytes(line))?;
        }
        Ok(())
    }

    fn write_attempt(&mut self, attempt: &DecodeAttempt) -> io::Result<()> {
        let (status, text) = match &attempt.outcome {
            DecodeOutcome::Decoded(text) => ("decoded".to_string(), Some(text)),
            DecodeOutcome::ForceDecoded { text, replacements } => {
                (format!("forced ({} replaced)", replacements), Some(text))
            }
            DecodeOutcome::Undecodable => ("UNDECODABLE".to_string(), None),
        };

        match text {
            Some(text) => writeln!(
                self.out,
                "    {:<14}{:<22}{}",
                attempt.encoding.name(),
                status,
                text.escape_debug()
            ),
            None => writeln!(self.out, "    {:<14}{}", attempt.encoding.name(), status),
        }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn section_header(&mut self, text: &str) -> io::Result<()> {
        let rule = "=".repeat(self.width.min(text.chars().count() + 4));
        writeln!(self.out)?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "  {}", text)?;
        writeln!(self.out, "{}", rule)
    }

    fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\n  {}\n", text)
    }

    fn report_match(
        &mut self,
        bytes_match: &BytesMatch<'_>,
        attempts: &[DecodeAttempt],
    ) -> io::Result<()> {
        let in_context = bytes_match.range_in_surrounding();
        let before = &bytes_match.surrounding[..in_context.start];
        let after = &bytes_match.surrounding[in_context.end..];

        writeln!(self.out)?;
        writeln!(self.out, "{}", bytes_match)?;
        writeln!(
            self.out,
            "  context: {}[{}]{}",
            escape_bytes(before),
            escape_bytes(bytes_match.bytes),
            escape_bytes(after)
        )?;

        for attempt in attempts {
            self.write_attempt(attempt)?;
        }
        Ok(())
    }

    fn suppression_notices(&mut self, notices: &[SuppressionNotice]) -> io::Result<()> {
        if notices.is_empty() {
            return Ok(());
        }

        let rule = hyphen_line(self.width.min(80), None);
        writeln!(self.out, "{}", rule)?;
        for notice in notices {
            writeln!(self.out, "| {}", notice)?;
        }
        writeln!(self.out, "{}", rule)
    }

    fn stream_preview(&mut self, preview: &StreamPreview<'_>) -> io::Result<()> {
        let rule = hyphen_line(self.width, Some(&preview.title));
        writeln!(self.out)?;
        writeln!(self.out, "{}", rule)?;
        self.write_bytes_block(preview.head)?;

        if let Some(tail) = preview.tail {
            writeln!(self.out, "\n    <...skip {} bytes...>\n", preview.skipped)?;
            self.write_bytes_block(tail)?;
        }

        writeln!(self.out, "{}", rule)?;
        writeln!(self.out)
    }

    fn pattern_stats(&mut self, stats: &MatchStatsTracker) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{:<32}{:>10}{:>12}{:>10}{:>10}",
            "PATTERN", "MATCHES", "BYTES", "DECODED", "SKIPPED"
        )?;
        writeln!(self.out, "{}", hyphen_line(74, None))?;

        for (name, pattern) in stats.iter() {
            writeln!(
                self.out,
                "{:<32}{:>10}{:>12}{:>10}{:>10}",
                name,
                pattern.match_count,
                pattern.bytes_matched,
                pattern.matches_decoded,
                pattern.skipped_count()
            )?;

            let per_encoding = [
                ("decodable", &pattern.decodable_by_encoding),
                ("force decoded", &pattern.force_decoded_by_encoding),
                ("undecodable", &pattern.undecodable_by_encoding),
            ];
            for (what, counts) in per_encoding {
                if counts.is_empty() {
                    continue;
                }
                let joined: Vec<String> = counts
                    .iter()
                    .map(|(encoding, count)| format!("{}={}", encoding, count))
                    .collect();
                writeln!(self.out, "    {}: {}", what, joined.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ForcedDecoder;
    use crate::patterns::PatternSpec;
    use crate::scanner::CompiledPattern;
    use pretty_assertions::assert_eq;

    fn rendered<F: FnOnce(&mut TextReporter<Vec<u8>>) -> io::Result<()>>(f: F) -> String {
        let mut reporter = TextReporter::new(Vec::new()).width(40);
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"ab\x80\n'"), r"ab\x80\n\'");
    }

    #[test]
    fn test_hyphen_line() {
        assert_eq!(hyphen_line(10, None), "----------");
        assert_eq!(hyphen_line(10, Some("ABCD")), "---ABCD---");
        assert_eq!(hyphen_line(10, Some("ABC")), "---ABC----");
        assert_eq!(hyphen_line(2, Some("LONGER")), "LONGER");
    }

    #[test]
    fn test_match_rendering() {
        let compiled = CompiledPattern::compile(&PatternSpec::literal("eval")).unwrap();
        let data = b"x=eval(y)";
        let m = compiled.matches(data).with_surrounding(2).next().unwrap();
        let attempts = ForcedDecoder::default().decode_attempts(m.bytes);

        let out = rendered(|r| r.report_match(&m, &attempts));
        assert!(out.contains("eval match of 4 bytes at offset 2"));
        assert!(out.contains("context: x=[eval](y"));
        assert!(out.contains("utf-8"));
    }

    #[test]
    fn test_preview_rendering_with_skip() {
        let data: Vec<u8> = (b'a'..=b't').collect();
        let preview = StreamPreview::new(&data, 5, None);
        let out = rendered(|r| r.stream_preview(&preview));
        assert!(out.contains("abcde"));
        assert!(out.contains("<...skip 10 bytes...>"));
        assert!(out.contains("pqrst"));
    }
}
