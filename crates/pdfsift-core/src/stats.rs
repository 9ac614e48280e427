//! Per-pattern match statistics.
//!
//! Entries are created on demand by [`MatchStatsTracker::entry`], the only
//! place the tracker grows. Every counter only ever goes up.

use crate::decode::{DecodeAttempt, DecodeOutcome, Encoding};
use crate::scanner::BytesMatch;
use std::collections::BTreeMap;

/// Counters for one pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternStats {
    /// Number of matches found
    pub match_count: u64,
    /// Total bytes across all matches
    pub bytes_matched: u64,
    /// Number of matches that were decode-attempted
    pub matches_decoded: u64,
    /// Clean decodes per encoding
    pub decodable_by_encoding: BTreeMap<Encoding, u64>,
    /// Failed decodes per encoding
    pub undecodable_by_encoding: BTreeMap<Encoding, u64>,
    /// Decodes that needed replacement characters, per encoding
    pub force_decoded_by_encoding: BTreeMap<Encoding, u64>,
    /// Suppressed match lengths and how often each was seen
    pub skipped_lengths: BTreeMap<usize, u64>,
}

impl PatternStats {
    /// Number of matches that were suppressed
    pub fn skipped_count(&self) -> u64 {
        self.skipped_lengths.values().sum()
    }

    /// Adds every counter from `other` into this entry
    pub fn merge(&mut self, other: &PatternStats) {
        self.match_count += other.match_count;
        self.bytes_matched += other.bytes_matched;
        self.matches_decoded += other.matches_decoded;
        merge_counts(&mut self.decodable_by_encoding, &other.decodable_by_encoding);
        merge_counts(&mut self.undecodable_by_encoding, &other.undecodable_by_encoding);
        merge_counts(&mut self.force_decoded_by_encoding, &other.force_decoded_by_encoding);
        merge_counts(&mut self.skipped_lengths, &other.skipped_lengths);
    }
}

fn merge_counts<K: Ord + Copy>(into: &mut BTreeMap<K, u64>, from: &BTreeMap<K, u64>) {
    for (key, count) in from {
        *into.entry(*key).or_insert(0) += count;
    }
}

/// Match statistics keyed by pattern name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStatsTracker {
    patterns: BTreeMap<String, PatternStats>,
}

impl MatchStatsTracker {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `pattern_name`, inserting zeroed stats if absent
    pub fn entry(&mut self, pattern_name: &str) -> &mut PatternStats {
        self.patterns.entry(pattern_name.to_string()).or_default()
    }

    /// Returns the entry for `pattern_name` without creating one
    pub fn get(&self, pattern_name: &str) -> Option<&PatternStats> {
        self.patterns.get(pattern_name)
    }

    /// Counts one match and its length
    pub fn record_match(&mut self, pattern_name: &str, bytes_match: &BytesMatch<'_>) {
        let stats = self.entry(pattern_name);
        stats.match_count += 1;
        stats.bytes_matched += bytes_match.length() as u64;
    }

    /// Counts one decoded match and the outcome of each of its attempts
    pub fn record_decode(&mut self, pattern_name: &str, attempts: &[DecodeAttempt]) {
        let stats = self.entry(pattern_name);
        stats.matches_decoded += 1;

        for attempt in attempts {
            let counts = match attempt.outcome {
                DecodeOutcome::Decoded(_) => &mut stats.decodable_by_encoding,
                DecodeOutcome::Undecodable => &mut stats.undecodable_by_encoding,
                DecodeOutcome::ForceDecoded { .. } => &mut stats.force_decoded_by_encoding,
            };
            *counts.entry(attempt.encoding).or_insert(0) += 1;
        }
    }

    /// Counts one suppressed match of `match_length` bytes
    pub fn record_skip(&mut self, pattern_name: &str, match_length: usize) {
        *self
            .entry(pattern_name)
            .skipped_lengths
            .entry(match_length)
            .or_insert(0) += 1;
    }

    /// Adds every entry from `other`, creating entries as needed
    pub fn merge(&mut self, other: &MatchStatsTracker) {
        for (name, stats) in &other.patterns {
            self.entry(name).merge(stats);
        }
    }

    /// Iterates over entries in pattern name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternStats)> {
        self.patterns.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    /// Number of patterns with an entry
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no pattern has been referenced yet
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Matches across all patterns
    pub fn total_matches(&self) -> u64 {
        self.patterns.values().map(|s| s.match_count).sum()
    }
}
