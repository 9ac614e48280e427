//! Deciding which matches are worth decoding.

use super::matcher::BytesMatch;
use std::fmt;

/// Why a match was not decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// Match length is at or below the minimum decode length
    TooShort,
    /// Match length is at or above the maximum decode length
    TooLong,
}

/// What to do with a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Decode it now
    Process,
    /// Skip it and queue a notice
    Suppress(SuppressReason),
}

/// Decides whether a match of `length` bytes should be decoded.
///
/// Bounds are exclusive on both ends. `force` bypasses them entirely.
pub fn should_process(length: u64, min_length: u64, max_length: u64, force: bool) -> Decision {
    if force {
        Decision::Process
    } else if length <= min_length {
        Decision::Suppress(SuppressReason::TooShort)
    } else if length >= max_length {
        Decision::Suppress(SuppressReason::TooLong)
    } else {
        Decision::Process
    }
}

/// Decode length bounds applied to every unforced match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionPolicy {
    min_length: u64,
    max_length: u64,
}

impl SuppressionPolicy {
    /// Creates a policy; callers are expected to have checked `min < max`
    pub fn new(min_length: u64, max_length: u64) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    /// Minimum decode length (exclusive)
    pub fn min_length(&self) -> u64 {
        self.min_length
    }

    /// Maximum decode length (exclusive)
    pub fn max_length(&self) -> u64 {
        self.max_length
    }

    /// Applies [`should_process`] with this policy's bounds
    pub fn decide(&self, length: u64, force: bool) -> Decision {
        should_process(length, self.min_length, self.max_length, force)
    }

    /// The bound a suppressed match ran into
    pub fn limit_for(&self, reason: SuppressReason) -> u64 {
        match reason {
            SuppressReason::TooShort => self.min_length,
            SuppressReason::TooLong => self.max_length,
        }
    }
}

/// A deferred message about a match that was not decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionNotice {
    /// Stats key of the pattern that matched
    pub pattern_name: String,
    /// Display label of the pattern
    pub label: String,
    /// Offset of the match
    pub offset: usize,
    /// Length of the match
    pub length: usize,
    /// Why it was not decoded
    pub reason: SuppressReason,
    /// The decode length bound it ran into
    pub limit: u64,
}

impl SuppressionNotice {
    /// Builds the notice for a suppressed match
    pub fn new(bytes_match: &BytesMatch<'_>, reason: SuppressReason, limit: u64) -> Self {
        Self {
            pattern_name: bytes_match.pattern_name.to_string(),
            label: bytes_match.label.to_string(),
            offset: bytes_match.offset,
            length: bytes_match.length(),
            reason,
            limit,
        }
    }
}

impl fmt::Display for SuppressionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let described = format!(
            "{} match of {} bytes at offset {}",
            self.label, self.length, self.offset
        );

        match self.reason {
            SuppressReason::TooShort => {
                write!(f, "Too little to actually attempt decode at {}", described)
            }
            SuppressReason::TooLong => write!(
                f,
                "{} too long to decode (max decode length is {} bytes)",
                described, self.limit
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bounds_are_exclusive() {
        assert_eq!(should_process(10, 10, 20, false), Decision::Suppress(SuppressReason::TooShort));
        assert_eq!(should_process(11, 10, 20, false), Decision::Process);
        assert_eq!(should_process(19, 10, 20, false), Decision::Process);
        assert_eq!(should_process(20, 10, 20, false), Decision::Suppress(SuppressReason::TooLong));
        assert_eq!(should_process(0, 10, 20, false), Decision::Suppress(SuppressReason::TooShort));
        assert_eq!(should_process(100_000, 10, 20, false), Decision::Suppress(SuppressReason::TooLong));
    }

    #[test]
    fn test_force_always_processes() {
        for length in [0, 1, 10, 20, 100_000] {
            assert_eq!(should_process(length, 10, 20, true), Decision::Process);
        }
    }

    #[test]
    fn test_policy_limits() {
        let policy = SuppressionPolicy::new(1, 256);
        assert_eq!(policy.decide(1, false), Decision::Suppress(SuppressReason::TooShort));
        assert_eq!(policy.limit_for(SuppressReason::TooLong), 256);
    }

    #[test]
    fn test_notice_text() {
        let notice = SuppressionNotice {
            pattern_name: "backtick_quoted".into(),
            label: "backtick_quoted".into(),
            offset: 40,
            length: 300,
            reason: SuppressReason::TooLong,
            limit: 256,
        };
        assert_eq!(
            notice.to_string(),
            "backtick_quoted match of 300 bytes at offset 40 too long to decode (max decode length is 256 bytes)"
        );

        let notice = SuppressionNotice {
            reason: SuppressReason::TooShort,
            limit: 1,
            length: 1,
            ..notice
        };
        assert!(notice.to_string().starts_with("Too little to actually attempt decode at"));
    }
}
