//! Error types for the pdfsift-core library.
//!
//! Configuration problems are reported before any scanning starts. Pattern
//! compile failures are fatal only to the pattern that caused them; decode
//! failures are not errors at all (see [`crate::decode::DecodeOutcome`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfsift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all pdfsift operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A pattern could not be turned into a matcher
    #[error("failed to compile pattern '{pattern}': {details}")]
    PatternCompile {
        /// The pattern source as written in the catalog
        pattern: String,
        /// What was wrong with it
        details: String,
    },

    /// Decode length bounds leave no room for any match
    #[error("invalid decode length bounds: min ({min}) must be less than max ({max})")]
    InvalidDecodeBounds {
        /// Configured minimum decode length
        min: u64,
        /// Configured maximum decode length
        max: u64,
    },

    /// Replacement ratio outside of [0, 1]
    #[error("invalid replacement ratio {0}: must be between 0.0 and 1.0")]
    InvalidReplacementRatio(f64),

    /// Quote kind name not in the catalog
    #[error("unknown quote kind '{0}'")]
    UnknownQuoteKind(String),

    /// Encoding name not supported by the forced decoder
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new pattern compile error
    pub fn pattern_compile(pattern: impl Into<String>, details: impl Into<String>) -> Self {
        Self::PatternCompile {
            pattern: pattern.into(),
            details: details.into(),
        }
    }

    /// Returns true if a scan pass should skip the failing pattern and move on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PatternCompile { .. })
    }

    /// Returns true if this error was caused by bad scanner configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidDecodeBounds { .. }
                | Self::InvalidReplacementRatio(_)
                | Self::UnknownQuoteKind(_)
                | Self::UnknownEncoding(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::pattern_compile("AB C", "odd number of hex digits");
        assert!(err.to_string().contains("AB C"));
        assert!(err.to_string().contains("odd number"));

        let err = Error::InvalidDecodeBounds { min: 10, max: 5 };
        assert!(err.to_string().contains("min (10)"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::pattern_compile("(", "unclosed group").is_recoverable());
        assert!(!Error::UnknownQuoteKind("tilde".into()).is_recoverable());
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::UnknownEncoding("ebcdic".into()).is_configuration());
        assert!(Error::InvalidReplacementRatio(2.0).is_configuration());
        assert!(!Error::pattern_compile("(", "x").is_configuration());
    }
}
