//! # pdfsift-core
//!
//! A library for sifting suspicious content out of binary PDF streams.
//!
//! This crate provides the core functionality for:
//! - Scanning stream bytes for dangerous instructions and byte order marks
//! - Extracting bytes between quote delimiters
//! - Force-decoding matches under a set of text encodings
//! - Accumulating per-pattern match and decode statistics
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`patterns`]: Pattern definitions, hex pattern syntax and the built-in catalog
//! - [`scanner`]: Matching, suppression and the per-stream scan driver
//! - [`decode`]: Forced decoding of matched bytes
//! - [`stats`]: Per-pattern statistics
//! - [`report`]: Reporter trait and its text and in-memory implementations
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use pdfsift_core::{BinaryScanner, ScannerConfig, StreamOwner, TextReporter};
//! use std::fs;
//! use std::io;
//!
//! // Read a dumped stream
//! let data = fs::read("./stream.bin")?;
//!
//! // Scan it, printing everything to stdout
//! let owner = StreamOwner::node("/JS(12)", "/JS");
//! let reporter = TextReporter::new(io::stdout().lock());
//! let mut scanner = BinaryScanner::new(&data, owner, ScannerConfig::default(), reporter)?;
//! scanner.scan_all();
//! scanner.report_stats();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`Reporter`]: Receive scan events and render them however you like
//! - [`PatternSpec`]: Scan for your own regex or hex patterns with
//!   [`BinaryScanner::scan_patterns`]
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod decode;
pub mod error;
pub mod patterns;
pub mod report;
pub mod scanner;
pub mod stats;

// Re-export primary types for convenience
pub use decode::{DecodeAttempt, DecodeOutcome, Encoding, ForcedDecoder};
pub use error::{Error, Result};
pub use patterns::{PatternSpec, PatternType, QuoteKind};
pub use report::{CollectingReporter, NullReporter, Reporter, TextReporter};
pub use scanner::{scan_file, BinaryScanner, BytesMatch, PassReport, ScannerConfig, StreamOwner};
pub use stats::{MatchStatsTracker, PatternStats};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
