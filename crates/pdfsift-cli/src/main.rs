//! pdfsift - Sift suspicious content out of extracted PDF streams
//!
//! This tool scans raw stream bytes for dangerous instructions, byte order
//! marks and quoted payloads, force-decoding whatever it finds.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use pdfsift_core::decode::force_utf8;
use pdfsift_core::report::DEFAULT_WIDTH;
use pdfsift_core::scanner::{
    bytes_after_eexec_marker, eexec_offset, DEFAULT_MAX_DECODE_LENGTH, DEFAULT_MIN_DECODE_LENGTH,
    DEFAULT_PREVIEW_BYTES, DEFAULT_SURROUNDING_BYTES,
};
use pdfsift_core::{
    BinaryScanner, Encoding, MatchStatsTracker, QuoteKind, Reporter, ScannerConfig,
    StreamOwner, TextReporter,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Scan extracted PDF streams for dangerous instructions, BOMs and quoted payloads
#[derive(Parser, Debug)]
#[command(name = "pdfsift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Node type of the scanned streams (e.g. /Contents, /JS, /XObject)
    #[arg(long, default_value = "/Stream")]
    node_type: String,

    /// Treat the streams as embedded font programs
    #[arg(long)]
    font: bool,

    /// Only scan the bytes after the `currentfile eexec` marker
    #[arg(long)]
    eexec: bool,

    /// Extract and decode bytes between this kind of quote (repeatable)
    #[arg(long = "extract-quoted", value_name = "KIND", value_parser = parse_quote_kind)]
    extract_quoted: Vec<QuoteKind>,

    /// Comma separated encodings to force upon matches (default: all)
    #[arg(long, value_delimiter = ',', value_parser = parse_encoding)]
    encodings: Vec<Encoding>,

    /// Matches this long or shorter are not decoded
    #[arg(long, env = "PDFSIFT_MIN_DECODE_LENGTH", default_value_t = DEFAULT_MIN_DECODE_LENGTH)]
    min_decode_length: u64,

    /// Matches this long or longer are not decoded
    #[arg(long, env = "PDFSIFT_MAX_DECODE_LENGTH", default_value_t = DEFAULT_MAX_DECODE_LENGTH)]
    max_decode_length: u64,

    /// Context bytes shown on each side of a match
    #[arg(long, env = "PDFSIFT_SURROUNDING_BYTES", default_value_t = DEFAULT_SURROUNDING_BYTES)]
    surrounding_bytes: usize,

    /// Bytes shown from each end of the stream preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_BYTES)]
    preview_bytes: usize,

    /// Output line width
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,

    /// Skip the per-stream stats table
    #[arg(long)]
    no_stats: bool,

    /// Also print a byte-by-byte UTF-8 reconstruction of each stream
    #[arg(long)]
    force_utf8: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single stream file to scan
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of stream files to scan
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

fn parse_quote_kind(s: &str) -> pdfsift_core::Result<QuoteKind> {
    s.parse()
}

fn parse_encoding(s: &str) -> pdfsift_core::Result<Encoding> {
    s.parse()
}

impl Cli {
    /// Builds the scanner configuration, rejecting unusable combinations
    fn scanner_config(&self) -> Result<ScannerConfig> {
        let mut config = ScannerConfig::new()
            .min_decode_length(self.min_decode_length)
            .max_decode_length(self.max_decode_length)
            .surrounding_bytes(self.surrounding_bytes)
            .preview_bytes(self.preview_bytes)
            .quote_kinds(self.extract_quoted.clone());
        if !self.encodings.is_empty() {
            config = config.encodings(self.encodings.clone());
        }

        config.validate().context("Invalid scanner options")?;
        Ok(config)
    }

    /// Who the stream at `path` belongs to
    fn owner_for(&self, path: &Path) -> StreamOwner {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if self.font {
            StreamOwner::font(name)
        } else {
            StreamOwner::node(format!("{}({})", self.node_type, name), self.node_type.clone())
        }
    }
}

/// Compute a short hash of the content (first 8 chars of blake3)
fn content_hash(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    hash.to_hex()[..8].to_string()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = cli.scanner_config()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &config, file, &mut out)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &config, directory, &mut out).map(|_| ())
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Scan a single stream file
fn process_single_file<W: Write>(
    cli: &Cli,
    config: &ScannerConfig,
    file: &Path,
    out: &mut W,
) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    scan_stream(cli, config, file, out)?;
    Ok(())
}

/// Scan every stream file under a directory, returning the aggregate stats
fn process_directory<W: Write>(
    cli: &Cli,
    config: &ScannerConfig,
    directory: &Path,
    out: &mut W,
) -> Result<MatchStatsTracker> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut aggregate = MatchStatsTracker::new();
    let mut streams_scanned = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            trace!("Skipping hidden file: {}", path.display());
            continue;
        }

        debug!("Processing stream: {}", path.display());
        match scan_stream(cli, config, path, out) {
            Ok(stats) => {
                aggregate.merge(&stats);
                streams_scanned += 1;
            }
            // Log error but continue with other files
            Err(e) => warn!("Error processing {}: {:#}", path.display(), e),
        }
    }

    info!(
        "Summary: {} streams scanned, {} matches",
        streams_scanned,
        aggregate.total_matches()
    );

    let mut reporter = TextReporter::new(&mut *out).width(cli.width);
    reporter
        .section_header(&format!("Aggregate stats for {} streams", streams_scanned))
        .and_then(|()| reporter.pattern_stats(&aggregate))
        .context("Failed to write aggregate stats")?;

    Ok(aggregate)
}

/// Scan one stream file, writing the report to `out`
fn scan_stream<W: Write>(
    cli: &Cli,
    config: &ScannerConfig,
    path: &Path,
    out: &mut W,
) -> Result<MatchStatsTracker> {
    trace!("Reading {}", path.display());
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let owner = cli.owner_for(path);
    let bytes = if cli.eexec {
        match eexec_offset(&data) {
            Some(offset) => debug!("eexec marker at offset {} in {}", offset, path.display()),
            None => warn!("No eexec marker in {}, scanning whole stream", path.display()),
        }
        bytes_after_eexec_marker(&data)
    } else {
        &data[..]
    };

    let mut reporter = TextReporter::new(&mut *out).width(cli.width);
    reporter
        .section_header(&format!(
            "{} ({} bytes, blake3 {})",
            owner,
            bytes.len(),
            content_hash(bytes)
        ))
        .context("Failed to write report")?;

    let mut scanner = BinaryScanner::new(bytes, owner, config.clone(), &mut reporter)
        .with_context(|| format!("Failed to set up scan of {}", path.display()))?;
    let report = scanner.scan_all();
    if !cli.no_stats {
        scanner.report_stats();
    }
    let (stats, _) = scanner.into_parts();

    for failure in &report.failures {
        warn!(
            "Pattern {} failed in {}: {}",
            failure.pattern_name,
            path.display(),
            failure.error
        );
    }
    debug!(
        "{}: {} matches, {} decoded, {} suppressed",
        path.display(),
        report.matches,
        report.decoded,
        report.suppressed
    );

    if cli.force_utf8 {
        let forced = force_utf8(bytes);
        reporter
            .section_header("Forced UTF-8 reconstruction")
            .and_then(|()| reporter.notice(&forced.to_string()))
            .context("Failed to write report")?;
    }

    Ok(stats)
}
