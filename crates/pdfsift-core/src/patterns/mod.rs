//! Pattern specifications and the built-in pattern catalogs.
//!
//! A [`PatternSpec`] names a single pattern and says how its source should be
//! read: as a YARA-style hex string or as a byte regular expression. Specs
//! are plain data; [`crate::scanner::CompiledPattern`] turns them into
//! something that can be run against a buffer.
//!
//! The catalogs in [`catalog`] hold the patterns the scanner looks for by
//! default: dangerous PDF/JavaScript instructions, byte order marks and
//! quote delimiters.

pub mod catalog;
mod hex;

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub(crate) use self::hex::hex_to_regex;

/// How a pattern's source string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternType {
    /// YARA hex string, e.g. `AB [-] BB`
    Hex,
    /// Byte regular expression
    Regex,
}

impl PatternType {
    /// Returns the lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Hex => "hex",
            PatternType::Regex => "regex",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named pattern to scan for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    name: String,
    pattern: String,
    pattern_type: PatternType,
    label: String,
}

impl PatternSpec {
    /// Creates a spec from a regular expression
    pub fn regex(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name.into(), pattern.into(), PatternType::Regex)
    }

    /// Creates a spec from a YARA hex string
    pub fn hex(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name.into(), pattern.into(), PatternType::Hex)
    }

    /// Creates a spec that matches `text` literally; the text doubles as the name
    pub fn literal(text: &str) -> Self {
        Self::regex(text, regex::escape(text))
    }

    /// Creates a hex spec matching exactly `bytes`
    pub fn hex_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::hex(name, hex_string(bytes))
    }

    fn new(name: String, pattern: String, pattern_type: PatternType) -> Self {
        let label = safe_label(&name);
        Self {
            name,
            pattern,
            pattern_type,
            label,
        }
    }

    /// Name used as the stats key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pattern source
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// How the source is interpreted
    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Label attached to every match of this pattern
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Replaces every character that is not valid in a YARA identifier with `_`
pub fn safe_label(label: &str) -> String {
    let mut safe: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if safe.is_empty() || safe.starts_with(|c: char| c.is_ascii_digit()) {
        safe.insert(0, '_');
    }

    safe
}

/// Formats bytes as an uppercase, space separated hex string (`EF BB BF`)
pub fn hex_string(bytes: &[u8]) -> String {
    let encoded = ::hex::encode_upper(bytes);
    let pairs: Vec<&str> = encoded
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .collect();
    pairs.join(" ")
}

/// Kinds of quote delimiters whose contents can be extracted and force decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuoteKind {
    /// `` `...` ``
    Backtick,
    /// `\'...\'`
    EscapedSingle,
    /// `\"...\"`
    EscapedDouble,
    /// `/.../` (regular expression literals)
    FrontSlash,
    /// `«...»` in Latin-1 (bytes `AB` and `BB`)
    Guillemet,
}

impl QuoteKind {
    /// Every quote kind in catalog order
    pub const ALL: [QuoteKind; 5] = [
        QuoteKind::Backtick,
        QuoteKind::EscapedSingle,
        QuoteKind::EscapedDouble,
        QuoteKind::FrontSlash,
        QuoteKind::Guillemet,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteKind::Backtick => "backtick",
            QuoteKind::EscapedSingle => "escaped_single",
            QuoteKind::EscapedDouble => "escaped_double",
            QuoteKind::FrontSlash => "frontslash",
            QuoteKind::Guillemet => "guillemet",
        }
    }

    /// Capitalized name for section headers
    pub fn title(&self) -> &'static str {
        match self {
            QuoteKind::Backtick => "Backtick",
            QuoteKind::EscapedSingle => "Escaped Single",
            QuoteKind::EscapedDouble => "Escaped Double",
            QuoteKind::FrontSlash => "Frontslash",
            QuoteKind::Guillemet => "Guillemet",
        }
    }

    /// Stats key for matches of this quote kind
    pub fn stats_key(&self) -> String {
        format!("{}_quoted", self.as_str())
    }

    /// The delimiter pattern for this quote kind
    pub fn pattern_spec(&self) -> PatternSpec {
        let name = self.stats_key();
        match self {
            QuoteKind::Backtick => PatternSpec::regex(name, "`.+`"),
            QuoteKind::EscapedSingle => PatternSpec::regex(name, r"\\'.+\\'"),
            QuoteKind::EscapedDouble => PatternSpec::regex(name, r#"\\".+\\""#),
            QuoteKind::FrontSlash => PatternSpec::regex(name, "/.+/"),
            QuoteKind::Guillemet => PatternSpec::hex(name, "AB [-] BB"),
        }
    }
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        QuoteKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .or(match normalized.as_str() {
                "front_slash" => Some(QuoteKind::FrontSlash),
                _ => None,
            })
            .ok_or_else(|| Error::UnknownQuoteKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_safe_label() {
        assert_eq!(safe_label("/JavaScript"), "_JavaScript");
        assert_eq!(safe_label("UTF-8 BOM"), "UTF_8_BOM");
        assert_eq!(safe_label("7bit"), "_7bit");
        assert_eq!(safe_label(""), "_");
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0xEF, 0xBB, 0xBF]), "EF BB BF");
        assert_eq!(hex_string(&[]), "");
    }

    #[test]
    fn test_literal_spec_escapes_metacharacters() {
        let spec = PatternSpec::literal("String.fromCharCode(");
        assert_eq!(spec.name(), "String.fromCharCode(");
        assert_eq!(spec.pattern(), r"String\.fromCharCode\(");
        assert_eq!(spec.pattern_type(), PatternType::Regex);
    }

    #[test]
    fn test_quote_kind_parsing() {
        assert_eq!("backtick".parse::<QuoteKind>().unwrap(), QuoteKind::Backtick);
        assert_eq!("escaped-single".parse::<QuoteKind>().unwrap(), QuoteKind::EscapedSingle);
        assert_eq!("Front_Slash".parse::<QuoteKind>().unwrap(), QuoteKind::FrontSlash);
        assert!(matches!(
            "tilde".parse::<QuoteKind>(),
            Err(Error::UnknownQuoteKind(name)) if name == "tilde"
        ));
    }

    #[test]
    fn test_quote_kind_specs() {
        let spec = QuoteKind::Guillemet.pattern_spec();
        assert_eq!(spec.name(), "guillemet_quoted");
        assert_eq!(spec.pattern_type(), PatternType::Hex);
        assert_eq!(QuoteKind::Backtick.pattern_spec().pattern(), "`.+`");
    }
}
