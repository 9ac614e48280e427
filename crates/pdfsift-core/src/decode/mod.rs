//! Forcing text encodings upon arbitrary bytes.
//!
//! [`ForcedDecoder`] runs a byte range through every configured
//! [`Encoding`] and reports what came out as a [`DecodeAttempt`]. A decode
//! that only works once invalid sequences are swapped for `U+FFFD` is still
//! shown, but is counted separately as force decoded.

mod legacy;
mod utf8;

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub use utf8::{force_utf8, ForcedUtf8};

/// Character substituted for undecodable input
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Default share of replacement characters a force decode may contain
pub const DEFAULT_MAX_REPLACEMENT_RATIO: f64 = 0.5;

/// Text encodings the decoder can force upon bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    /// 7-bit ASCII
    Ascii,
    /// UTF-8
    Utf8,
    /// UTF-16, little endian
    Utf16Le,
    /// UTF-16, big endian
    Utf16Be,
    /// UTF-7 (RFC 2152)
    Utf7,
    /// ISO-8859-1 (Latin-1)
    Iso8859_1,
    /// Windows-1252
    Windows1252,
    /// Big5, including the HKSCS extensions
    Big5,
    /// GBK, a superset of GB2312
    Gbk,
    /// GB18030
    Gb18030,
    /// HZ-GB-2312 (RFC 1843)
    Hz,
    /// ISO-2022-JP
    Iso2022Jp,
}

impl Encoding {
    /// Every supported encoding, in default attempt order
    pub const ALL: [Encoding; 12] = [
        Encoding::Ascii,
        Encoding::Utf8,
        Encoding::Utf16Le,
        Encoding::Utf16Be,
        Encoding::Utf7,
        Encoding::Iso8859_1,
        Encoding::Windows1252,
        Encoding::Big5,
        Encoding::Gbk,
        Encoding::Gb18030,
        Encoding::Hz,
        Encoding::Iso2022Jp,
    ];

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf7 => "utf-7",
            Encoding::Iso8859_1 => "iso-8859-1",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Big5 => "big5",
            Encoding::Gbk => "gbk",
            Encoding::Gb18030 => "gb18030",
            Encoding::Hz => "hz",
            Encoding::Iso2022Jp => "iso-2022-jp",
        }
    }

    /// The WHATWG encoding backing this one, if any
    fn whatwg(&self) -> Option<&'static encoding_rs::Encoding> {
        match self {
            Encoding::Utf8 => Some(encoding_rs::UTF_8),
            Encoding::Utf16Le => Some(encoding_rs::UTF_16LE),
            Encoding::Utf16Be => Some(encoding_rs::UTF_16BE),
            Encoding::Windows1252 => Some(encoding_rs::WINDOWS_1252),
            Encoding::Big5 => Some(encoding_rs::BIG5),
            Encoding::Gbk => Some(encoding_rs::GBK),
            Encoding::Gb18030 => Some(encoding_rs::GB18030),
            Encoding::Iso2022Jp => Some(encoding_rs::ISO_2022_JP),
            Encoding::Ascii | Encoding::Utf7 | Encoding::Iso8859_1 | Encoding::Hz => None,
        }
    }

    /// Decodes without substitutions; `None` if any input is invalid
    pub fn decode_strict(&self, bytes: &[u8]) -> Option<String> {
        if let Some(encoding) = self.whatwg() {
            return encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned);
        }

        match self {
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Iso8859_1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            _ => {
                let (text, errors) = self.decode_lossy(bytes);
                (errors == 0).then_some(text)
            }
        }
    }

    /// Decodes, substituting [`REPLACEMENT_CHARACTER`] for invalid input
    ///
    /// Returns the text and the number of substitutions made.
    pub fn decode_lossy(&self, bytes: &[u8]) -> (String, usize) {
        if let Some(encoding) = self.whatwg() {
            let (text, _) = encoding.decode_without_bom_handling(bytes);
            let replaced = text.chars().filter(|&c| c == REPLACEMENT_CHARACTER).count();
            return (text.into_owned(), replaced);
        }

        match self {
            Encoding::Ascii => {
                let mut replaced = 0;
                let text = bytes
                    .iter()
                    .map(|&b| {
                        if b.is_ascii() {
                            char::from(b)
                        } else {
                            replaced += 1;
                            REPLACEMENT_CHARACTER
                        }
                    })
                    .collect();
                (text, replaced)
            }
            Encoding::Utf7 => legacy::decode_utf7(bytes),
            Encoding::Hz => legacy::decode_hz(bytes),
            _ => (bytes.iter().map(|&b| char::from(b)).collect(), 0),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "ascii" | "us-ascii" => Encoding::Ascii,
            "utf-8" | "utf8" => Encoding::Utf8,
            "utf-16" | "utf16" | "utf-16le" | "utf-16-le" | "utf16le" => Encoding::Utf16Le,
            "utf-16be" | "utf-16-be" | "utf16be" => Encoding::Utf16Be,
            "utf-7" | "utf7" => Encoding::Utf7,
            "iso-8859-1" | "latin-1" | "latin1" => Encoding::Iso8859_1,
            "windows-1252" | "cp1252" => Encoding::Windows1252,
            "big5" | "big5hkscs" | "big5-hkscs" | "cp950" => Encoding::Big5,
            "gbk" | "gb2312" | "cp936" => Encoding::Gbk,
            "gb18030" => Encoding::Gb18030,
            "hz" | "hz-gb-2312" => Encoding::Hz,
            "iso-2022-jp" | "iso2022-jp" | "iso-2022-jp-2" | "iso2022-jp-2" => Encoding::Iso2022Jp,
            _ => return Err(Error::UnknownEncoding(s.to_string())),
        };
        Ok(encoding)
    }
}

/// What came out of forcing one encoding upon some bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Clean decode, no substitutions
    Decoded(String),
    /// Too little of the input made sense under this encoding
    Undecodable,
    /// Decoded once invalid sequences were replaced
    ForceDecoded {
        /// The decoded text, including replacement characters
        text: String,
        /// Number of replacement characters substituted
        replacements: usize,
    },
}

/// The outcome of decoding one byte range under one encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeAttempt {
    /// Encoding that was attempted
    pub encoding: Encoding,
    /// What came out
    pub outcome: DecodeOutcome,
}

impl DecodeAttempt {
    /// The decoded text, if there is any to show
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            DecodeOutcome::Decoded(text) | DecodeOutcome::ForceDecoded { text, .. } => Some(text),
            DecodeOutcome::Undecodable => None,
        }
    }
}

/// Attempts every configured encoding on a byte range
#[derive(Debug, Clone)]
pub struct ForcedDecoder {
    encodings: Vec<Encoding>,
    max_replacement_ratio: f64,
}

impl Default for ForcedDecoder {
    fn default() -> Self {
        Self::new(Encoding::ALL.to_vec())
    }
}

impl ForcedDecoder {
    /// Creates a decoder attempting `encodings` in the given order
    pub fn new(encodings: Vec<Encoding>) -> Self {
        Self {
            encodings,
            max_replacement_ratio: DEFAULT_MAX_REPLACEMENT_RATIO,
        }
    }

    /// Sets the largest share of replacement characters a force decode may have
    pub fn max_replacement_ratio(mut self, ratio: f64) -> Self {
        self.max_replacement_ratio = ratio;
        self
    }

    /// Decodes `bytes` under every encoding, one attempt per encoding
    pub fn decode_attempts(&self, bytes: &[u8]) -> Vec<DecodeAttempt> {
        self.encodings
            .iter()
            .map(|&encoding| DecodeAttempt {
                encoding,
                outcome: self.decode(encoding, bytes),
            })
            .collect()
    }

    fn decode(&self, encoding: Encoding, bytes: &[u8]) -> DecodeOutcome {
        if let Some(text) = encoding.decode_strict(bytes) {
            return DecodeOutcome::Decoded(text);
        }

        let (text, replacements) = encoding.decode_lossy(bytes);
        let chars = text.chars().count();

        if chars > 0 && replacements as f64 <= self.max_replacement_ratio * chars as f64 {
            DecodeOutcome::ForceDecoded { text, replacements }
        } else {
            DecodeOutcome::Undecodable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn utf16be(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
    }

    fn outcome_for(attempts: &[DecodeAttempt], encoding: Encoding) -> &DecodeOutcome {
        &attempts
            .iter()
            .find(|a| a.encoding == encoding)
            .unwrap()
            .outcome
    }

    #[test]
    fn test_one_attempt_per_encoding_in_order() {
        let order = vec![Encoding::Utf16Be, Encoding::Ascii, Encoding::Utf8];
        let attempts = ForcedDecoder::new(order.clone()).decode_attempts(b"abc");
        let encodings: Vec<Encoding> = attempts.iter().map(|a| a.encoding).collect();
        assert_eq!(encodings, order);
    }

    #[test]
    fn test_round_trips_decode_cleanly() {
        let original = "eval(unescape('%u9090'))";
        let decoder = ForcedDecoder::default();

        let cases = [
            (Encoding::Ascii, original.as_bytes().to_vec()),
            (Encoding::Utf8, "çà et là «ok»".as_bytes().to_vec()),
            (Encoding::Utf16Le, utf16le(original)),
            (Encoding::Utf16Be, utf16be("日本語")),
        ];

        for (encoding, bytes) in cases {
            let attempts = decoder.decode_attempts(&bytes);
            let expected = match encoding {
                Encoding::Utf8 => "çà et là «ok»",
                Encoding::Utf16Be => "日本語",
                _ => original,
            };
            assert_eq!(
                outcome_for(&attempts, encoding),
                &DecodeOutcome::Decoded(expected.to_string())
            );
        }
    }

    #[test]
    fn test_latin1_always_decodes() {
        let attempts = ForcedDecoder::new(vec![Encoding::Iso8859_1]).decode_attempts(b"\xabhi\xbb");
        assert_eq!(attempts[0].outcome, DecodeOutcome::Decoded("«hi»".to_string()));
    }

    #[test]
    fn test_force_decoded_counts_replacements() {
        let decoder = ForcedDecoder::new(vec![Encoding::Utf8, Encoding::Ascii]);
        let attempts = decoder.decode_attempts(b"abc\xffdef");

        assert_eq!(
            attempts[0].outcome,
            DecodeOutcome::ForceDecoded {
                text: "abc\u{FFFD}def".to_string(),
                replacements: 1,
            }
        );
        assert!(matches!(attempts[1].outcome, DecodeOutcome::ForceDecoded { replacements: 1, .. }));
        assert_eq!(attempts[1].text(), Some("abc\u{FFFD}def"));
    }

    #[test]
    fn test_mostly_invalid_input_is_undecodable() {
        let decoder = ForcedDecoder::new(vec![Encoding::Utf8]);
        let attempts = decoder.decode_attempts(b"\xff\xfe\xfd\xfca");
        assert_eq!(attempts[0].outcome, DecodeOutcome::Undecodable);
        assert_eq!(attempts[0].text(), None);
    }

    #[test]
    fn test_odd_length_utf16() {
        let (text, replaced) = Encoding::Utf16Le.decode_lossy(b"a\x00b");
        assert_eq!(text, "a\u{FFFD}");
        assert_eq!(replaced, 1);
        assert_eq!(Encoding::Utf16Le.decode_strict(b"a\x00b"), None);
    }

    #[test]
    fn test_windows_1252_high_bytes() {
        let attempts = ForcedDecoder::new(vec![Encoding::Windows1252]).decode_attempts(b"caf\xE9 \x80");
        assert_eq!(attempts[0].outcome, DecodeOutcome::Decoded("café €".to_string()));
        // unassigned bytes map to C1 controls rather than failing
        assert_eq!(Encoding::Windows1252.decode_strict(b"\x81"), Some("\u{81}".to_string()));
    }

    #[test]
    fn test_cjk_round_trips() {
        let text = "中文 eval(unescape('%u4141'))";
        let cases = [
            (Encoding::Big5, encoding_rs::BIG5),
            (Encoding::Gbk, encoding_rs::GBK),
            (Encoding::Gb18030, encoding_rs::GB18030),
            (Encoding::Iso2022Jp, encoding_rs::ISO_2022_JP),
        ];

        for (encoding, whatwg) in cases {
            let (bytes, _, unmappable) = whatwg.encode(text);
            assert!(!unmappable, "{} cannot encode the sample", encoding);
            let attempts = ForcedDecoder::new(vec![encoding]).decode_attempts(&bytes);
            assert_eq!(
                attempts[0].outcome,
                DecodeOutcome::Decoded(text.to_string()),
                "{}",
                encoding
            );
        }
    }

    #[test]
    fn test_gb18030_four_byte_sequences() {
        let text = "€ 𠀀";
        let (bytes, _, _) = encoding_rs::GB18030.encode(text);
        // two bytes for the euro sign, four for the supplementary ideograph
        assert_eq!(bytes.len(), 7);
        assert_eq!(Encoding::Gb18030.decode_strict(&bytes), Some(text.to_string()));
    }

    #[test]
    fn test_big5_truncated_lead_byte() {
        let (mut bytes, _, _) = encoding_rs::BIG5.encode("中文");
        bytes.to_mut().push(0xA4);
        let (text, replaced) = Encoding::Big5.decode_lossy(&bytes);
        assert_eq!(text, "中文\u{FFFD}");
        assert_eq!(replaced, 1);
        assert_eq!(Encoding::Big5.decode_strict(&bytes), None);
    }

    #[test]
    fn test_legacy_encodings_through_decoder() {
        let decoder = ForcedDecoder::new(vec![Encoding::Utf7, Encoding::Hz]);
        let attempts = decoder.decode_attempts(b"1 +- 1");
        assert_eq!(attempts[0].outcome, DecodeOutcome::Decoded("1 + 1".to_string()));
        assert_eq!(attempts[1].outcome, DecodeOutcome::Decoded("1 +- 1".to_string()));
    }

    #[test]
    fn test_empty_input_decodes() {
        for attempt in ForcedDecoder::default().decode_attempts(b"") {
            assert_eq!(attempt.outcome, DecodeOutcome::Decoded(String::new()));
        }
    }

    #[test]
    fn test_utf8_lossy_truncated_sequence() {
        assert_eq!(Encoding::Utf8.decode_lossy(b"ab\xe6\x97"), ("ab\u{FFFD}".to_string(), 1));
    }

    #[test]
    fn test_encoding_names_round_trip() {
        for encoding in Encoding::ALL {
            assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        }
        assert_eq!("Latin_1".parse::<Encoding>().unwrap(), Encoding::Iso8859_1);
        assert_eq!("big5hkscs".parse::<Encoding>().unwrap(), Encoding::Big5);
        assert_eq!("cp950".parse::<Encoding>().unwrap(), Encoding::Big5);
        assert_eq!("gb2312".parse::<Encoding>().unwrap(), Encoding::Gbk);
        assert_eq!("iso2022_jp_2".parse::<Encoding>().unwrap(), Encoding::Iso2022Jp);
        assert_eq!("utf_16".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
        assert_eq!("UTF-7".parse::<Encoding>().unwrap(), Encoding::Utf7);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
