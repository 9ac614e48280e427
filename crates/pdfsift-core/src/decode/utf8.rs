//! Byte-by-byte UTF-8 reconstruction.

use std::fmt;

/// Lead byte used to lift a single byte into a two-byte UTF-8 sequence
const TWO_BYTE_LEAD: u8 = 0xC2;

/// Result of [`force_utf8`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedUtf8 {
    /// Everything that could be reconstructed
    pub text: String,
    /// Byte values that could not be represented, in input order
    pub skipped: Vec<u8>,
}

impl fmt::Display for ForcedUtf8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if !self.skipped.is_empty() {
            write!(f, "\nFailed to decode: {:?}", self.skipped)?;
        }
        Ok(())
    }
}

/// Forces a UTF-8 reading upon `bytes` one byte at a time.
///
/// Bytes up to 127 are kept as they are. Every other byte is treated as the
/// continuation of a `C2` lead byte, which only works for `0x80..=0xBF`;
/// anything else lands in [`ForcedUtf8::skipped`].
pub fn force_utf8(bytes: &[u8]) -> ForcedUtf8 {
    let mut forced = ForcedUtf8::default();

    for &byte in bytes {
        if byte <= 127 {
            forced.text.push(char::from(byte));
            continue;
        }

        match std::str::from_utf8(&[TWO_BYTE_LEAD, byte]) {
            Ok(s) => forced.text.push_str(s),
            Err(_) => forced.skipped.push(byte),
        }
    }

    forced
}
