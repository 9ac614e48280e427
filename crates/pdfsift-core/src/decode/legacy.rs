//! Stateful 7-bit encodings that have no WHATWG definition.
//!
//! Both decoders are lossy: invalid input becomes [`REPLACEMENT_CHARACTER`]
//! and is counted, so a strict decode is simply one with no substitutions.

use super::REPLACEMENT_CHARACTER;

const SHIFT_OUT: u8 = b'+';
const SHIFT_END: u8 = b'-';
const HZ_ESCAPE: u8 = b'~';

fn base64_value(byte: u8) -> Option<u32> {
    match byte {
        b'A'..=b'Z' => Some(u32::from(byte - b'A')),
        b'a'..=b'z' => Some(u32::from(byte - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(byte - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decodes UTF-7 (RFC 2152), returning the text and the substitution count
pub(crate) fn decode_utf7(bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut replaced = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;

        if byte != SHIFT_OUT {
            if byte.is_ascii() {
                text.push(char::from(byte));
            } else {
                text.push(REPLACEMENT_CHARACTER);
                replaced += 1;
            }
            continue;
        }

        // "+-" is a literal plus sign
        if bytes.get(i) == Some(&SHIFT_END) {
            text.push('+');
            i += 1;
            continue;
        }

        let mut units = Vec::new();
        let mut bits: u32 = 0;
        let mut bit_count = 0;
        while let Some(value) = bytes.get(i).copied().and_then(base64_value) {
            bits = (bits << 6) | value;
            bit_count += 6;
            if bit_count >= 16 {
                bit_count -= 16;
                units.push((bits >> bit_count) as u16);
                bits &= (1 << bit_count) - 1;
            }
            i += 1;
        }

        for unit in char::decode_utf16(units) {
            text.push(unit.unwrap_or_else(|_| {
                replaced += 1;
                REPLACEMENT_CHARACTER
            }));
        }

        // Leftover padding must be shorter than one sextet and all zero
        if bit_count >= 6 || bits != 0 {
            text.push(REPLACEMENT_CHARACTER);
            replaced += 1;
        }

        if bytes.get(i) == Some(&SHIFT_END) {
            i += 1;
        }
    }

    (text, replaced)
}

/// Decodes HZ-GB-2312 (RFC 1843), returning the text and the substitution count
pub(crate) fn decode_hz(bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut replaced = 0;
    let mut in_gb = false;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if byte == HZ_ESCAPE {
            match (in_gb, bytes.get(i + 1).copied()) {
                (false, Some(HZ_ESCAPE)) => text.push('~'),
                (false, Some(b'\n')) => {}
                (false, Some(b'{')) => in_gb = true,
                (true, Some(b'}')) => in_gb = false,
                _ => {
                    text.push(REPLACEMENT_CHARACTER);
                    replaced += 1;
                    i += 1;
                    continue;
                }
            }
            i += 2;
            continue;
        }

        if !in_gb {
            if byte.is_ascii() {
                text.push(char::from(byte));
            } else {
                text.push(REPLACEMENT_CHARACTER);
                replaced += 1;
            }
            i += 1;
            continue;
        }

        let gb_range = 0x21..=0x7E;
        match bytes.get(i + 1).copied() {
            Some(trail) if gb_range.contains(&byte) && gb_range.contains(&trail) => {
                let pair = [byte | 0x80, trail | 0x80];
                match encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(&pair) {
                    Some(decoded) => text.push_str(&decoded),
                    None => {
                        text.push(REPLACEMENT_CHARACTER);
                        replaced += 1;
                    }
                }
                i += 2;
            }
            _ => {
                text.push(REPLACEMENT_CHARACTER);
                replaced += 1;
                i += 1;
            }
        }
    }

    (text, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hz(text: &str) -> Vec<u8> {
        let (gb, _, _) = encoding_rs::GBK.encode(text);
        let mut out = b"~{".to_vec();
        out.extend(gb.iter().map(|b| b & 0x7F));
        out.extend_from_slice(b"~}");
        out
    }

    #[test]
    fn test_utf7_shifted_sequences() {
        assert_eq!(decode_utf7(b"Hi Mom -+Jjo--!"), ("Hi Mom -\u{263A}-!".to_string(), 0));
        assert_eq!(decode_utf7(b"+ZeVnLIqe-"), ("日本語".to_string(), 0));
        assert_eq!(decode_utf7(b"A+ImIDkQ."), ("A\u{2262}\u{0391}.".to_string(), 0));
    }

    #[test]
    fn test_utf7_literal_plus_and_errors() {
        assert_eq!(decode_utf7(b"1 +- 1"), ("1 + 1".to_string(), 0));
        assert_eq!(decode_utf7(b"a\x80"), ("a\u{FFFD}".to_string(), 1));
        // a lone sextet cannot be padding
        assert_eq!(decode_utf7(b"+A-x"), ("\u{FFFD}x".to_string(), 1));
    }

    #[test]
    fn test_hz_switches_modes() {
        let mut input = b"a~~b ".to_vec();
        input.extend(hz("中文"));
        input.push(b'c');
        assert_eq!(decode_hz(&input), ("a~b 中文c".to_string(), 0));
    }

    #[test]
    fn test_hz_line_continuation_and_errors() {
        assert_eq!(decode_hz(b"ab~\ncd"), ("abcd".to_string(), 0));
        assert_eq!(decode_hz(b"~x"), ("\u{FFFD}x".to_string(), 1));
        assert_eq!(decode_hz(b"~{V"), ("\u{FFFD}".to_string(), 1));
    }
}
