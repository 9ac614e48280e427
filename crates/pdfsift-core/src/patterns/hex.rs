//! Translation of YARA hex strings into byte regular expressions.
//!
//! Supported syntax:
//!
//! - `AB` a literal byte, `??` any byte
//! - `A?` / `?B` a byte with one fixed nibble
//! - `[-]`, `[n]`, `[n-]`, `[n-m]` jumps over arbitrary bytes
//! - `( AB | CD EF )` alternatives
//!
//! Jumps are lazy, so `AB [-] BB` stops at the first closing `BB`.

use crate::error::{Error, Result};

/// Any single byte, regardless of Unicode mode or newlines
const ANY_BYTE: &str = "(?s-u:.)";

/// Converts a hex pattern to an equivalent regex for `regex::bytes`
pub(crate) fn hex_to_regex(pattern: &str) -> Result<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut depth = 0usize;
    let mut atoms = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .map(|p| i + p)
                    .ok_or_else(|| Error::pattern_compile(pattern, "unterminated jump"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                regex.push_str(&jump_to_regex(pattern, inner.trim())?);
                atoms += 1;
                i = close + 1;
            }
            '(' => {
                depth += 1;
                regex.push_str("(?:");
                i += 1;
            }
            '|' if depth > 0 => {
                regex.push('|');
                i += 1;
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::pattern_compile(pattern, "unbalanced ')'"))?;
                regex.push(')');
                i += 1;
            }
            c if c.is_ascii_hexdigit() || c == '?' => {
                let Some(&low) = chars.get(i + 1).filter(|ch| ch.is_ascii_hexdigit() || **ch == '?')
                else {
                    return Err(Error::pattern_compile(pattern, "odd number of hex digits"));
                };
                regex.push_str(&byte_to_regex(c, low));
                atoms += 1;
                i += 2;
            }
            other => {
                return Err(Error::pattern_compile(
                    pattern,
                    format!("unexpected character '{}' at position {}", other, i),
                ));
            }
        }
    }

    if depth != 0 {
        return Err(Error::pattern_compile(pattern, "unbalanced '('"));
    }
    if atoms == 0 {
        return Err(Error::pattern_compile(pattern, "empty hex pattern"));
    }

    Ok(regex)
}

fn byte_to_regex(high: char, low: char) -> String {
    match (high.to_digit(16), low.to_digit(16)) {
        (Some(h), Some(l)) => format!("\\x{:02X}", h * 16 + l),
        (None, None) => ANY_BYTE.to_string(),
        (Some(h), None) => format!("[\\x{:02X}-\\x{:02X}]", h * 16, h * 16 + 15),
        (None, Some(l)) => {
            let class: String = (0..16).map(|h| format!("\\x{:02X}", h * 16 + l)).collect();
            format!("[{}]", class)
        }
    }
}

fn jump_to_regex(pattern: &str, jump: &str) -> Result<String> {
    let parse = |n: &str| {
        n.trim()
            .parse::<u32>()
            .map_err(|_| Error::pattern_compile(pattern, format!("invalid jump '[{}]'", jump)))
    };

    match jump.split_once('-') {
        None => Ok(format!("{}{{{}}}", ANY_BYTE, parse(jump)?)),
        Some((min, max)) => {
            let min = if min.trim().is_empty() { 0 } else { parse(min)? };
            if max.trim().is_empty() {
                return Ok(format!("{}{{{},}}?", ANY_BYTE, min));
            }
            let max = parse(max)?;
            if min > max {
                return Err(Error::pattern_compile(
                    pattern,
                    format!("jump range [{}-{}] is reversed", min, max),
                ));
            }
            Ok(format!("{}{{{},{}}}?", ANY_BYTE, min, max))
        }
    }
}
