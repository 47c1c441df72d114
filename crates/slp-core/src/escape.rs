//! Reserved-character escaping for attribute values and tags
//!
//! Attribute lists use `\HH` escapes for bytes that would otherwise be
//! read as list syntax:
//! ```text
//! ,tag-example,   ->   \2Ctag-example\2C
//! ```
//!
//! Tags reserve a wider set than values (`*`, `_` and whitespace on top of
//! the value set). Unescaping ignores the distinction.

use crate::{Result, SlpError};

const ESCAPE_CHAR: u8 = b'\\';

/// Bytes reserved in both attribute values and tags
const VALUE_RESERVED: &[u8] = b",()!<=>~\\";

/// Additional bytes reserved in attribute tags
const TAG_RESERVED: &[u8] = b"*_ \t\r\n";

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

fn is_reserved(byte: u8, is_tag: bool) -> bool {
    byte.is_ascii_control()
        || VALUE_RESERVED.contains(&byte)
        || (is_tag && TAG_RESERVED.contains(&byte))
}

/// Escape every reserved byte of `input` as `\HH`
pub fn escape(input: &str, is_tag: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        // Multi-byte characters never contain reserved ASCII bytes
        if ch.is_ascii() && is_reserved(ch as u8, is_tag) {
            let byte = ch as u8;
            out.push(ESCAPE_CHAR as char);
            out.push(HEX_UPPER[(byte >> 4) as usize] as char);
            out.push(HEX_UPPER[(byte & 0x0F) as usize] as char);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Replace every `\HH` sequence of `input` with the byte it encodes
///
/// `is_tag` is accepted for symmetry with [`escape`]; decoding does not
/// depend on it.
pub fn unescape(input: &str, _is_tag: bool) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != ESCAPE_CHAR {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let (hi, lo) = match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(&hi), Some(&lo)) => (hi, lo),
            _ => {
                return Err(SlpError::parse(
                    "unescape",
                    format!("truncated escape sequence at offset {}", i),
                ))
            }
        };

        match (hex_value(hi), hex_value(lo)) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => {
                return Err(SlpError::parse(
                    "unescape",
                    format!("invalid escape sequence at offset {}", i),
                ))
            }
        }
        i += 3;
    }

    String::from_utf8(out)
        .map_err(|_| SlpError::parse("unescape", "escaped bytes are not valid UTF-8"))
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
