// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON string escape and unescape codecs at buffer granularity.
//!
//! The escape side replaces exactly eight bytes (`\b \t \n \f \r " / \`)
//! with two-character sequences and copies everything else verbatim,
//! including bytes >= 0x80 (UTF-8 pass-through) and control bytes outside
//! the table. `\u00XX` sequences are never produced.
//!
//! The unescape side additionally understands `\uXXXX` and emits the UTF-8
//! encoding of the code point. Surrogate halves are not paired; an
//! unpairable code point encodes as U+FFFD.

use crate::core::{Result, TranscodeError};

fn escape_char(c: u8) -> Option<u8> {
    match c {
        0x08 => Some(b'b'),
        b'\t' => Some(b't'),
        b'\n' => Some(b'n'),
        0x0C => Some(b'f'),
        b'\r' => Some(b'r'),
        b'"' => Some(b'"'),
        b'/' => Some(b'/'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

/// Append the JSON-escaped form of `src` to `dst`.
///
/// Unescaped runs are copied in one append each.
pub fn escape_json(dst: &mut Vec<u8>, src: &[u8]) {
    let mut begin = 0;
    for (i, &c) in src.iter().enumerate() {
        let Some(replacement) = escape_char(c) else {
            continue;
        };
        if begin < i {
            dst.extend_from_slice(&src[begin..i]);
        }
        dst.push(b'\\');
        dst.push(replacement);
        begin = i + 1;
    }
    if begin < src.len() {
        dst.extend_from_slice(&src[begin..]);
    }
}

/// Append the unescaped form of a JSON string body (quotes already
/// stripped) to `dst`.
///
/// Returns `MalformedString` for an unknown escape, bad hex digits, or a
/// sequence truncated at the end of the body.
pub fn unescape_json(dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
    let mut i = 0;
    while i < src.len() {
        let c = src[i];
        if c != b'\\' {
            dst.push(c);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&esc) = src.get(i) else {
            return Err(TranscodeError::MalformedString);
        };
        match esc {
            b'"' | b'/' | b'\\' => dst.push(esc),
            b'b' => dst.push(0x08),
            b'f' => dst.push(0x0C),
            b'n' => dst.push(b'\n'),
            b'r' => dst.push(b'\r'),
            b't' => dst.push(b'\t'),
            b'u' => {
                if i + 4 >= src.len() {
                    return Err(TranscodeError::MalformedString);
                }
                let mut code_point: u32 = 0;
                for _ in 0..4 {
                    i += 1;
                    let digit = match src[i] {
                        h @ b'0'..=b'9' => h - b'0',
                        h @ b'A'..=b'F' => h - b'A' + 10,
                        h @ b'a'..=b'f' => h - b'a' + 10,
                        _ => return Err(TranscodeError::MalformedString),
                    };
                    code_point = code_point << 4 | u32::from(digit);
                }
                let ch = char::from_u32(code_point).unwrap_or('\u{FFFD}');
                let mut utf8 = [0u8; 4];
                dst.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
            _ => return Err(TranscodeError::MalformedString),
        }
        i += 1;
    }
    Ok(())
}
