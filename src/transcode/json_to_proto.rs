// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON to protobuf transcoding state machine.
//!
//! Walks the token stream from a [`JsonLexer`] under the direction of a
//! schema [`Message`] and appends wire records to a [`ProtoEncoder`].
//! Parsing is lenient: commas and colons between keys, values, and array
//! elements are skipped wherever they appear, and unknown keys have their
//! values skipped recursively.
//!
//! Default values never reach the wire: numeric literal `0`, `false`,
//! `null`, and (policy permitting) empty string/bytes bodies emit nothing.
//! Nested messages and map entries are encoded into scratch encoders first
//! because length-delimited records need their length before the payload.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::core::{Result, TranscodeError};
use crate::json::{unescape_json, JsonLexer, Token};
use crate::schema::{Field, Kind, Message, OmitPolicy};
use crate::wire::ProtoEncoder;

/// Transcode one JSON document into protobuf wire records.
///
/// The document must be a JSON object; anything else is
/// `UnexpectedToken`, and an empty input is `UnexpectedEof`. On error the
/// encoder may hold partial output.
pub fn transcode_to_proto(
    encoder: &mut ProtoEncoder,
    lexer: &mut JsonLexer<'_>,
    msg: &Message,
) -> Result<()> {
    let (token, _) = lexer.next();
    match token {
        Token::ObjectOpen => encode_object(encoder, lexer, msg),
        Token::Eof => Err(TranscodeError::UnexpectedEof),
        _ => Err(TranscodeError::UnexpectedToken),
    }
}

fn encode_object<'a>(
    p: &mut ProtoEncoder,
    j: &mut JsonLexer<'a>,
    msg: &Message,
) -> Result<()> {
    let mut key: Option<&'a [u8]> = None;
    while !j.eof() {
        let (lead, s) = j.next();
        match lead {
            Token::ObjectClose => {
                return if key.is_none() {
                    Ok(())
                } else {
                    Err(TranscodeError::UnexpectedToken)
                };
            }
            Token::Comma | Token::Colon => continue,
            _ => {
                if let Some(pending) = key.take() {
                    // the key is matched raw, without unescaping
                    let name = &pending[1..pending.len() - 1];
                    let field = std::str::from_utf8(name)
                        .ok()
                        .and_then(|name| msg.field_by_name(name));
                    match field {
                        Some(field) => encode_field(p, j, field, lead, s)?,
                        None => skip_value(j, lead)?,
                    }
                } else if lead == Token::String {
                    key = Some(s);
                } else {
                    return Err(TranscodeError::UnexpectedToken);
                }
            }
        }
    }
    Err(TranscodeError::UnexpectedEof)
}

/// Dispatch one field value by leading token and schema kind.
fn encode_field<'a>(
    p: &mut ProtoEncoder,
    j: &mut JsonLexer<'a>,
    field: &Field,
    lead: Token,
    s: &'a [u8],
) -> Result<()> {
    if field.omit == OmitPolicy::Always {
        return skip_value(j, lead);
    }
    match lead {
        Token::String => match field.kind {
            Kind::Bytes => encode_bytes_value(p, field.tag, field.omit == OmitPolicy::Empty, s),
            Kind::String => encode_string_value(p, field.tag, field.omit == OmitPolicy::Empty, s),
            _ => Err(TranscodeError::TypeMismatch),
        },
        Token::Number => encode_numeric_value(p, field.tag, field.kind, s),
        Token::Bool => {
            if field.kind != Kind::Bool {
                return Err(TranscodeError::TypeMismatch);
            }
            // "true" is 4 bytes; false is the wire default and stays absent
            if s.len() == 4 {
                p.emit_varint(field.tag, 1);
            }
            Ok(())
        }
        Token::Null => Ok(()),
        Token::ObjectOpen => match field.kind {
            Kind::Message => {
                let mut buf = ProtoEncoder::new();
                encode_object(&mut buf, j, field.message()?)?;
                if !buf.is_empty() {
                    p.emit_bytes(field.tag, buf.bytes());
                }
                Ok(())
            }
            Kind::Map => encode_map(p, j, field.tag, field.message()?),
            _ => Err(TranscodeError::TypeMismatch),
        },
        Token::ArrayOpen => {
            if field.repeated {
                encode_array(p, j, field)
            } else {
                Err(TranscodeError::TypeMismatch)
            }
        }
        _ => Err(TranscodeError::UnexpectedToken),
    }
}

/// Recursively consume a value without emitting anything.
fn skip_value(j: &mut JsonLexer<'_>, lead: Token) -> Result<()> {
    match lead {
        Token::Null | Token::Bool | Token::Number | Token::String => Ok(()),
        Token::ObjectOpen => {
            while !j.eof() {
                let (token, _) = j.next();
                match token {
                    Token::ObjectClose => return Ok(()),
                    Token::Comma | Token::Colon => {}
                    _ => skip_value(j, token)?,
                }
            }
            Err(TranscodeError::UnexpectedEof)
        }
        Token::ArrayOpen => {
            while !j.eof() {
                let (token, _) = j.next();
                match token {
                    Token::ArrayClose => return Ok(()),
                    Token::Comma => {}
                    _ => skip_value(j, token)?,
                }
            }
            Err(TranscodeError::UnexpectedEof)
        }
        _ => Err(TranscodeError::UnexpectedToken),
    }
}

fn encode_string_value(p: &mut ProtoEncoder, tag: u32, omit_empty: bool, s: &[u8]) -> Result<()> {
    if s.len() == 2 && omit_empty {
        return Ok(());
    }
    let body = &s[1..s.len() - 1];
    let mut unescaped = Vec::with_capacity(body.len());
    unescape_json(&mut unescaped, body)?;
    p.emit_bytes(tag, &unescaped);
    Ok(())
}

fn encode_bytes_value(p: &mut ProtoEncoder, tag: u32, omit_empty: bool, s: &[u8]) -> Result<()> {
    if s.len() == 2 && omit_empty {
        return Ok(());
    }
    let body = &s[1..s.len() - 1];
    let decoded = BASE64_STANDARD
        .decode(body)
        .map_err(|e| TranscodeError::base64(e.to_string()))?;
    p.emit_bytes(tag, &decoded);
    Ok(())
}

fn parse_number<T: std::str::FromStr>(s: &[u8]) -> Result<T> {
    std::str::from_utf8(s)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| TranscodeError::number_parse(String::from_utf8_lossy(s).into_owned()))
}

/// Emit one tagged numeric record, suppressing the literal `0`.
///
/// Literals that merely evaluate to zero (`00`, `0.0`, `-0`) still parse
/// and emit; only the exact single-character literal is treated as the
/// absent default.
fn encode_numeric_value(p: &mut ProtoEncoder, tag: u32, kind: Kind, s: &[u8]) -> Result<()> {
    if !kind.is_numeric() {
        return Err(TranscodeError::TypeMismatch);
    }
    if s == b"0" {
        return Ok(());
    }
    match kind {
        Kind::Double => p.emit_fixed64(tag, parse_number::<f64>(s)?.to_bits()),
        Kind::Float => p.emit_fixed32(tag, parse_number::<f32>(s)?.to_bits()),
        Kind::Int32 => p.emit_varint(tag, i64::from(parse_number::<i32>(s)?) as u64),
        Kind::Int64 => p.emit_varint(tag, parse_number::<i64>(s)? as u64),
        Kind::Uint32 => p.emit_varint(tag, u64::from(parse_number::<u32>(s)?)),
        Kind::Uint64 => p.emit_varint(tag, parse_number::<u64>(s)?),
        Kind::Sint32 => p.emit_zigzag(tag, i64::from(parse_number::<i32>(s)?)),
        Kind::Sint64 => p.emit_zigzag(tag, parse_number::<i64>(s)?),
        Kind::Fixed32 => p.emit_fixed32(tag, parse_number::<u32>(s)?),
        Kind::Fixed64 => p.emit_fixed64(tag, parse_number::<u64>(s)?),
        Kind::Sfixed32 => p.emit_fixed32(tag, parse_number::<i32>(s)? as u32),
        Kind::Sfixed64 => p.emit_fixed64(tag, parse_number::<i64>(s)? as u64),
        _ => return Err(TranscodeError::TypeMismatch),
    }
    Ok(())
}

/// Append one packed element (no tag) for a numeric kind.
fn write_packed_numeric(packed: &mut ProtoEncoder, kind: Kind, s: &[u8]) -> Result<()> {
    match kind {
        Kind::Double => packed.write_fixed64(parse_number::<f64>(s)?.to_bits()),
        Kind::Float => packed.write_fixed32(parse_number::<f32>(s)?.to_bits()),
        Kind::Int32 => packed.write_varint(i64::from(parse_number::<i32>(s)?) as u64),
        Kind::Int64 => packed.write_varint(parse_number::<i64>(s)? as u64),
        Kind::Uint32 => packed.write_varint(u64::from(parse_number::<u32>(s)?)),
        Kind::Uint64 => packed.write_varint(parse_number::<u64>(s)?),
        Kind::Sint32 => packed.write_zigzag(i64::from(parse_number::<i32>(s)?)),
        Kind::Sint64 => packed.write_zigzag(parse_number::<i64>(s)?),
        Kind::Fixed32 => packed.write_fixed32(parse_number::<u32>(s)?),
        Kind::Fixed64 => packed.write_fixed64(parse_number::<u64>(s)?),
        Kind::Sfixed32 => packed.write_fixed32(parse_number::<i32>(s)? as u32),
        Kind::Sfixed64 => packed.write_fixed64(parse_number::<i64>(s)? as u64),
        _ => return Err(TranscodeError::TypeMismatch),
    }
    Ok(())
}

/// Walk array elements of one expected token kind, tolerating commas.
fn walk_array<'a>(
    j: &mut JsonLexer<'a>,
    expect: Token,
    mut f: impl FnMut(&'a [u8]) -> Result<()>,
) -> Result<()> {
    while !j.eof() {
        let (token, s) = j.next();
        match token {
            Token::ArrayClose => return Ok(()),
            Token::Comma => {}
            _ if token == expect => f(s)?,
            _ => return Err(TranscodeError::UnexpectedToken),
        }
    }
    Err(TranscodeError::UnexpectedEof)
}

fn encode_repeated_message(
    p: &mut ProtoEncoder,
    j: &mut JsonLexer<'_>,
    field: &Field,
) -> Result<()> {
    let mut buf = ProtoEncoder::new();
    while !j.eof() {
        let (token, _) = j.next();
        match token {
            Token::ArrayClose => return Ok(()),
            Token::Comma => {}
            Token::ObjectOpen => {
                buf.clear();
                encode_object(&mut buf, j, field.message()?)?;
                p.emit_bytes(field.tag, buf.bytes());
            }
            // null elements keep their position as empty records
            Token::Null => p.emit_bytes(field.tag, &[]),
            _ => return Err(TranscodeError::UnexpectedToken),
        }
    }
    Err(TranscodeError::UnexpectedEof)
}

fn encode_array(p: &mut ProtoEncoder, j: &mut JsonLexer<'_>, field: &Field) -> Result<()> {
    match field.kind {
        Kind::Message => encode_repeated_message(p, j, field),
        Kind::Bytes => walk_array(j, Token::String, |s| {
            encode_bytes_value(p, field.tag, false, s)
        }),
        Kind::String => walk_array(j, Token::String, |s| {
            encode_string_value(p, field.tag, false, s)
        }),
        Kind::Bool => {
            let mut packed = ProtoEncoder::new();
            walk_array(j, Token::Bool, |s| {
                packed.write_varint(u64::from(s.len() == 4));
                Ok(())
            })?;
            if !packed.is_empty() {
                p.emit_bytes(field.tag, packed.bytes());
            }
            Ok(())
        }
        Kind::Map => Err(TranscodeError::TypeMismatch),
        _ => {
            let mut packed = ProtoEncoder::new();
            walk_array(j, Token::Number, |s| {
                write_packed_numeric(&mut packed, field.kind, s)
            })?;
            if !packed.is_empty() {
                p.emit_bytes(field.tag, packed.bytes());
            }
            Ok(())
        }
    }
}

/// Encode a JSON object as protobuf map entries under `tag`.
///
/// Each entry gets its own scratch record with the key at tag 1 and the
/// value at tag 2; zero suppression can leave an entry with only one of
/// the two present.
fn encode_map<'a>(
    p: &mut ProtoEncoder,
    j: &mut JsonLexer<'a>,
    tag: u32,
    entry: &Message,
) -> Result<()> {
    let (key_field, value_field) = entry.map_entry()?;

    let mut buf = ProtoEncoder::new();
    let mut expect_value = false;
    while !j.eof() {
        let (lead, s) = j.next();
        match lead {
            Token::ObjectClose => {
                return if expect_value {
                    Err(TranscodeError::UnexpectedToken)
                } else {
                    Ok(())
                };
            }
            Token::Comma | Token::Colon => continue,
            _ => {
                if expect_value {
                    encode_field(&mut buf, j, value_field, lead, s)?;
                    if !buf.is_empty() {
                        p.emit_bytes(tag, buf.bytes());
                    }
                    expect_value = false;
                } else if lead == Token::String {
                    buf.clear();
                    if key_field.kind == Kind::String {
                        encode_string_value(&mut buf, 1, true, s)?;
                    } else if key_field.kind.is_numeric() {
                        // numeric map keys arrive quoted; strip and reparse
                        encode_numeric_value(&mut buf, 1, key_field.kind, &s[1..s.len() - 1])?;
                    } else {
                        return Err(TranscodeError::TypeMismatch);
                    }
                    expect_value = true;
                } else {
                    return Err(TranscodeError::UnexpectedToken);
                }
            }
        }
    }
    Err(TranscodeError::UnexpectedEof)
}
