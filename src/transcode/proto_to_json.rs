// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Protobuf to JSON transcoding state machine.
//!
//! Reads wire records from a [`ProtoDecoder`] under the direction of a
//! schema [`Message`] and appends JSON text to a [`JsonBuilder`]. Unknown
//! tags are dropped; duplicate records for a non-repeated field keep the
//! first value. Repeated fields and maps consume consecutive same-tag
//! records with a peek-ahead loop, so element order follows the wire.
//!
//! After the record loop, unemitted fields with the `Never` omit policy get
//! their defaults in declaration order.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::core::{Result, TranscodeError};
use crate::json::JsonBuilder;
use crate::schema::{wire_type_of, Field, Kind, Message, OmitPolicy};
use crate::wire::{decode_zigzag, ProtoDecoder, WireType};

/// Transcode one protobuf message into a JSON object.
///
/// On error the builder may hold partial output.
pub fn transcode_to_json(
    builder: &mut JsonBuilder,
    decoder: &mut ProtoDecoder<'_>,
    msg: &Message,
) -> Result<()> {
    write_message(builder, decoder, msg)
}

/// One decoded wire value; `x` for scalar wire types, `s` for
/// length-delimited records.
#[derive(Debug, Clone, Copy, Default)]
struct ProtoValue<'a> {
    x: u64,
    s: &'a [u8],
}

fn read_value<'a>(p: &mut ProtoDecoder<'a>, wire: WireType) -> Result<ProtoValue<'a>> {
    let mut value = ProtoValue::default();
    match wire {
        WireType::Varint => value.x = p.read_varint()?,
        WireType::Fixed32 => value.x = u64::from(p.read_fixed32()?),
        WireType::Fixed64 => value.x = p.read_fixed64()?,
        WireType::LengthDelimited => value.s = p.read_bytes()?,
    }
    Ok(value)
}

fn default_literal(kind: Kind) -> &'static str {
    match kind {
        Kind::Bool => "false",
        Kind::String | Kind::Bytes => "\"\"",
        Kind::Map | Kind::Message => "{}",
        _ => "0",
    }
}

fn write_default(j: &mut JsonBuilder, repeated: bool, kind: Kind) {
    if repeated {
        j.append_str("[]");
    } else {
        j.append_str(default_literal(kind));
    }
}

fn write_string_value(j: &mut JsonBuilder, s: &[u8]) {
    j.append_byte(b'"');
    j.append_escaped(s);
    j.append_byte(b'"');
}

fn write_bytes_value(j: &mut JsonBuilder, s: &[u8]) {
    j.append_byte(b'"');
    let encoded = BASE64_STANDARD.encode(s);
    j.reserve(encoded.len() + 1);
    j.append_str(&encoded);
    j.append_byte(b'"');
}

/// Print one scalar wire value for the given kind.
///
/// Floats use the standard formatter's shortest round-trip form; integers
/// print in decimal with the signedness the kind implies. Non-scalar kinds
/// write nothing.
fn write_scalar(j: &mut JsonBuilder, kind: Kind, x: u64) {
    match kind {
        Kind::Double => j.append_str(&f64::from_bits(x).to_string()),
        Kind::Float => j.append_str(&f32::from_bits(x as u32).to_string()),
        Kind::Int32 | Kind::Int64 | Kind::Sfixed64 => j.append_str(&(x as i64).to_string()),
        Kind::Uint32 | Kind::Uint64 | Kind::Fixed32 | Kind::Fixed64 => {
            j.append_str(&x.to_string())
        }
        Kind::Sint32 | Kind::Sint64 => j.append_str(&decode_zigzag(x).to_string()),
        Kind::Sfixed32 => j.append_str(&i64::from(x as u32 as i32).to_string()),
        Kind::Bool => j.append_str(if x != 0 { "true" } else { "false" }),
        _ => {}
    }
}

/// Emit a map as a JSON object, one wire record per entry.
///
/// Each record is decoded as a two-field entry message. A missing key
/// prints as `""` (string keys) or `"0"` (numeric keys); a missing value
/// prints the value field's default. Keys are always quoted.
fn write_map<'a>(
    j: &mut JsonBuilder,
    p: &mut ProtoDecoder<'a>,
    tag: u32,
    entry: &Message,
    first: &'a [u8],
) -> Result<()> {
    j.append_byte(b'{');

    let (key_field, value_field) = entry.map_entry()?;
    let key_wire = wire_type_of(key_field.kind, key_field.repeated);
    let value_wire = wire_type_of(value_field.kind, value_field.repeated);

    let mut s = first;
    let mut more = false;
    loop {
        if more {
            j.append_byte(b',');
        } else {
            more = true;
        }

        let mut values = [ProtoValue::default(); 2];
        let mut assigned = 0u8;
        let mut dec = ProtoDecoder::new(s);
        while !dec.eof() && assigned != 3 {
            let (entry_tag, wire) = dec.read_key()?;
            let value = read_value(&mut dec, wire)?;
            match entry_tag {
                1 => {
                    if wire != key_wire {
                        return Err(TranscodeError::InvalidWireType);
                    }
                    values[0] = value;
                    assigned |= 1;
                }
                2 => {
                    if wire != value_wire {
                        return Err(TranscodeError::InvalidWireType);
                    }
                    values[1] = value;
                    assigned |= 2;
                }
                _ => {}
            }
        }

        if assigned & 1 != 0 {
            if key_field.kind == Kind::String {
                write_string_value(j, values[0].s);
            } else {
                j.append_byte(b'"');
                write_scalar(j, key_field.kind, values[0].x);
                j.append_byte(b'"');
            }
        } else if key_field.kind == Kind::String {
            j.append_str("\"\"");
        } else {
            j.append_str("\"0\"");
        }

        j.append_byte(b':');

        if assigned & 2 != 0 {
            match value_field.kind {
                Kind::String => write_string_value(j, values[1].s),
                Kind::Bytes => write_bytes_value(j, values[1].s),
                Kind::Message => {
                    write_message(j, &mut ProtoDecoder::new(values[1].s), value_field.message()?)?
                }
                _ => write_scalar(j, value_field.kind, values[1].x),
            }
        } else {
            write_default(j, value_field.repeated, value_field.kind);
        }

        if p.eof() {
            break;
        }
        let (next_tag, wire) = p.peek_key()?;
        if next_tag != tag {
            break;
        }
        if wire != WireType::LengthDelimited {
            return Err(TranscodeError::InvalidWireType);
        }
        p.read_varint()?; // consume the peeked key
        s = p.read_bytes()?;
    }

    j.append_byte(b'}');
    Ok(())
}

/// Emit a repeated String/Bytes/Message field, one wire record per element.
fn write_repeated<'a>(
    j: &mut JsonBuilder,
    p: &mut ProtoDecoder<'a>,
    field: &Field,
    first: &'a [u8],
) -> Result<()> {
    j.append_byte(b'[');

    let mut s = first;
    let mut more = false;
    loop {
        if more {
            j.append_byte(b',');
        } else {
            more = true;
        }

        match field.kind {
            Kind::String => write_string_value(j, s),
            Kind::Bytes => write_bytes_value(j, s),
            Kind::Message => write_message(j, &mut ProtoDecoder::new(s), field.message()?)?,
            _ => {}
        }

        if p.eof() {
            break;
        }
        let (tag, wire) = p.peek_key()?;
        if tag != field.tag {
            break;
        }
        if wire != WireType::LengthDelimited {
            return Err(TranscodeError::InvalidWireType);
        }
        p.read_varint()?; // consume the peeked key
        s = p.read_bytes()?;
    }

    j.append_byte(b']');
    Ok(())
}

/// Emit a packed scalar record as a JSON array.
fn write_packed(j: &mut JsonBuilder, s: &[u8], field: &Field) -> Result<()> {
    let mut p = ProtoDecoder::new(s);

    j.append_byte(b'[');

    let wire = wire_type_of(field.kind, false);
    let mut more = false;
    while !p.eof() {
        if more {
            j.append_byte(b',');
        } else {
            more = true;
        }
        let value = read_value(&mut p, wire)?;
        write_scalar(j, field.kind, value.x);
    }

    j.append_byte(b']');
    Ok(())
}

fn write_message(j: &mut JsonBuilder, p: &mut ProtoDecoder<'_>, msg: &Message) -> Result<()> {
    j.append_byte(b'{');

    let mut emitted = vec![false; msg.fields.len()];
    let mut more = false;
    while !p.eof() {
        let (tag, wire) = p.read_key()?;
        let value = read_value(p, wire)?;

        let Some(index) = msg.field_index_by_tag(tag) else {
            // unknown fields are dropped, value already consumed
            continue;
        };
        let field = &msg.fields[index];
        if wire_type_of(field.kind, field.repeated) != wire {
            return Err(TranscodeError::InvalidWireType);
        }

        // first value wins for duplicate non-repeated records
        if emitted[index] {
            continue;
        }
        if field.omit == OmitPolicy::Always {
            emitted[index] = true;
            continue;
        }

        if more {
            j.append_byte(b',');
        } else {
            more = true;
        }
        j.append_byte(b'"');
        j.append_str(&field.name);
        j.append_bytes(b"\":");

        if field.repeated {
            match field.kind {
                Kind::String | Kind::Bytes | Kind::Message => {
                    write_repeated(j, p, field, value.s)?
                }
                _ => write_packed(j, value.s, field)?,
            }
        } else if field.kind == Kind::Map {
            write_map(j, p, field.tag, field.message()?, value.s)?;
        } else {
            match field.kind {
                Kind::String => write_string_value(j, value.s),
                Kind::Bytes => write_bytes_value(j, value.s),
                Kind::Message => {
                    write_message(j, &mut ProtoDecoder::new(value.s), field.message()?)?
                }
                _ => write_scalar(j, field.kind, value.x),
            }
        }

        emitted[index] = true;
    }

    for (index, field) in msg.fields.iter().enumerate() {
        if emitted[index] || field.omit != OmitPolicy::Never {
            continue;
        }
        if more {
            j.append_byte(b',');
        } else {
            more = true;
        }
        j.append_byte(b'"');
        j.append_str(&field.name);
        j.append_bytes(b"\":");
        write_default(j, field.repeated, field.kind);
    }

    j.append_byte(b'}');
    Ok(())
}
