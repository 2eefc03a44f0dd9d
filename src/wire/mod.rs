// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Protobuf wire-format primitives.
//!
//! This module provides the low-level encoder and decoder for the protobuf
//! wire format: varints, zigzag values, fixed-width words, and
//! length-delimited records. [`ProtoEncoder`] appends to a growable buffer;
//! [`ProtoDecoder`] is a cursor over caller-owned bytes.
//!
//! Field keys follow the standard rule `(field_number << 3) | wire_type`.
//! The deprecated group wire types (3 and 4) are never produced and fail
//! decoding.

use crate::core::{Result, TranscodeError};

/// Protobuf wire types used on the wire.
///
/// The discriminants match the low 3 bits of an encoded field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint payload
    Varint = 0,
    /// 8-byte little-endian word
    Fixed64 = 1,
    /// Varint length prefix followed by that many bytes
    LengthDelimited = 2,
    /// 4-byte little-endian word
    Fixed32 = 5,
}

impl WireType {
    /// Decode a wire type from the low 3 bits of a field key.
    ///
    /// Group wire types (3, 4) and the reserved values (6, 7) are rejected.
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            3 | 4 => Err(TranscodeError::wire_parse("group wire types are not supported")),
            _ => Err(TranscodeError::wire_parse(format!("unknown wire type {raw}"))),
        }
    }
}

/// Map a signed value onto the zigzag unsigned encoding.
///
/// Small magnitudes of either sign become small unsigned values, which keeps
/// their varint representation short.
#[inline]
pub fn encode_zigzag(x: i64) -> u64 {
    ((x << 1) ^ (x >> 63)) as u64
}

/// Invert [`encode_zigzag`].
#[inline]
pub fn decode_zigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Append-only protobuf wire encoder over a growable byte buffer.
///
/// `write_*` methods append bare wire values; `emit_*` methods prepend the
/// field key for the given tag. Nested length-delimited records are built by
/// encoding into a scratch `ProtoEncoder` and emitting its bytes, since the
/// length prefix must be known before the payload is framed.
#[derive(Debug, Default)]
pub struct ProtoEncoder {
    buf: Vec<u8>,
}

impl ProtoEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create an encoder with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop all written bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// View the encoded bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hand over the encoded buffer, leaving the encoder empty.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append raw bytes with no framing.
    pub fn write_bytes(&mut self, s: &[u8]) {
        self.buf.extend_from_slice(s);
    }

    /// Append a base-128 varint.
    pub fn write_varint(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v & 0x7F) as u8 | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    /// Append a zigzag-encoded signed value as a varint.
    pub fn write_zigzag(&mut self, x: i64) {
        self.write_varint(encode_zigzag(x));
    }

    /// Append a 4-byte little-endian word.
    pub fn write_fixed32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Append an 8-byte little-endian word.
    pub fn write_fixed64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_key(&mut self, tag: u32, wire: WireType) {
        self.write_varint(u64::from(tag) << 3 | u64::from(wire as u8));
    }

    /// Emit a varint record for `tag`.
    pub fn emit_varint(&mut self, tag: u32, v: u64) {
        self.write_key(tag, WireType::Varint);
        self.write_varint(v);
    }

    /// Emit a zigzag varint record for `tag`.
    pub fn emit_zigzag(&mut self, tag: u32, x: i64) {
        self.write_key(tag, WireType::Varint);
        self.write_zigzag(x);
    }

    /// Emit a fixed32 record for `tag`.
    pub fn emit_fixed32(&mut self, tag: u32, v: u32) {
        self.write_key(tag, WireType::Fixed32);
        self.write_fixed32(v);
    }

    /// Emit a fixed64 record for `tag`.
    pub fn emit_fixed64(&mut self, tag: u32, v: u64) {
        self.write_key(tag, WireType::Fixed64);
        self.write_fixed64(v);
    }

    /// Emit a length-delimited record for `tag`.
    pub fn emit_bytes(&mut self, tag: u32, s: &[u8]) {
        self.write_key(tag, WireType::LengthDelimited);
        self.write_varint(s.len() as u64);
        self.buf.extend_from_slice(s);
    }

    /// Emit a length-delimited record for `tag` from UTF-8 text.
    pub fn emit_str(&mut self, tag: u32, s: &str) {
        self.emit_bytes(tag, s.as_bytes());
    }
}

/// Cursor-based protobuf wire decoder over borrowed bytes.
///
/// Reads never copy: length-delimited payloads are returned as sub-slices of
/// the input buffer. A failed read leaves the cursor unspecified and the
/// whole transcoding call is expected to abort.
#[derive(Debug)]
pub struct ProtoDecoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ProtoDecoder<'a> {
    /// Create a decoder over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Check whether the cursor has consumed all input.
    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Current cursor position in bytes.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read a base-128 varint, up to 10 bytes.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        let mut pos = self.pos;
        loop {
            let Some(&byte) = self.buf.get(pos) else {
                return Err(TranscodeError::wire_parse("truncated varint"));
            };
            pos += 1;
            if shift == 63 && byte > 1 {
                return Err(TranscodeError::wire_parse("varint overflows 64 bits"));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(TranscodeError::wire_parse("varint overflows 64 bits"));
            }
        }
        self.pos = pos;
        Ok(value)
    }

    /// Read a zigzag-encoded varint as a signed value.
    pub fn read_zigzag(&mut self) -> Result<i64> {
        Ok(decode_zigzag(self.read_varint()?))
    }

    /// Decode the field key at the cursor without advancing.
    pub fn peek_key(&self) -> Result<(u32, WireType)> {
        let mut probe = ProtoDecoder {
            buf: self.buf,
            pos: self.pos,
        };
        probe.read_key()
    }

    /// Read a field key, returning the tag and wire type.
    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let v = self.read_varint()?;
        let wire = WireType::from_raw((v & 0x07) as u8)?;
        Ok(((v >> 3) as u32, wire))
    }

    /// Read a 4-byte little-endian word.
    pub fn read_fixed32(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        let Some(bytes) = self.buf.get(self.pos..end) else {
            return Err(TranscodeError::wire_parse("truncated fixed32"));
        };
        self.pos = end;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an 8-byte little-endian word.
    pub fn read_fixed64(&mut self) -> Result<u64> {
        let end = self.pos + 8;
        let Some(bytes) = self.buf.get(self.pos..end) else {
            return Err(TranscodeError::wire_parse("truncated fixed64"));
        };
        self.pos = end;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a length-delimited payload as a sub-slice of the input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| TranscodeError::wire_parse("length prefix overflows usize"))?;
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| TranscodeError::wire_parse("length prefix overflows usize"))?;
        let Some(bytes) = self.buf.get(self.pos..end) else {
            return Err(TranscodeError::wire_parse("truncated length-delimited record"));
        };
        self.pos = end;
        Ok(bytes)
    }
}
