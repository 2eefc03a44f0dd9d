// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema-driven transcoding between JSON text and protobuf wire format.
//!
//! Two streaming state machines, one per direction:
//! - [`transcode_to_proto`] - JSON tokens in, wire records out
//! - [`transcode_to_json`] - wire records in, JSON text out
//!
//! Both run against caller-supplied buffers and a read-only schema
//! [`Message`](crate::schema::Message); no intermediate value tree is
//! built. The [`json_to_proto`] and [`proto_to_json`] helpers allocate the
//! output buffer for the common whole-document case.

pub mod json_to_proto;
pub mod proto_to_json;

use tracing::debug;

pub use json_to_proto::transcode_to_proto;
pub use proto_to_json::transcode_to_json;

use crate::core::Result;
use crate::json::{JsonBuilder, JsonLexer};
use crate::schema::Message;
use crate::wire::{ProtoDecoder, ProtoEncoder};

/// Transcode a whole JSON document into protobuf wire bytes.
pub fn json_to_proto(json: &[u8], msg: &Message) -> Result<Vec<u8>> {
    debug!(schema = %msg.name, input_len = json.len(), "transcoding JSON to protobuf");
    let mut encoder = ProtoEncoder::with_capacity(json.len());
    let mut lexer = JsonLexer::new(json);
    transcode_to_proto(&mut encoder, &mut lexer, msg)?;
    Ok(encoder.into_bytes())
}

/// Transcode a whole protobuf message into JSON text bytes.
pub fn proto_to_json(data: &[u8], msg: &Message) -> Result<Vec<u8>> {
    debug!(schema = %msg.name, input_len = data.len(), "transcoding protobuf to JSON");
    let mut builder = JsonBuilder::with_capacity(data.len() * 2);
    let mut decoder = ProtoDecoder::new(data);
    transcode_to_json(&mut builder, &mut decoder, msg)?;
    Ok(builder.into_bytes())
}
