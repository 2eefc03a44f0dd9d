// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # jsonwire
//!
//! Schema-driven streaming transcoder between JSON text and protobuf wire
//! format, without generated code.
//!
//! A schema names fields, assigns wire tags, and declares scalar kinds; the
//! transcoder converts whole documents in either direction without building
//! an intermediate object graph:
//! - **[`json_to_proto`]** - lex JSON, match keys against the schema, emit
//!   wire records
//! - **[`proto_to_json`]** - walk wire records, match tags against the
//!   schema, emit JSON text
//!
//! Schemas can be built in code, loaded from a JSON description
//! ([`schema::SchemaSet::from_json`]), or imported from a binary
//! `FileDescriptorSet` ([`schema::descriptor`]).
//!
//! ## Example
//!
//! ```
//! use jsonwire::schema::{Field, Kind, Message, OmitPolicy};
//! use jsonwire::{json_to_proto, proto_to_json};
//!
//! # fn main() -> Result<(), jsonwire::TranscodeError> {
//! let msg = Message::new(
//!     "Simple",
//!     vec![
//!         Field::new("name", Kind::String, 1).omit(OmitPolicy::Empty),
//!         Field::new("age", Kind::Int32, 2).omit(OmitPolicy::Empty),
//!     ],
//!     true,
//!     true,
//! );
//!
//! let wire = json_to_proto(br#"{"name":"bob","age":23}"#, &msg)?;
//! let json = proto_to_json(&wire, &msg)?;
//! assert_eq!(json, br#"{"name":"bob","age":23}"#);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming API
//!
//! The whole-document helpers wrap the streaming entry points
//! [`transcode::transcode_to_proto`] and [`transcode::transcode_to_json`],
//! which write into caller-owned buffers. Schemas are immutable during
//! transcoding and may be shared across threads once their lookup indexes
//! are baked.

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{Result, TranscodeError};

// Protobuf wire primitives
pub mod wire;

// JSON lexing, escaping, and output building
pub mod json;

// Schema model and ingestion
pub mod schema;

// Transcoding state machines
pub mod transcode;

pub use schema::{Field, Kind, Message, OmitPolicy, SchemaSet};
pub use transcode::{json_to_proto, proto_to_json, transcode_to_json, transcode_to_proto};
