// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema ingestion from binary `FileDescriptorSet` data.
//!
//! Builds baked [`Message`] values from the descriptor output of `protoc`
//! (or any tool producing `google.protobuf.FileDescriptorSet`), so the
//! transcoder can be driven by real protobuf schemas without code
//! generation. Enum fields are modeled as `int32` (their wire
//! representation); JSON carries them as numbers. Proto2 groups and
//! recursive message types are rejected.

use std::collections::HashMap;
use std::sync::Arc;

use prost::Message as _;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorSet};
use tracing::debug;

use crate::core::{Result, TranscodeError};
use crate::schema::{Field, Kind, Message, SchemaSet};

/// Decode a binary `FileDescriptorSet` and build a schema set from it.
///
/// Message names in the returned set are fully qualified without the
/// leading dot (for example `test.Simple`). Map entry messages are folded
/// into their owning map fields and not exposed.
pub fn from_descriptor_set_bytes(bytes: &[u8]) -> Result<SchemaSet> {
    let fds = FileDescriptorSet::decode(bytes).map_err(|e| {
        TranscodeError::invalid_schema(format!("failed to decode FileDescriptorSet: {e}"))
    })?;
    from_descriptor_set(&fds)
}

/// Build a schema set from an already decoded `FileDescriptorSet`.
pub fn from_descriptor_set(fds: &FileDescriptorSet) -> Result<SchemaSet> {
    let mut builder = DescriptorBuilder::default();
    for file in &fds.file {
        let package = file.package();
        for proto in &file.message_type {
            builder.register(package, proto);
        }
    }
    debug!(messages = builder.protos.len(), "building schema from descriptor set");
    builder.build_all()
}

#[derive(Default)]
struct DescriptorBuilder<'a> {
    protos: HashMap<String, &'a DescriptorProto>,
    built: HashMap<String, Arc<Message>>,
    /// Stack of messages currently being built, for cycle detection
    building: Vec<String>,
}

fn is_map_entry(proto: &DescriptorProto) -> bool {
    proto
        .options
        .as_ref()
        .and_then(|o| o.map_entry)
        .unwrap_or(false)
}

impl<'a> DescriptorBuilder<'a> {
    fn register(&mut self, prefix: &str, proto: &'a DescriptorProto) {
        let fqn = if prefix.is_empty() {
            proto.name().to_string()
        } else {
            format!("{prefix}.{}", proto.name())
        };
        for nested in &proto.nested_type {
            self.register(&fqn, nested);
        }
        self.protos.insert(fqn, proto);
    }

    fn build_all(mut self) -> Result<SchemaSet> {
        let mut names: Vec<String> = self
            .protos
            .iter()
            .filter(|(_, proto)| !is_map_entry(proto))
            .map(|(fqn, _)| fqn.clone())
            .collect();
        names.sort();

        let mut set = SchemaSet::new();
        for fqn in names {
            let message = self.build(&fqn)?;
            set.insert(message);
        }
        Ok(set)
    }

    fn build(&mut self, fqn: &str) -> Result<Arc<Message>> {
        if let Some(message) = self.built.get(fqn) {
            return Ok(message.clone());
        }
        if self.building.iter().any(|name| name == fqn) {
            return Err(TranscodeError::invalid_schema(format!(
                "recursive message type '{fqn}' is not supported"
            )));
        }
        let Some(proto) = self.protos.get(fqn).copied() else {
            return Err(TranscodeError::invalid_schema(format!(
                "unknown message type '{fqn}'"
            )));
        };

        self.building.push(fqn.to_string());
        let result = self.build_fields(proto);
        self.building.pop();

        let fields = result?;
        let message = Arc::new(Message::new(fqn, fields, true, true));
        self.built.insert(fqn.to_string(), message.clone());
        Ok(message)
    }

    fn build_fields(&mut self, proto: &DescriptorProto) -> Result<Vec<Field>> {
        let mut fields = Vec::with_capacity(proto.field.len());
        for fd in &proto.field {
            fields.push(self.build_field(proto.name(), fd)?);
        }
        Ok(fields)
    }

    fn build_field(&mut self, owner: &str, fd: &FieldDescriptorProto) -> Result<Field> {
        let tag = u32::try_from(fd.number()).ok().filter(|&t| t > 0).ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{owner}.{}: field number {} is not a positive tag",
                fd.name(),
                fd.number()
            ))
        })?;

        let kind = match fd.r#type() {
            Type::Double => Kind::Double,
            Type::Float => Kind::Float,
            Type::Int32 => Kind::Int32,
            Type::Int64 => Kind::Int64,
            Type::Uint32 => Kind::Uint32,
            Type::Uint64 => Kind::Uint64,
            Type::Sint32 => Kind::Sint32,
            Type::Sint64 => Kind::Sint64,
            Type::Fixed32 => Kind::Fixed32,
            Type::Fixed64 => Kind::Fixed64,
            Type::Sfixed32 => Kind::Sfixed32,
            Type::Sfixed64 => Kind::Sfixed64,
            Type::Bool => Kind::Bool,
            Type::String => Kind::String,
            Type::Bytes => Kind::Bytes,
            // enums travel as varints and map to int32 semantics
            Type::Enum => Kind::Int32,
            Type::Message => Kind::Message,
            Type::Group => {
                return Err(TranscodeError::invalid_schema(format!(
                    "{owner}.{}: group fields are not supported",
                    fd.name()
                )));
            }
        };

        let mut field = Field::new(fd.name(), kind, tag);
        if kind == Kind::Message {
            let target = fd.type_name().trim_start_matches('.');
            let entry_is_map = self.protos.get(target).copied().is_some_and(is_map_entry);
            let referenced = self.build(target)?;
            if entry_is_map {
                field.kind = Kind::Map;
                field.nested = Some(referenced);
            } else {
                field.nested = Some(referenced);
                if fd.label() == Label::Repeated {
                    field = field.repeated();
                }
            }
        } else if fd.label() == Label::Repeated {
            field = field.repeated();
        }
        Ok(field)
    }
}
