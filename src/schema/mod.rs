// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema model driving both transcoding directions.
//!
//! A [`Message`] is an ordered list of [`Field`] descriptors plus optional
//! lookup indexes. Schemas are built once (by hand, through the JSON
//! [`loader`], or from a binary `FileDescriptorSet` via [`descriptor`]) and
//! then shared read-only across transcoding calls. Baking the indexes
//! mutates the message and must happen before it is shared.

pub mod descriptor;
pub mod loader;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Result, TranscodeError};
use crate::wire::WireType;

pub use loader::SchemaSet;

/// Scalar and structural field kinds.
///
/// The twelve numeric kinds from `Double` through `Sfixed64` form a
/// contiguous band tested by [`Kind::is_numeric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// 64-bit IEEE 754, fixed64 on the wire
    Double = 0,
    /// 32-bit IEEE 754, fixed32 on the wire
    Float,
    /// Signed varint
    Int32,
    /// Signed varint
    Int64,
    /// Unsigned varint
    Uint32,
    /// Unsigned varint
    Uint64,
    /// Zigzag varint
    Sint32,
    /// Zigzag varint
    Sint64,
    /// Unsigned fixed32
    Fixed32,
    /// Unsigned fixed64
    Fixed64,
    /// Signed fixed32
    Sfixed32,
    /// Signed fixed64
    Sfixed64,
    /// Varint 0/1
    Bool,
    /// Length-delimited UTF-8 text
    String,
    /// Length-delimited binary, base64 in JSON
    Bytes,
    /// Length-delimited map entries (key tag 1, value tag 2)
    Map,
    /// Length-delimited nested message
    Message,
}

impl Kind {
    /// Check membership in the numeric band (`Double` through `Sfixed64`).
    #[inline]
    pub fn is_numeric(self) -> bool {
        (self as u8) <= (Kind::Sfixed64 as u8)
    }

    /// Parse a kind from its lowercase protobuf spelling.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "double" => Some(Kind::Double),
            "float" => Some(Kind::Float),
            "int32" => Some(Kind::Int32),
            "int64" => Some(Kind::Int64),
            "uint32" => Some(Kind::Uint32),
            "uint64" => Some(Kind::Uint64),
            "sint32" => Some(Kind::Sint32),
            "sint64" => Some(Kind::Sint64),
            "fixed32" => Some(Kind::Fixed32),
            "fixed64" => Some(Kind::Fixed64),
            "sfixed32" => Some(Kind::Sfixed32),
            "sfixed64" => Some(Kind::Sfixed64),
            "bool" => Some(Kind::Bool),
            "string" => Some(Kind::String),
            "bytes" => Some(Kind::Bytes),
            "map" => Some(Kind::Map),
            "message" => Some(Kind::Message),
            _ => None,
        }
    }

    /// Get the lowercase spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Double => "double",
            Kind::Float => "float",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Sint32 => "sint32",
            Kind::Sint64 => "sint64",
            Kind::Fixed32 => "fixed32",
            Kind::Fixed64 => "fixed64",
            Kind::Sfixed32 => "sfixed32",
            Kind::Sfixed64 => "sfixed64",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Map => "map",
            Kind::Message => "message",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected wire type for a field of the given kind.
///
/// Repeated fields and the length-delimited kinds (String, Bytes, Map,
/// Message) always arrive as length-delimited records; repeated scalars must
/// be packed.
pub fn wire_type_of(kind: Kind, repeated: bool) -> WireType {
    if repeated {
        return WireType::LengthDelimited;
    }
    match kind {
        Kind::Double | Kind::Fixed64 | Kind::Sfixed64 => WireType::Fixed64,
        Kind::Float | Kind::Fixed32 | Kind::Sfixed32 => WireType::Fixed32,
        Kind::Int32
        | Kind::Int64
        | Kind::Uint32
        | Kind::Uint64
        | Kind::Sint32
        | Kind::Sint64
        | Kind::Bool => WireType::Varint,
        Kind::String | Kind::Bytes | Kind::Map | Kind::Message => WireType::LengthDelimited,
    }
}

/// Per-field rule controlling suppression of values and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OmitPolicy {
    /// Emit the field whenever present; materialize its default in JSON
    /// output when absent
    #[default]
    Never,
    /// Suppress empty string/bytes bodies on JSON input; no default in JSON
    /// output
    Empty,
    /// Drop the field in both directions, even when a value is present
    Always,
}

impl OmitPolicy {
    /// Parse a policy from its loader spelling.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "never" => Some(OmitPolicy::Never),
            "empty" => Some(OmitPolicy::Empty),
            "always" => Some(OmitPolicy::Always),
            _ => None,
        }
    }
}

/// A single field descriptor.
#[derive(Debug, Clone)]
pub struct Field {
    /// Name matched against JSON object keys
    pub name: String,
    /// Scalar or structural kind
    pub kind: Kind,
    /// Referenced message for Map (the entry) and Message kinds
    pub nested: Option<Arc<Message>>,
    /// Protobuf field number, positive
    pub tag: u32,
    /// Whether the field is repeated
    pub repeated: bool,
    /// Value/default suppression rule
    pub omit: OmitPolicy,
}

impl Field {
    /// Create a scalar field with default flags.
    pub fn new(name: impl Into<String>, kind: Kind, tag: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            nested: None,
            tag,
            repeated: false,
            omit: OmitPolicy::Never,
        }
    }

    /// Mark the field repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Set the omit policy.
    pub fn omit(mut self, omit: OmitPolicy) -> Self {
        self.omit = omit;
        self
    }

    /// Attach the referenced message (entry message for Map kinds).
    pub fn with_message(mut self, message: Arc<Message>) -> Self {
        self.nested = Some(message);
        self
    }

    /// The referenced message, or `InvalidSchema` when the schema is
    /// missing one for a Map/Message field.
    pub fn message(&self) -> Result<&Message> {
        self.nested.as_deref().ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "field '{}' of kind {} has no message reference",
                self.name, self.kind
            ))
        })
    }
}

/// Tag lookup structure, chosen by tag density at bake time.
#[derive(Debug, Clone)]
enum TagIndex {
    /// tag -> field index, -1 for absent; used when tags are dense
    Dense(Vec<i32>),
    /// field indices sorted by tag for binary search; used when sparse
    Sorted(Vec<usize>),
}

/// A named ordered sequence of fields with optional lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Message name (diagnostic only; lookups go through [`SchemaSet`])
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Field>,
    tag_index: Option<TagIndex>,
    name_index: Option<HashMap<String, usize>>,
}

impl Message {
    /// Create a message, optionally baking the lookup indexes.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<Field>,
        index_tags: bool,
        index_names: bool,
    ) -> Self {
        let mut msg = Self {
            name: name.into(),
            fields,
            tag_index: None,
            name_index: None,
        };
        if index_tags {
            msg.bake_tag_index();
        }
        if index_names {
            msg.bake_name_index();
        }
        msg
    }

    /// Precompute the tag lookup index.
    ///
    /// When the maximum tag is small relative to the field count the index
    /// is a dense array; otherwise it is a permutation of field indices
    /// sorted by tag. Must be called before the message is shared.
    pub fn bake_tag_index(&mut self) {
        let max_tag = self.fields.iter().map(|f| f.tag).max().unwrap_or(0);
        let n = self.fields.len();
        if (max_tag as usize) < n + n / 4 + 3 {
            let mut dense = vec![-1i32; max_tag as usize + 1];
            for (i, field) in self.fields.iter().enumerate() {
                dense[field.tag as usize] = i as i32;
            }
            self.tag_index = Some(TagIndex::Dense(dense));
        } else {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by_key(|&i| self.fields[i].tag);
            self.tag_index = Some(TagIndex::Sorted(order));
        }
    }

    /// Precompute the name lookup index. Must be called before the message
    /// is shared.
    pub fn bake_name_index(&mut self) {
        let mut names = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            names.insert(field.name.clone(), i);
        }
        self.name_index = Some(names);
    }

    /// Find the index of the field with the given tag.
    pub fn field_index_by_tag(&self, tag: u32) -> Option<usize> {
        match &self.tag_index {
            Some(TagIndex::Dense(dense)) => dense
                .get(tag as usize)
                .and_then(|&i| usize::try_from(i).ok()),
            Some(TagIndex::Sorted(order)) => order
                .binary_search_by_key(&tag, |&i| self.fields[i].tag)
                .ok()
                .map(|pos| order[pos]),
            None => self.fields.iter().position(|f| f.tag == tag),
        }
    }

    /// Find the field with the given tag.
    pub fn field_by_tag(&self, tag: u32) -> Option<&Field> {
        self.field_index_by_tag(tag).map(|i| &self.fields[i])
    }

    /// Find the field with the given name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        match &self.name_index {
            Some(names) => names.get(name).map(|&i| &self.fields[i]),
            None => self.fields.iter().find(|f| f.name == name),
        }
    }

    /// The key (tag 1) and value (tag 2) fields of a map entry message.
    pub(crate) fn map_entry(&self) -> Result<(&Field, &Field)> {
        let key = self.field_by_tag(1);
        let value = self.field_by_tag(2);
        match (key, value) {
            (Some(key), Some(value)) => Ok((key, value)),
            _ => Err(TranscodeError::invalid_schema(format!(
                "map entry message '{}' is missing its key or value field",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse_message() -> Message {
        Message::new(
            "Sparse",
            vec![
                Field::new("a", Kind::Int32, 1),
                Field::new("b", Kind::Int32, 10),
                Field::new("c", Kind::Int32, 11),
                Field::new("d", Kind::Int32, 20),
            ],
            false,
            false,
        )
    }

    #[test]
    fn test_numeric_band() {
        assert!(Kind::Double.is_numeric());
        assert!(Kind::Sfixed64.is_numeric());
        assert!(Kind::Fixed32.is_numeric());
        assert!(!Kind::Bool.is_numeric());
        assert!(!Kind::String.is_numeric());
        assert!(!Kind::Message.is_numeric());
    }

    #[test]
    fn test_kind_str_round_trip() {
        for kind in [
            Kind::Double,
            Kind::Float,
            Kind::Int32,
            Kind::Int64,
            Kind::Uint32,
            Kind::Uint64,
            Kind::Sint32,
            Kind::Sint64,
            Kind::Fixed32,
            Kind::Fixed64,
            Kind::Sfixed32,
            Kind::Sfixed64,
            Kind::Bool,
            Kind::String,
            Kind::Bytes,
            Kind::Map,
            Kind::Message,
        ] {
            assert_eq!(Kind::try_from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(Kind::try_from_str("int8"), None);
    }

    #[test]
    fn test_wire_type_of() {
        assert_eq!(wire_type_of(Kind::Double, false), WireType::Fixed64);
        assert_eq!(wire_type_of(Kind::Float, false), WireType::Fixed32);
        assert_eq!(wire_type_of(Kind::Int32, false), WireType::Varint);
        assert_eq!(wire_type_of(Kind::Sint64, false), WireType::Varint);
        assert_eq!(wire_type_of(Kind::Sfixed32, false), WireType::Fixed32);
        assert_eq!(wire_type_of(Kind::Bool, false), WireType::Varint);
        assert_eq!(wire_type_of(Kind::String, false), WireType::LengthDelimited);
        assert_eq!(wire_type_of(Kind::Map, false), WireType::LengthDelimited);
        // repeated scalars are packed
        assert_eq!(wire_type_of(Kind::Int32, true), WireType::LengthDelimited);
    }

    #[test]
    fn test_lookup_without_indexes() {
        let msg = sparse_message();
        for (tag, name) in [(1, "a"), (10, "b"), (11, "c"), (20, "d")] {
            let by_tag = msg.field_by_tag(tag).map(|f| f.name.as_str());
            let by_name = msg.field_by_name(name).map(|f| f.name.as_str());
            assert_eq!(by_tag, by_name);
            assert_eq!(by_tag, Some(name));
        }
        assert!(msg.field_by_tag(12).is_none());
        assert!(msg.field_by_name("e").is_none());
    }

    #[test]
    fn test_sparse_tag_index_uses_binary_search() {
        let mut msg = sparse_message();
        msg.bake_tag_index();
        assert_eq!(msg.field_index_by_tag(1), Some(0));
        assert_eq!(msg.field_index_by_tag(10), Some(1));
        assert_eq!(msg.field_index_by_tag(11), Some(2));
        assert_eq!(msg.field_index_by_tag(20), Some(3));
        assert_eq!(msg.field_index_by_tag(12), None);
        assert_eq!(msg.field_index_by_tag(0), None);
    }

    #[test]
    fn test_dense_tag_index() {
        let mut msg = Message::new(
            "Dense",
            vec![
                Field::new("a", Kind::Int32, 1),
                Field::new("b", Kind::Int32, 2),
                Field::new("c", Kind::Int32, 4),
            ],
            false,
            false,
        );
        msg.bake_tag_index();
        assert_eq!(msg.field_index_by_tag(1), Some(0));
        assert_eq!(msg.field_index_by_tag(2), Some(1));
        assert_eq!(msg.field_index_by_tag(3), None);
        assert_eq!(msg.field_index_by_tag(4), Some(2));
        assert_eq!(msg.field_index_by_tag(100), None);
    }

    #[test]
    fn test_name_index() {
        let mut msg = sparse_message();
        msg.bake_name_index();
        assert_eq!(msg.field_by_name("c").map(|f| f.tag), Some(11));
        assert!(msg.field_by_name("missing").is_none());
    }

    #[test]
    fn test_map_entry_accessor() {
        let entry = Message::new(
            "",
            vec![
                Field::new("", Kind::String, 1),
                Field::new("", Kind::Int32, 2),
            ],
            true,
            false,
        );
        let (key, value) = entry.map_entry().unwrap();
        assert_eq!(key.kind, Kind::String);
        assert_eq!(value.kind, Kind::Int32);

        let broken = Message::new("", vec![Field::new("", Kind::String, 1)], true, false);
        assert!(broken.map_entry().is_err());
    }

    #[test]
    fn test_field_message_accessor() {
        let inner = Arc::new(Message::new("Inner", vec![], true, true));
        let field = Field::new("m", Kind::Message, 1).with_message(inner);
        assert_eq!(field.message().unwrap().name, "Inner");

        let missing = Field::new("m", Kind::Message, 1);
        assert!(missing.message().is_err());
    }

    #[test]
    fn test_omit_policy_parse() {
        assert_eq!(OmitPolicy::try_from_str("never"), Some(OmitPolicy::Never));
        assert_eq!(OmitPolicy::try_from_str("empty"), Some(OmitPolicy::Empty));
        assert_eq!(OmitPolicy::try_from_str("always"), Some(OmitPolicy::Always));
        assert_eq!(OmitPolicy::try_from_str("sometimes"), None);
    }
}
