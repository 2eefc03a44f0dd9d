// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON schema description loader.
//!
//! Builds baked [`Message`] values from a JSON document describing messages
//! and fields, so schemas can live outside the binary. Messages may
//! reference previously declared messages by name; forward references are
//! rejected, which also keeps the `Arc`-linked schema graph acyclic.
//!
//! ```json
//! {
//!   "messages": [
//!     {
//!       "name": "Simple",
//!       "fields": [
//!         {"name": "name", "kind": "string", "tag": 1, "omit": "empty"},
//!         {"name": "age", "kind": "int32", "tag": 2},
//!         {"name": "tags", "kind": "string", "tag": 3, "repeated": true}
//!       ]
//!     },
//!     {
//!       "name": "Outer",
//!       "fields": [
//!         {"name": "simple", "kind": "message", "tag": 1, "message": "Simple"},
//!         {"name": "counts", "kind": "map", "tag": 2, "key": "string", "value": "int32"}
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::core::{Result, TranscodeError};
use crate::schema::{Field, Kind, Message, OmitPolicy};

#[derive(Debug, Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    messages: Vec<MessageDef>,
}

#[derive(Debug, Deserialize)]
struct MessageDef {
    name: String,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    kind: String,
    tag: u32,
    #[serde(default)]
    repeated: bool,
    /// "never" (default), "empty", or "always"
    #[serde(default)]
    omit: Option<String>,
    /// Referenced message name for kind "message"
    #[serde(default)]
    message: Option<String>,
    /// Key kind for kind "map"
    #[serde(default)]
    key: Option<String>,
    /// Value kind or message name for kind "map"
    #[serde(default)]
    value: Option<String>,
}

/// A set of named, baked, `Arc`-shared messages.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    messages: HashMap<String, Arc<Message>>,
}

impl SchemaSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON schema description into a set of baked messages.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SchemaDoc = serde_json::from_str(json)
            .map_err(|e| TranscodeError::invalid_schema(e.to_string()))?;

        let mut set = SchemaSet::new();
        for def in doc.messages {
            let message = set.build_message(&def)?;
            set.insert(message);
        }
        Ok(set)
    }

    /// Add a message, replacing any previous message of the same name.
    pub fn insert(&mut self, message: Arc<Message>) {
        if self.messages.contains_key(&message.name) {
            warn!(name = %message.name, "replacing duplicate schema message");
        }
        self.messages.insert(message.name.clone(), message);
    }

    /// Look up a message by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Message>> {
        self.messages.get(name)
    }

    /// Number of messages in the set.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate over the messages in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Message>> {
        self.messages.values()
    }

    fn build_message(&self, def: &MessageDef) -> Result<Arc<Message>> {
        let mut fields = Vec::with_capacity(def.fields.len());
        for field_def in &def.fields {
            fields.push(self.build_field(&def.name, field_def)?);
        }
        Ok(Arc::new(Message::new(def.name.clone(), fields, true, true)))
    }

    fn build_field(&self, message_name: &str, def: &FieldDef) -> Result<Field> {
        if def.tag == 0 {
            return Err(TranscodeError::invalid_schema(format!(
                "{message_name}.{}: tag must be positive",
                def.name
            )));
        }
        let kind = Kind::try_from_str(&def.kind).ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{message_name}.{}: unknown kind '{}'",
                def.name, def.kind
            ))
        })?;

        let mut field = Field::new(def.name.clone(), kind, def.tag);
        if def.repeated {
            field = field.repeated();
        }
        if let Some(omit) = &def.omit {
            let policy = OmitPolicy::try_from_str(omit).ok_or_else(|| {
                TranscodeError::invalid_schema(format!(
                    "{message_name}.{}: unknown omit policy '{omit}'",
                    def.name
                ))
            })?;
            field = field.omit(policy);
        }

        match kind {
            Kind::Message => {
                let target = def.message.as_deref().ok_or_else(|| {
                    TranscodeError::invalid_schema(format!(
                        "{message_name}.{}: message fields require a 'message' reference",
                        def.name
                    ))
                })?;
                field = field.with_message(self.resolve(message_name, &def.name, target)?);
            }
            Kind::Map => {
                field = field.with_message(self.build_map_entry(message_name, def)?);
            }
            _ => {}
        }
        Ok(field)
    }

    fn build_map_entry(&self, message_name: &str, def: &FieldDef) -> Result<Arc<Message>> {
        let key = def.key.as_deref().ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{message_name}.{}: map fields require a 'key' kind",
                def.name
            ))
        })?;
        let value = def.value.as_deref().ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{message_name}.{}: map fields require a 'value' kind or message name",
                def.name
            ))
        })?;

        let key_kind = Kind::try_from_str(key).ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{message_name}.{}: unknown map key kind '{key}'",
                def.name
            ))
        })?;
        if key_kind != Kind::String && !key_kind.is_numeric() {
            return Err(TranscodeError::invalid_schema(format!(
                "{message_name}.{}: map keys must be string or numeric, got '{key}'",
                def.name
            )));
        }

        let value_field = match Kind::try_from_str(value) {
            Some(Kind::Map) => {
                return Err(TranscodeError::invalid_schema(format!(
                    "{message_name}.{}: map values cannot be maps",
                    def.name
                )));
            }
            Some(Kind::Message) => {
                return Err(TranscodeError::invalid_schema(format!(
                    "{message_name}.{}: name the value message type directly",
                    def.name
                )));
            }
            Some(value_kind) => Field::new("", value_kind, 2),
            // not a kind name: a reference to a declared message
            None => Field::new("", Kind::Message, 2)
                .with_message(self.resolve(message_name, &def.name, value)?),
        };

        Ok(Arc::new(Message::new(
            "",
            vec![Field::new("", key_kind, 1), value_field],
            true,
            false,
        )))
    }

    fn resolve(&self, message_name: &str, field_name: &str, target: &str) -> Result<Arc<Message>> {
        self.messages.get(target).cloned().ok_or_else(|| {
            TranscodeError::invalid_schema(format!(
                "{message_name}.{field_name}: unknown message '{target}' \
                 (messages must be declared before use)"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DOC: &str = r#"{
        "messages": [
            {
                "name": "Simple",
                "fields": [
                    {"name": "name", "kind": "string", "tag": 1, "omit": "empty"},
                    {"name": "age", "kind": "int32", "tag": 2, "omit": "empty"},
                    {"name": "male", "kind": "bool", "tag": 3, "omit": "always"}
                ]
            },
            {
                "name": "Outer",
                "fields": [
                    {"name": "simple", "kind": "message", "tag": 1, "message": "Simple"},
                    {"name": "counts", "kind": "map", "tag": 2, "key": "string", "value": "int32"},
                    {"name": "items", "kind": "message", "tag": 3, "message": "Simple", "repeated": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_simple_document() {
        let set = SchemaSet::from_json(SIMPLE_DOC).unwrap();
        assert_eq!(set.len(), 2);

        let simple = set.get("Simple").unwrap();
        assert_eq!(simple.fields.len(), 3);
        assert_eq!(simple.field_by_name("name").unwrap().kind, Kind::String);
        assert_eq!(simple.field_by_name("name").unwrap().omit, OmitPolicy::Empty);
        assert_eq!(simple.field_by_name("male").unwrap().omit, OmitPolicy::Always);
        assert_eq!(simple.field_by_tag(2).unwrap().name, "age");
    }

    #[test]
    fn test_message_reference_resolves() {
        let set = SchemaSet::from_json(SIMPLE_DOC).unwrap();
        let outer = set.get("Outer").unwrap();

        let simple = outer.field_by_name("simple").unwrap();
        assert_eq!(simple.kind, Kind::Message);
        assert_eq!(simple.message().unwrap().name, "Simple");

        let items = outer.field_by_name("items").unwrap();
        assert!(items.repeated);
    }

    #[test]
    fn test_map_entry_built() {
        let set = SchemaSet::from_json(SIMPLE_DOC).unwrap();
        let outer = set.get("Outer").unwrap();
        let counts = outer.field_by_name("counts").unwrap();
        assert_eq!(counts.kind, Kind::Map);

        let (key, value) = counts.message().unwrap().map_entry().unwrap();
        assert_eq!(key.kind, Kind::String);
        assert_eq!(value.kind, Kind::Int32);
    }

    #[test]
    fn test_map_value_message_reference() {
        let doc = r#"{
            "messages": [
                {"name": "Inner", "fields": [{"name": "v", "kind": "int32", "tag": 1}]},
                {"name": "M", "fields": [
                    {"name": "m", "kind": "map", "tag": 1, "key": "int32", "value": "Inner"}
                ]}
            ]
        }"#;
        let set = SchemaSet::from_json(doc).unwrap();
        let (_, value) = set
            .get("M")
            .unwrap()
            .field_by_name("m")
            .unwrap()
            .message()
            .unwrap()
            .map_entry()
            .unwrap();
        assert_eq!(value.kind, Kind::Message);
        assert_eq!(value.message().unwrap().name, "Inner");
    }

    #[test]
    fn test_forward_reference_rejected() {
        let doc = r#"{
            "messages": [
                {"name": "M", "fields": [
                    {"name": "later", "kind": "message", "tag": 1, "message": "Later"}
                ]},
                {"name": "Later", "fields": []}
            ]
        }"#;
        assert!(SchemaSet::from_json(doc).is_err());
    }

    #[test]
    fn test_zero_tag_rejected() {
        let doc = r#"{"messages": [{"name": "M", "fields": [
            {"name": "f", "kind": "int32", "tag": 0}
        ]}]}"#;
        assert!(SchemaSet::from_json(doc).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let doc = r#"{"messages": [{"name": "M", "fields": [
            {"name": "f", "kind": "int8", "tag": 1}
        ]}]}"#;
        assert!(SchemaSet::from_json(doc).is_err());
    }

    #[test]
    fn test_bool_map_key_rejected() {
        let doc = r#"{"messages": [{"name": "M", "fields": [
            {"name": "m", "kind": "map", "tag": 1, "key": "bool", "value": "int32"}
        ]}]}"#;
        assert!(SchemaSet::from_json(doc).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(SchemaSet::from_json("{messages").is_err());
    }
}
