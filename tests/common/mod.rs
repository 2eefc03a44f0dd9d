// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared schema fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use jsonwire::{Field, Kind, Message, OmitPolicy};

/// Three-field message exercising string/int32/bool with mixed omit
/// policies.
pub fn simple_message() -> Arc<Message> {
    Arc::new(Message::new(
        "Simple",
        vec![
            Field::new("name", Kind::String, 1).omit(OmitPolicy::Empty),
            Field::new("age", Kind::Int32, 2).omit(OmitPolicy::Empty),
            Field::new("male", Kind::Bool, 3).omit(OmitPolicy::Always),
        ],
        true,
        true,
    ))
}

/// Map entry message with the given key and value kinds.
pub fn map_entry(key: Kind, value: Kind, value_ref: Option<Arc<Message>>) -> Arc<Message> {
    let mut value_field = Field::new("", value, 2);
    value_field.nested = value_ref;
    Arc::new(Message::new(
        "",
        vec![Field::new("", key, 1), value_field],
        true,
        true,
    ))
}

/// Twenty-field message covering every kind, including maps, nested
/// messages, and repeated fields.
pub fn complex_message() -> Arc<Message> {
    let simple = simple_message();
    Arc::new(Message::new(
        "Complex",
        vec![
            Field::new("fdouble", Kind::Double, 1),
            Field::new("ffloat", Kind::Float, 2),
            Field::new("fint32", Kind::Int32, 3),
            Field::new("fint64", Kind::Int64, 4),
            Field::new("fuint32", Kind::Uint32, 5),
            Field::new("fuint64", Kind::Uint64, 6),
            Field::new("fsint32", Kind::Sint32, 7),
            Field::new("fsint64", Kind::Sint64, 8),
            Field::new("ffixed32", Kind::Fixed32, 9),
            Field::new("ffixed64", Kind::Fixed64, 10),
            Field::new("fsfixed32", Kind::Sfixed32, 11),
            Field::new("fsfixed64", Kind::Sfixed64, 12),
            Field::new("fbool", Kind::Bool, 13),
            Field::new("fstring", Kind::String, 14),
            Field::new("fbytes", Kind::Bytes, 15),
            Field::new("fmap1", Kind::Map, 16)
                .with_message(map_entry(Kind::String, Kind::Int32, None)),
            Field::new("fmap2", Kind::Map, 17).with_message(map_entry(
                Kind::String,
                Kind::Message,
                Some(simple.clone()),
            )),
            Field::new("fsubmsg", Kind::Message, 18).with_message(simple.clone()),
            Field::new("fint32s", Kind::Int32, 19).repeated(),
            Field::new("fitems", Kind::Message, 20)
                .repeated()
                .with_message(simple),
        ],
        true,
        true,
    ))
}
