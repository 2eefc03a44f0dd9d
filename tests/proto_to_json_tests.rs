// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Integration tests for the protobuf to JSON direction, plus whole-loop
//! round trips.

mod common;

use common::{complex_message, simple_message};
use jsonwire::{json_to_proto, proto_to_json, Field, Kind, Message, TranscodeError};

fn transcode_json(proto_hex: &str, msg: &Message) -> String {
    let data = hex::decode(proto_hex).unwrap();
    String::from_utf8(proto_to_json(&data, msg).unwrap()).unwrap()
}

#[test]
fn test_simple_message() {
    let msg = simple_message();
    assert_eq!(
        transcode_json("0a03626f6210171801", &msg),
        r#"{"name":"bob","age":23}"#
    );
}

#[test]
fn test_empty_input_emits_only_never_defaults() {
    // name/age omit-empty, male omit-always: nothing materializes
    let msg = simple_message();
    assert_eq!(transcode_json("", &msg), "{}");
}

#[test]
fn test_complex_message() {
    let proto = concat!(
        "090000000000c05e40150000f642187b207b287b307b38f60140f6014d7b000000",
        "517b000000000000005d7b000000617b00000000000000680172036f6b6b7a0301",
        "02038201050a016b10018a010e0a017512090a03616263101718018a01050a0176",
        "12009201090a03656667101718019a0103010203a201090a03616263100c1801a2",
        "0100a201070a036566671017"
    );
    let want = concat!(
        r#"{"fdouble":123,"ffloat":123,"fint32":123,"fint64":123,"fuint32":123,"#,
        r#""fuint64":123,"fsint32":123,"fsint64":123,"ffixed32":123,"ffixed64":123,"#,
        r#""fsfixed32":123,"fsfixed64":123,"fbool":true,"fstring":"okk","fbytes":"AQID","#,
        r#""fmap1":{"k":1},"fmap2":{"u":{"name":"abc","age":23},"v":{}},"#,
        r#""fsubmsg":{"name":"efg","age":23},"fint32s":[1,2,3],"#,
        r#""fitems":[{"name":"abc","age":12},{},{"name":"efg","age":23}]}"#
    );
    assert_eq!(transcode_json(proto, &complex_message()), want);
}

#[test]
fn test_all_defaults_in_declaration_order() {
    let want = concat!(
        r#"{"fdouble":0,"ffloat":0,"fint32":0,"fint64":0,"fuint32":0,"fuint64":0,"#,
        r#""fsint32":0,"fsint64":0,"ffixed32":0,"ffixed64":0,"fsfixed32":0,"#,
        r#""fsfixed64":0,"fbool":false,"fstring":"","fbytes":"","fmap1":{},"#,
        r#""fmap2":{},"fsubmsg":{},"fint32s":[],"fitems":[]}"#
    );
    assert_eq!(transcode_json("", &complex_message()), want);
}

#[test]
fn test_output_is_valid_json() {
    let proto = concat!(
        "090000000000c05e40150000f642187b207b287b307b38f60140f6014d7b000000",
        "517b000000000000005d7b000000617b00000000000000680172036f6b6b7a0301",
        "02038201050a016b10018a010e0a017512090a03616263101718018a01050a0176",
        "12009201090a03656667101718019a0103010203a201090a03616263100c1801a2",
        "0100a201070a036566671017"
    );
    let text = transcode_json(proto, &complex_message());
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["fstring"], "okk");
    assert_eq!(value["fint32s"], serde_json::json!([1, 2, 3]));
    assert_eq!(value["fmap1"]["k"], 1);
}

#[test]
fn test_packed_array() {
    let msg = Message::new(
        "M",
        vec![Field::new("v", Kind::Int32, 1).repeated()],
        true,
        true,
    );
    assert_eq!(transcode_json("0a047bc8039506", &msg), r#"{"v":[123,456,789]}"#);
}

#[test]
fn test_unknown_tags_skipped() {
    let msg = simple_message();
    // leading tag-9 varint and trailing tag-8 fixed32 are not in the schema
    assert_eq!(
        transcode_json("48040a03626f621017450a000000", &msg),
        r#"{"name":"bob","age":23}"#
    );
}

#[test]
fn test_round_trip_integers() {
    let msg = Message::new(
        "M",
        vec![
            Field::new("a", Kind::Int32, 1),
            Field::new("b", Kind::Sint64, 2),
            Field::new("c", Kind::Fixed32, 3),
        ],
        true,
        true,
    );
    for json in [
        r#"{"a":-123,"b":456,"c":789}"#,
        r#"{"a":2147483647,"b":-9223372036854775808,"c":4294967295}"#,
    ] {
        let wire = json_to_proto(json.as_bytes(), &msg).unwrap();
        let back = String::from_utf8(proto_to_json(&wire, &msg).unwrap()).unwrap();
        assert_eq!(back, json);
    }

    // literal zero goes absent on the wire and comes back via defaults
    let wire = json_to_proto(br#"{"a":0,"b":0,"c":0}"#, &msg).unwrap();
    assert!(wire.is_empty());
    let back = String::from_utf8(proto_to_json(&wire, &msg).unwrap()).unwrap();
    assert_eq!(back, r#"{"a":0,"b":0,"c":0}"#);
}

#[test]
fn test_round_trip_packed_array_identity() {
    let msg = Message::new(
        "M",
        vec![Field::new("v", Kind::Sint32, 1).repeated()],
        true,
        true,
    );
    let wire = json_to_proto(br#"{"v":[0,-1,2,-3]}"#, &msg).unwrap();
    let json = String::from_utf8(proto_to_json(&wire, &msg).unwrap()).unwrap();
    assert_eq!(json, r#"{"v":[0,-1,2,-3]}"#);
    let wire_again = json_to_proto(json.as_bytes(), &msg).unwrap();
    assert_eq!(wire, wire_again);
}

#[test]
fn test_round_trip_complex() {
    let msg = complex_message();
    let json = concat!(
        r#"{"fdouble":1.25,"ffloat":-0.5,"fint32":-7,"fint64":8,"fuint32":9,"#,
        r#""fuint64":10,"fsint32":-11,"fsint64":12,"ffixed32":13,"ffixed64":14,"#,
        r#""fsfixed32":-15,"fsfixed64":16,"fbool":true,"fstring":"hi","fbytes":"AQID","#,
        r#""fmap1":{"k":1},"fmap2":{"u":{"name":"abc","age":23}},"#,
        r#""fsubmsg":{"name":"efg","age":23},"fint32s":[1,2,3],"#,
        r#""fitems":[{"name":"abc","age":12}]}"#
    );
    let wire = json_to_proto(json.as_bytes(), &msg).unwrap();
    let back = String::from_utf8(proto_to_json(&wire, &msg).unwrap()).unwrap();
    assert_eq!(back, json);
}

#[test]
fn test_float_formatting_is_shortest_round_trip() {
    let msg = Message::new(
        "M",
        vec![
            Field::new("d", Kind::Double, 1),
            Field::new("f", Kind::Float, 2),
        ],
        true,
        true,
    );
    let wire = json_to_proto(br#"{"d":1.23,"f":1.23}"#, &msg).unwrap();
    let back = String::from_utf8(proto_to_json(&wire, &msg).unwrap()).unwrap();
    assert_eq!(back, r#"{"d":1.23,"f":1.23}"#);
}

#[test]
fn test_groups_rejected() {
    let msg = simple_message();
    // tag 1 with wire type 3 (start group)
    let err = proto_to_json(&[0x0B], &msg).unwrap_err();
    assert!(matches!(err, TranscodeError::WireParse { .. }));
}

#[test]
fn test_wire_type_mismatch() {
    let msg = simple_message();
    // name (tag 1, string) arriving as fixed32
    let err = proto_to_json(&hex::decode("0d7b000000").unwrap(), &msg).unwrap_err();
    assert_eq!(err, TranscodeError::InvalidWireType);
}

#[test]
fn test_truncated_input() {
    let msg = simple_message();
    assert!(proto_to_json(&hex::decode("0a05616263").unwrap(), &msg).is_err());
    assert!(proto_to_json(&hex::decode("10").unwrap(), &msg).is_err());
}
