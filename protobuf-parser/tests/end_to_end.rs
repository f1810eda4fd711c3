//! End-to-end scenarios tying together schema parsing, message binding, and
//! the wire codec, one test per literal scenario in `SPEC_FULL.md` §8.

use protobuf::any::Any;
use protobuf::any::AnyBackend;
use protobuf::message::decode_definition_for;
use protobuf::message::DynamicMessage;
use protobuf::reflect::ReflectValueBox;
use protobuf_parser::importer::parse_standalone;

fn construct(
    schema: &protobuf::reflect::Schema,
    message_name: &str,
    kwargs: Vec<(&str, ReflectValueBox)>,
) -> DynamicMessage {
    let descriptor = schema.message_by_name(message_name).unwrap().clone();
    DynamicMessage::construct(descriptor, kwargs).unwrap()
}

fn round_trip(schema: &protobuf::reflect::Schema, message_name: &str, message: &DynamicMessage) -> DynamicMessage {
    let dict = message.to_wire_dict().unwrap();
    let bytes = protobuf::wire::encode(&dict, false).unwrap();
    let descriptor = schema.message_by_name(message_name).unwrap().clone();
    let definition = decode_definition_for(&descriptor);
    let decoded = protobuf::wire::decode(&bytes, Some(&definition)).unwrap();
    DynamicMessage::from_decoded_dict(descriptor, &decoded).unwrap()
}

/// 1. Basic parse + round-trip.
#[test]
fn basic_parse_and_round_trip() {
    let schema = parse_standalone(
        r#"
        syntax = "proto2";
        message Example {
            optional float a = 1;
            optional Sub b = 2;
        }
        message Sub {
            optional int32 x = 13;
            required int32 y = 14;
        }
        "#,
    )
    .unwrap();

    let sub_descriptor = schema.message_by_name("Sub").unwrap().clone();
    let sub = DynamicMessage::construct(
        sub_descriptor,
        vec![("x", ReflectValueBox::I32(1)), ("y", ReflectValueBox::I32(2))],
    )
    .unwrap();

    let example = construct(
        &schema,
        "Example",
        vec![
            ("a", ReflectValueBox::F32(1.0)),
            ("b", ReflectValueBox::Message(Box::new(sub))),
        ],
    );

    let round_tripped = round_trip(&schema, "Example", &example);
    assert_eq!(round_tripped, example);
}

/// 2. Repeated packed.
#[test]
fn repeated_packed_round_trip() {
    let schema = parse_standalone(
        r#"
        message E {
            repeated int32 r = 2 [packed=true];
        }
        "#,
    )
    .unwrap();

    let e = construct(
        &schema,
        "E",
        vec![
            ("r", ReflectValueBox::I32(1)),
            ("r", ReflectValueBox::I32(2)),
            ("r", ReflectValueBox::I32(3)),
            ("r", ReflectValueBox::I32(4)),
            ("r", ReflectValueBox::I32(5)),
        ],
    );

    let lifted = round_trip(&schema, "E", &e);

    let values: Vec<i32> = lifted
        .repeated("r")
        .unwrap()
        .iter()
        .map(|v| match v {
            ReflectValueBox::I32(n) => *n,
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
    assert_eq!(lifted, e);
}

/// 3. Oneof displacement.
#[test]
fn oneof_displacement() {
    let schema = parse_standalone(
        r#"
        message E {
            oneof o {
                int32 a = 13;
                int32 b = 14;
            }
        }
        "#,
    )
    .unwrap();

    let e = construct(
        &schema,
        "E",
        vec![("a", ReflectValueBox::I32(1)), ("b", ReflectValueBox::I32(2))],
    );

    assert_eq!(e.get_field("a").unwrap(), ReflectValueBox::I32(0));
    assert_eq!(e.get_field("b").unwrap(), ReflectValueBox::I32(2));
    assert!(!e.has_field("a").unwrap());
}

/// 4. Default value elision.
#[test]
fn default_value_elision() {
    let schema = parse_standalone(
        r#"
        message E {
            required float a = 1 [default=1.0];
        }
        "#,
    )
    .unwrap();

    let e = construct(&schema, "E", vec![]);
    assert_eq!(e.get_field("a").unwrap(), ReflectValueBox::F32(1.0));

    let lifted = round_trip(&schema, "E", &e);
    assert_eq!(lifted, e);
}

/// 5. Map with sub-message.
#[test]
fn map_with_submessage_round_trip() {
    let schema = parse_standalone(
        r#"
        message E {
            map<int32, Sub> m = 2;
        }
        message Sub {
            optional int32 x = 13;
            required int32 y = 14;
        }
        "#,
    )
    .unwrap();

    let sub_descriptor = schema.message_by_name("Sub").unwrap().clone();
    let sub1 = DynamicMessage::construct(
        sub_descriptor.clone(),
        vec![("x", ReflectValueBox::I32(1)), ("y", ReflectValueBox::I32(2))],
    )
    .unwrap();
    let sub2 = DynamicMessage::construct(
        sub_descriptor,
        vec![("x", ReflectValueBox::I32(3)), ("y", ReflectValueBox::I32(4))],
    )
    .unwrap();

    let e_descriptor = schema.message_by_name("E").unwrap().clone();
    let mut e = DynamicMessage::new(e_descriptor);
    e.map_insert("m", ReflectValueBox::I32(1), ReflectValueBox::Message(Box::new(sub1)))
        .unwrap();
    e.map_insert("m", ReflectValueBox::I32(2), ReflectValueBox::Message(Box::new(sub2)))
        .unwrap();

    let lifted = round_trip(&schema, "E", &e);

    assert_eq!(lifted.map_entries("m").unwrap().len(), 2);
    assert_eq!(lifted, e);
}

/// 6. Any round-trip, pickle backend.
#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
struct PackedObj {
    value: i64,
    value_2: f64,
    value_3: String,
    value_4: Vec<u8>,
    value_5: bool,
}

#[test]
fn any_round_trip_pickle_backend() {
    let schema = parse_standalone(
        r#"
        import "google/protobuf/any.proto";
        message Example {
            optional google.protobuf.Any example_any = 1;
        }
        "#,
    )
    .unwrap();

    let obj = PackedObj {
        value: 1,
        value_2: 2.0,
        value_3: "test".to_owned(),
        value_4: b"test".to_vec(),
        value_5: true,
    };

    let any = protobuf::any::pack(
        "type.googleapis.com/Example".to_owned(),
        &obj,
        AnyBackend::Pickle,
    )
    .unwrap();
    assert_eq!(any.type_url, "type.googleapis.com/Example");

    let any_descriptor = schema.message_by_name("google.protobuf.Any").unwrap().clone();
    let mut any_message = DynamicMessage::new(any_descriptor);
    any_message
        .set_field("value", ReflectValueBox::Bytes(any.value.clone()))
        .unwrap();

    let example = construct(
        &schema,
        "Example",
        vec![("example_any", ReflectValueBox::Message(Box::new(any_message)))],
    );

    let lifted = round_trip(&schema, "Example", &example);

    let lifted_any = match lifted.get_field("example_any").unwrap() {
        ReflectValueBox::Message(m) => *m,
        other => panic!("unexpected {:?}", other),
    };
    let type_url = match lifted_any.get_field("type_url").unwrap() {
        ReflectValueBox::String(s) => s,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(type_url, "type.googleapis.com/Example");

    let value_bytes = match lifted_any.get_field("value").unwrap() {
        ReflectValueBox::Bytes(b) => b,
        other => panic!("unexpected {:?}", other),
    };
    let reconstructed = Any {
        type_url,
        value: value_bytes,
    };
    let unpacked: PackedObj = protobuf::any::unpack(&reconstructed, AnyBackend::Pickle).unwrap();
    assert_eq!(unpacked, obj);
}
