use std::sync::Arc;

use flint_engine::{Autofuzz, EngineConfig};
use flint_model::{Callable, Schema, TypeId, Value};
use flint_provider::{ByteStream, DataProvider};
use pretty_assertions::assert_eq;

use super::support;

fn engine(schema: Schema) -> Autofuzz {
    Autofuzz::new(Arc::new(schema))
}

#[test]
fn primitives_and_wrappers_decode_to_matching_variants() {
    let engine = engine(Schema::new());
    let data = [0xAB_u8; 32];

    let cases = [
        (TypeId::BYTE, "byte"),
        (TypeId::SHORT, "short"),
        (TypeId::INT, "int"),
        (TypeId::LONG, "long"),
        (TypeId::FLOAT, "float"),
        (TypeId::DOUBLE, "double"),
        (TypeId::BOOLEAN, "boolean"),
        (TypeId::CHAR, "char"),
        (TypeId::BOXED_INT, "int"),
        (TypeId::BOXED_CHAR, "char"),
    ];
    for (ty, expected) in cases {
        let mut stream = ByteStream::new(&data);
        let value = engine.consume(&mut stream, ty).unwrap();
        assert_eq!(value.describe(), expected, "requested {ty:?}");
    }
}

#[test]
fn int_consumes_exactly_four_bytes() {
    let engine = engine(Schema::new());
    let mut stream = ByteStream::new(&[0x01, 0x02, 0x03, 0x04]);
    let value = engine.consume(&mut stream, TypeId::INT).unwrap();
    assert_eq!(value, Value::Int(i32::from_le_bytes([0x01, 0x02, 0x03, 0x04])));
    assert_eq!(stream.remaining_bytes(), 0);
}

#[test]
fn strings_and_byte_sequences_take_half_the_remaining_budget() {
    let engine = engine(Schema::new());

    let mut stream = ByteStream::new(b"abcdefgh");
    let value = engine.consume(&mut stream, TypeId::STRING).unwrap();
    assert_eq!(value, Value::Str("abcd".to_owned()));
    assert_eq!(stream.remaining_bytes(), 4);

    let mut stream = ByteStream::new(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let value = engine.consume(&mut stream, TypeId::BYTES).unwrap();
    assert_eq!(value, Value::Bytes(vec![1, 2, 3, 4]));
}

#[test]
fn array_length_is_half_the_remaining_bytes() {
    let mut schema = Schema::new();
    let ints = schema.array_of(TypeId::INT).unwrap();
    let strings = schema.array_of(TypeId::STRING).unwrap();
    let engine = engine(schema);

    // Bulk path: five elements from ten remaining bytes, zero-padded
    // past exhaustion.
    let mut stream = ByteStream::new(&[9, 0, 0, 0, 7, 0, 0, 0, 5, 0]);
    let value = engine.consume(&mut stream, ints).unwrap();
    match value {
        Value::Array { elem, values } => {
            assert_eq!(elem, TypeId::INT);
            assert_eq!(
                values,
                vec![
                    Value::Int(9),
                    Value::Int(7),
                    Value::Int(5),
                    Value::Int(0),
                    Value::Int(0)
                ]
            );
        }
        other => panic!("expected an int array, got {other:?}"),
    }

    // Recursive path: the length is fixed before elements decode.
    let mut stream = ByteStream::new(&[b'x'; 6]);
    let value = engine.consume(&mut stream, strings).unwrap();
    match value {
        Value::Array { elem, values } => {
            assert_eq!(elem, TypeId::STRING);
            assert_eq!(values.len(), 3);
            assert!(values.iter().all(|v| matches!(v, Value::Str(_))));
        }
        other => panic!("expected a string array, got {other:?}"),
    }
}

#[test]
fn enum_pick_is_valid_even_on_an_empty_stream() {
    let mut schema = Schema::new();
    let mode = schema
        .declare_enum(
            "Mode",
            vec!["ON".to_owned(), "OFF".to_owned(), "AUTO".to_owned()],
        )
        .unwrap();
    let engine = engine(schema);

    let mut empty = ByteStream::new(&[]);
    let value = engine.consume(&mut empty, mode).unwrap();
    assert_eq!(value, Value::Enum { ty: mode, ordinal: 0 });

    for byte in 0..=255_u8 {
        let data = [byte];
        let mut stream = ByteStream::new(&data);
        match engine.consume(&mut stream, mode).unwrap() {
            Value::Enum { ty, ordinal } => {
                assert_eq!(ty, mode);
                assert!(ordinal < 3);
            }
            other => panic!("expected an enum, got {other:?}"),
        }
    }
}

#[test]
fn one_byte_stream_still_picks_a_constructor_and_fills_defaults() {
    let mut schema = Schema::new();
    let point = schema.declare_class("Point").unwrap();
    let log = support::call_log();
    schema
        .add_constructor(support::recording_constructor(
            point,
            vec![TypeId::INT],
            &log,
        ))
        .unwrap();
    schema
        .add_constructor(support::recording_constructor(
            point,
            vec![TypeId::STRING],
            &log,
        ))
        .unwrap();
    let engine = engine(schema);

    let value = engine.consume(&mut ByteStream::new(&[0x00]), point).unwrap();
    assert!(matches!(value, Value::Object(_)));

    // The single byte drives the constructor pick; the chosen parameter
    // decodes from the exhausted stream as its zero-equivalent.
    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0] == vec![Value::Int(0)] || calls[0] == vec![Value::Str(String::new())],
        "unexpected arguments: {:?}",
        calls[0]
    );

    // Same byte, fresh stream: the same candidate is picked again.
    drop(calls);
    engine.consume(&mut ByteStream::new(&[0x00]), point).unwrap();
    let calls = log.lock().unwrap();
    assert_eq!(calls[0], calls[1]);
}

#[test]
fn depth_budget_bottoms_out_in_the_absent_value() {
    let mut schema = Schema::new();
    let node = schema.declare_class("Node").unwrap();
    schema
        .add_constructor(Callable::constructor(node, vec![node], move |_, args| {
            Ok(Value::object(node, args[0].clone()))
        }))
        .unwrap();
    let engine = Autofuzz::with_config(
        Arc::new(schema),
        EngineConfig {
            max_depth: 3,
            ..EngineConfig::default()
        },
    );

    let value = engine
        .consume(&mut ByteStream::new(&[0xFF; 64]), node)
        .unwrap();

    // Each level wraps the next; the chain stops at the budget with a
    // null link instead of recursing forever.
    let mut depth = 0;
    let mut current = value;
    loop {
        match current.downcast_ref::<Value>() {
            Some(inner) => {
                depth += 1;
                current = inner.clone();
            }
            None => break,
        }
    }
    assert_eq!(current, Value::Null);
    assert_eq!(depth, 3);
}

#[test]
fn uninstantiable_class_resolves_to_the_absent_value() {
    let mut schema = Schema::new();
    let opaque = schema.declare_class("Opaque").unwrap();
    let engine = engine(schema);

    let value = engine
        .consume(&mut ByteStream::new(&[1, 2, 3]), opaque)
        .unwrap();
    assert_eq!(value, Value::Null);
}
