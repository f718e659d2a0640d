use std::sync::Arc;

use flint_engine::{Autofuzz, ConstructionError, Fault};
use flint_model::{Callable, Schema, Value};
use flint_provider::ByteStream;

use super::support;

#[test]
fn an_interface_without_implementors_cannot_be_generated() {
    let mut schema = Schema::new();
    let shape = schema.declare_interface("Shape").unwrap();
    let engine = Autofuzz::new(Arc::new(schema));

    let fault = engine
        .consume(&mut ByteStream::new(&[1, 2, 3]), shape)
        .unwrap_err();
    match fault {
        Fault::Construction(ConstructionError::NoImplementor { ty }) => {
            assert_eq!(ty, "Shape");
        }
        other => panic!("expected a missing-implementor fault, got {other:?}"),
    }
}

#[test]
fn polymorphic_generation_picks_a_concrete_implementor() {
    let (schema, shape, circle, square) = support::shapes_schema();
    let schema = Arc::new(schema);
    let engine = Autofuzz::new(schema.clone());

    for input in [&[0u8, 0, 0, 0, 0][..], &[9, 9, 9, 9, 9][..]] {
        let value = engine.consume(&mut ByteStream::new(input), shape).unwrap();
        match &value {
            Value::Object(obj) => {
                assert!(obj.ty() == circle || obj.ty() == square, "picked {obj:?}");
            }
            other => panic!("expected an object, got {other:?}"),
        }
        assert!(value.conforms_to(&schema, shape));
    }
}

#[test]
fn implementor_scans_are_memoized_until_invalidated() {
    let (schema, shape, _, _) = support::shapes_schema();
    let engine = Autofuzz::new(Arc::new(schema));

    engine.consume(&mut ByteStream::new(&[0; 5]), shape).unwrap();
    engine.consume(&mut ByteStream::new(&[7; 5]), shape).unwrap();
    assert_eq!(engine.registry().scan_count(), 1);

    engine.invalidate_implementors(shape);
    engine.consume(&mut ByteStream::new(&[0; 5]), shape).unwrap();
    assert_eq!(engine.registry().scan_count(), 2);
}

#[test]
fn abstract_intermediates_are_walked_through_but_never_picked() {
    let mut schema = Schema::new();
    let shape = schema.declare_interface("Shape").unwrap();
    let base = schema.declare_abstract_class("BaseShape").unwrap();
    let circle = schema.declare_class("Circle").unwrap();
    schema.add_implementor(shape, base).unwrap();
    schema.add_implementor(base, circle).unwrap();
    schema
        .add_constructor(Callable::constructor(circle, vec![], move |_, _| {
            Ok(Value::object(circle, ()))
        }))
        .unwrap();
    let engine = Autofuzz::new(Arc::new(schema));

    // The abstract link is traversed, but only the concrete class can be
    // the pick. Any input must land on `Circle`.
    for byte in [0u8, 1, 127, 255] {
        let value = engine
            .consume(&mut ByteStream::new(&[byte]), shape)
            .unwrap();
        match value {
            Value::Object(obj) => assert_eq!(obj.ty(), circle),
            other => panic!("expected an object, got {other:?}"),
        }
    }
}
