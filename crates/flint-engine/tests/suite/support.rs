//! Shared fixtures for the engine suite.

use std::sync::{Arc, Mutex};

use flint_model::{Callable, Schema, TypeId, Value};

/// Argument lists seen by a recording constructor, one entry per call.
pub type CallLog = Arc<Mutex<Vec<Vec<Value>>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Constructor that records its argument list and wraps a copy of it in
/// an object of the declaring type.
pub fn recording_constructor(declaring: TypeId, params: Vec<TypeId>, log: &CallLog) -> Callable {
    let log = log.clone();
    Callable::constructor(declaring, params, move |_, args| {
        log.lock().unwrap().push(args.to_vec());
        Ok(Value::object(declaring, args.to_vec()))
    })
}

/// A `Shape` interface implemented by concrete `Circle` and `Square`,
/// each constructible from one int.
pub fn shapes_schema() -> (Schema, TypeId, TypeId, TypeId) {
    let mut schema = Schema::new();
    let shape = schema.declare_interface("Shape").unwrap();
    let circle = schema.declare_class("Circle").unwrap();
    let square = schema.declare_class("Square").unwrap();
    schema.add_implementor(shape, circle).unwrap();
    schema.add_implementor(shape, square).unwrap();
    schema
        .add_constructor(Callable::constructor(circle, vec![TypeId::INT], move |_, args| {
            Ok(Value::object(circle, args[0].clone()))
        }))
        .unwrap();
    schema
        .add_constructor(Callable::constructor(square, vec![TypeId::INT], move |_, args| {
            Ok(Value::object(square, args[0].clone()))
        }))
        .unwrap();
    (schema, shape, circle, square)
}
