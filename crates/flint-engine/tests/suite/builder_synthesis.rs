use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flint_engine::{Autofuzz, ConstructionError, Fault};
use flint_model::{CallError, Callable, Schema, TypeId, Value};
use flint_provider::ByteStream;

/// A `Report` that can only be made through `ReportBuilder`: the builder
/// accumulates part names, each cascading op returns a fresh builder, and
/// `build` freezes the parts into the report.
fn report_schema() -> (Schema, TypeId, TypeId) {
    let mut schema = Schema::new();
    let report = schema.declare_class("Report").unwrap();
    let builder = schema.declare_class("ReportBuilder").unwrap();
    schema.declare_builder(report, builder).unwrap();
    schema
        .add_constructor(Callable::constructor(builder, vec![], move |_, _| {
            Ok(Value::object(builder, Vec::<String>::new()))
        }))
        .unwrap();
    for part in ["alpha", "beta", "gamma"] {
        schema
            .add_method(Callable::method(
                builder,
                part,
                vec![],
                Some(builder),
                move |receiver, _| {
                    let parts = receiver
                        .and_then(|r| r.downcast_ref::<Vec<String>>())
                        .ok_or_else(|| CallError::shape("cascading op lost its builder"))?;
                    let mut next = parts.clone();
                    next.push(part.to_owned());
                    Ok(Value::object(builder, next))
                },
            ))
            .unwrap();
    }
    (schema, report, builder)
}

fn add_build_method(schema: &mut Schema, report: TypeId, builder: TypeId, calls: Arc<AtomicUsize>) {
    schema
        .add_method(Callable::method(
            builder,
            "build",
            vec![],
            Some(report),
            move |receiver, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                let parts = receiver
                    .and_then(|r| r.downcast_ref::<Vec<String>>())
                    .ok_or_else(|| CallError::shape("terminal op lost its builder"))?
                    .clone();
                Ok(Value::object(report, parts))
            },
        ))
        .unwrap();
}

fn parts_of(value: &Value) -> Vec<String> {
    value
        .downcast_ref::<Vec<String>>()
        .cloned()
        .unwrap_or_else(|| panic!("expected a finished report, got {value:?}"))
}

#[test]
fn an_empty_plan_still_runs_exactly_one_terminal_op() {
    let (mut schema, report, builder) = report_schema();
    let builds = Arc::new(AtomicUsize::new(0));
    add_build_method(&mut schema, report, builder, builds.clone());
    let engine = Autofuzz::new(Arc::new(schema));

    // One byte picks a plan length of zero out of 0..=3.
    let value = engine
        .consume(&mut ByteStream::new(&[0x00]), report)
        .unwrap();
    assert_eq!(parts_of(&value), Vec::<String>::new());
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn the_plan_never_repeats_a_cascading_op() {
    let (mut schema, report, builder) = report_schema();
    add_build_method(&mut schema, report, builder, Arc::new(AtomicUsize::new(0)));
    let engine = Autofuzz::new(Arc::new(schema));

    // Back of the stream: plan length 3, then two pool picks of index 0.
    // The last pick is forced, the pool being down to one op.
    let value = engine
        .consume(&mut ByteStream::new(&[0x00, 0x00, 0x03]), report)
        .unwrap();
    let parts = parts_of(&value);
    assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn every_plan_length_yields_distinct_parts() {
    for raw in 0u8..=7 {
        let (mut schema, report, builder) = report_schema();
        add_build_method(&mut schema, report, builder, Arc::new(AtomicUsize::new(0)));
        let engine = Autofuzz::new(Arc::new(schema));

        let data = [raw, raw, raw, raw];
        let value = engine.consume(&mut ByteStream::new(&data), report).unwrap();
        let parts = parts_of(&value);
        let mut unique = parts.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), parts.len(), "plan repeated an op: {parts:?}");
    }
}

#[test]
fn a_builder_without_a_terminal_op_is_rejected() {
    let (schema, report, _) = report_schema();
    let engine = Autofuzz::new(Arc::new(schema));

    let fault = engine
        .consume(&mut ByteStream::new(&[0; 4]), report)
        .unwrap_err();
    match fault {
        Fault::Construction(ConstructionError::NoTerminalOp { target, builder }) => {
            assert_eq!(target, "Report");
            assert_eq!(builder, "ReportBuilder");
        }
        other => panic!("expected a missing-terminal fault, got {other:?}"),
    }
}

#[test]
fn static_methods_never_count_as_terminal_ops() {
    let (mut schema, report, builder) = report_schema();
    // Returns the target type, but statics take no builder instance and
    // are excluded from the partition outright.
    schema
        .add_method(Callable::static_method(
            builder,
            "empty_report",
            vec![],
            Some(report),
            move |_, _| Ok(Value::object(report, Vec::<String>::new())),
        ))
        .unwrap();
    let engine = Autofuzz::new(Arc::new(schema));

    let fault = engine
        .consume(&mut ByteStream::new(&[0; 4]), report)
        .unwrap_err();
    assert!(
        matches!(
            fault,
            Fault::Construction(ConstructionError::NoTerminalOp { .. })
        ),
        "got {fault:?}"
    );
}

#[test]
fn a_raise_inside_the_builder_is_a_construction_fault() {
    let mut schema = Schema::new();
    let report = schema.declare_class("Report").unwrap();
    let builder = schema.declare_class("ReportBuilder").unwrap();
    schema.declare_builder(report, builder).unwrap();
    schema
        .add_constructor(Callable::constructor(builder, vec![], move |_, _| {
            Ok(Value::object(builder, ()))
        }))
        .unwrap();
    schema
        .add_method(Callable::method(
            builder,
            "build",
            vec![],
            Some(report),
            |_, _| Err(CallError::raised("ledger out of balance")),
        ))
        .unwrap();
    let engine = Autofuzz::new(Arc::new(schema));

    let fault = engine
        .consume(&mut ByteStream::new(&[]), report)
        .unwrap_err();
    match fault {
        Fault::Construction(ConstructionError::NestedTarget { ty, cause }) => {
            assert_eq!(ty, "Report");
            assert_eq!(cause.to_string(), "ledger out of balance");
        }
        other => panic!("expected a downgraded construction fault, got {other:?}"),
    }
}

#[test]
fn a_builder_without_a_constructor_is_rejected() {
    let mut schema = Schema::new();
    let report = schema.declare_class("Report").unwrap();
    let builder = schema.declare_class("ReportBuilder").unwrap();
    schema.declare_builder(report, builder).unwrap();
    schema
        .add_method(Callable::method(
            builder,
            "build",
            vec![],
            Some(report),
            move |_, _| Ok(Value::object(report, ())),
        ))
        .unwrap();
    let engine = Autofuzz::new(Arc::new(schema));

    let fault = engine
        .consume(&mut ByteStream::new(&[]), report)
        .unwrap_err();
    match fault {
        Fault::Construction(ConstructionError::NoBuilderConstructor { builder }) => {
            assert_eq!(builder, "ReportBuilder");
        }
        other => panic!("expected a missing-constructor fault, got {other:?}"),
    }
}
