#![no_main]

mod utils;

use std::sync::{Arc, OnceLock};

use flint_engine::{Autofuzz, Fault, FunctionTarget, FuzzTarget};
use flint_model::{CallError, Callable, Schema, TypeId, Value};
use flint_provider::ByteStream;
use libfuzzer_sys::fuzz_target;
use utils::FuzzRunner;

struct Harness {
    engine: Autofuzz,
    targets: Vec<FuzzTarget>,
    consumable: Vec<TypeId>,
}

/// A fixed sample schema covering every generation path: polymorphic
/// dispatch through an abstract intermediate, recursion, builders,
/// arrays, enums, and callables that deliberately raise on magic values.
fn init() -> Harness {
    let mut schema = Schema::new();

    let shape = schema.declare_interface("Shape").expect("declare Shape");
    let rounded = schema
        .declare_abstract_class("Rounded")
        .expect("declare Rounded");
    let circle = schema.declare_class("Circle").expect("declare Circle");
    let square = schema.declare_class("Square").expect("declare Square");
    schema.add_implementor(shape, rounded).expect("link Rounded");
    schema.add_implementor(rounded, circle).expect("link Circle");
    schema.add_implementor(shape, square).expect("link Square");
    schema
        .add_constructor(Callable::constructor(
            circle,
            vec![TypeId::INT],
            move |_, args| match args[0] {
                // A planted finding: the engine must classify this as a
                // target fault (or a downgraded construction fault), never
                // let it escape as a panic.
                Value::Int(i32::MIN) => Err(CallError::raised("radius underflow")),
                _ => Ok(Value::object(circle, args[0].clone())),
            },
        ))
        .expect("Circle ctor");
    schema
        .add_constructor(Callable::constructor(
            square,
            vec![TypeId::INT],
            move |_, args| Ok(Value::object(square, args[0].clone())),
        ))
        .expect("Square ctor");

    let node = schema.declare_class("Node").expect("declare Node");
    schema
        .add_constructor(Callable::constructor(
            node,
            vec![node, TypeId::INT],
            move |_, args| Ok(Value::object(node, args.to_vec())),
        ))
        .expect("Node ctor");

    let report = schema.declare_class("Report").expect("declare Report");
    let builder = schema
        .declare_class("ReportBuilder")
        .expect("declare ReportBuilder");
    schema.declare_builder(report, builder).expect("link builder");
    schema
        .add_constructor(Callable::constructor(builder, vec![], move |_, _| {
            Ok(Value::object(builder, Vec::<String>::new()))
        }))
        .expect("builder ctor");
    for part in ["header", "body", "footer"] {
        schema
            .add_method(Callable::method(
                builder,
                part,
                vec![],
                Some(builder),
                move |receiver, _| {
                    let mut parts = receiver
                        .and_then(|r| r.downcast_ref::<Vec<String>>())
                        .cloned()
                        .ok_or_else(|| CallError::shape("builder instance lost"))?;
                    parts.push(part.to_owned());
                    Ok(Value::object(builder, parts))
                },
            ))
            .expect("cascading op");
    }
    schema
        .add_method(Callable::method(
            builder,
            "render",
            vec![],
            Some(report),
            move |receiver, _| {
                let parts = receiver
                    .and_then(|r| r.downcast_ref::<Vec<String>>())
                    .cloned()
                    .ok_or_else(|| CallError::shape("builder instance lost"))?;
                if parts.len() == 3 {
                    // Planted finding on the builder path.
                    return Err(CallError::raised("report too long"));
                }
                Ok(Value::object(report, parts))
            },
        ))
        .expect("terminal op");

    let color = schema
        .declare_enum(
            "Color",
            vec!["RED".to_owned(), "GREEN".to_owned(), "BLUE".to_owned()],
        )
        .expect("declare Color");
    let ints = schema.array_of(TypeId::INT).expect("int[]");
    let shapes = schema.array_of(shape).expect("Shape[]");

    let stats = schema.declare_class("Stats").expect("declare Stats");
    schema
        .add_constructor(Callable::constructor(stats, vec![], move |_, _| {
            Ok(Value::object(stats, ()))
        }))
        .expect("Stats ctor");
    schema
        .add_method(Callable::method(
            stats,
            "total",
            vec![ints],
            Some(TypeId::LONG),
            |_, args| match &args[0] {
                Value::Array { values, .. } => {
                    let mut total: i64 = 0;
                    for value in values {
                        if let Value::Int(n) = value {
                            total = total.wrapping_add(i64::from(*n));
                        }
                    }
                    Ok(Value::Long(total))
                }
                Value::Null => Ok(Value::Long(0)),
                other => Err(CallError::shape(format!("expected an array, got {other:?}"))),
            },
        ))
        .expect("total method");
    schema
        .add_method(Callable::static_method(
            stats,
            "clamp",
            vec![TypeId::INT, TypeId::INT],
            Some(TypeId::INT),
            |_, args| match (&args[0], &args[1]) {
                (Value::Int(n), Value::Int(cap)) => Ok(Value::Int(*n.min(cap))),
                _ => Err(CallError::shape("expected two ints")),
            },
        ))
        .expect("clamp method");

    let shout = FunctionTarget::binary(
        "shout",
        TypeId::STRING,
        TypeId::BOOLEAN,
        TypeId::STRING,
        |args| match (&args[0], &args[1]) {
            (Value::Str(text), Value::Boolean(true)) => Ok(Value::Str(text.to_uppercase())),
            (Value::Str(text), Value::Boolean(false)) => Ok(Value::Str(text.clone())),
            _ => Err(CallError::shape("expected a string and a flag")),
        },
    );

    let engine = Autofuzz::new(Arc::new(schema));
    let targets = vec![
        FuzzTarget::Callable(
            engine
                .schema()
                .find_method(stats, "total")
                .expect("total registered")
                .clone(),
        ),
        FuzzTarget::Callable(
            engine
                .schema()
                .find_method(stats, "clamp")
                .expect("clamp registered")
                .clone(),
        ),
        FuzzTarget::Callable(engine.schema().constructors_of(node)[0].clone()),
        FuzzTarget::Function(shout),
    ];
    let consumable = vec![shape, node, report, color, ints, shapes, TypeId::STRING];

    Harness {
        engine,
        targets,
        consumable,
    }
}

impl Harness {
    fn dispatch(&self, selector: u8, bytes: &[u8]) -> Result<Value, Fault> {
        let mut data = ByteStream::new(bytes);
        let lanes = self.targets.len() + self.consumable.len();
        let lane = (selector as usize) % lanes;
        if lane < self.targets.len() {
            self.engine.run(&mut data, &self.targets[lane])
        } else {
            self.engine
                .consume(&mut data, self.consumable[lane - self.targets.len()])
        }
    }
}

fn run_one(harness: &mut Harness, input: &[u8]) {
    let Some((&selector, bytes)) = input.split_first() else {
        return;
    };

    let outcome = harness.dispatch(selector, bytes);
    if let Err(Fault::Framework(err)) = &outcome {
        panic!("framework fault on a well-formed schema: {err}");
    }

    // Byte-for-byte replays must make identical decisions, or crash
    // reproduction breaks.
    let replay = harness.dispatch(selector, bytes);
    assert_eq!(format!("{outcome:?}"), format!("{replay:?}"));
}

fn runner() -> &'static FuzzRunner<Harness> {
    static RUNNER: OnceLock<FuzzRunner<Harness>> = OnceLock::new();
    RUNNER.get_or_init(|| FuzzRunner::new("fuzz_autofuzz", init, run_one))
}

fuzz_target!(|data: &[u8]| {
    runner().run(data);
});
