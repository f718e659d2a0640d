use flint_model::{PrimitiveKind, Schema, TypeId, TypeIndex, TypeKind, Value};
use flint_provider::DataProvider;

use crate::builder;
use crate::config::EngineConfig;
use crate::fault::{ConstructionError, Fault, FrameworkError};
use crate::invoke;
use crate::registry::ImplementationRegistry;

/// Everything one generation call needs to see, borrowed for the duration
/// of a top-level run.
pub(crate) struct Ctx<'a> {
    pub schema: &'a Schema,
    pub index: &'a dyn TypeIndex,
    pub registry: &'a ImplementationRegistry,
    pub config: &'a EngineConfig,
}

/// Type-directed generation: produce a value of `ty` from the stream.
///
/// Dispatch order, first applicable rule wins:
/// 1. primitives and wrappers decode a fixed-width scalar;
/// 2. strings, byte sequences and arrays take `floor(remaining / 2)` as
///    their length, reserving the other half for sibling parameters;
/// 3. enums pick one declared constant, valid even on an empty stream;
/// 4. interfaces and abstract classes resolve a concrete implementor
///    through the registry and recurse;
/// 5. a class with constructors picks one and builds it via the invoker;
/// 6. a class with only declared builders goes through builder synthesis;
/// 7. anything else resolves to the absent value, which callers must
///    accept as a degenerate argument.
///
/// Rules 4 through 6 and recursive array elements respect the engine's
/// depth budget and resolve to the absent value once it is spent.
pub(crate) fn consume(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    ty: TypeId,
    depth: u32,
) -> Result<Value, Fault> {
    let desc = ctx.schema.descriptor(ty).ok_or_else(|| {
        FrameworkError::new(format!("generation requested unknown type {ty:?}"))
    })?;

    if depth >= ctx.config.max_depth && recurses(&desc.kind) {
        tracing::debug!(
            target = "flint.engine",
            ty = %desc.name,
            depth,
            "depth budget exhausted; resolving to the absent value"
        );
        return Ok(Value::Null);
    }

    match &desc.kind {
        TypeKind::Primitive(kind) | TypeKind::Wrapper(kind) => Ok(consume_scalar(data, *kind)),
        TypeKind::Str => {
            let budget = data.remaining_bytes() / 2;
            Ok(Value::Str(data.consume_string(budget)))
        }
        TypeKind::Bytes => {
            let budget = data.remaining_bytes() / 2;
            Ok(Value::Bytes(data.consume_bytes(budget)))
        }
        TypeKind::Array { elem } => consume_array(ctx, data, *elem, depth),
        TypeKind::Enum { constants } => {
            let ordinal = data.pick_index(constants.len());
            Ok(Value::Enum { ty, ordinal })
        }
        TypeKind::Interface | TypeKind::Abstract => consume_polymorphic(ctx, data, ty, depth),
        TypeKind::Class => consume_class(ctx, data, ty, depth),
    }
}

fn recurses(kind: &TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Interface | TypeKind::Abstract | TypeKind::Class
    )
}

fn consume_scalar(data: &mut dyn DataProvider, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Byte => Value::Byte(data.consume_byte()),
        PrimitiveKind::Short => Value::Short(data.consume_short()),
        PrimitiveKind::Int => Value::Int(data.consume_int()),
        PrimitiveKind::Long => Value::Long(data.consume_long()),
        PrimitiveKind::Float => Value::Float(data.consume_float()),
        PrimitiveKind::Double => Value::Double(data.consume_double()),
        PrimitiveKind::Boolean => Value::Boolean(data.consume_bool()),
        PrimitiveKind::Char => Value::Char(data.consume_char()),
    }
}

fn consume_array(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    elem: TypeId,
    depth: u32,
) -> Result<Value, Fault> {
    let elem_desc = ctx.schema.descriptor(elem).ok_or_else(|| {
        FrameworkError::new(format!("array element type {elem:?} is not registered"))
    })?;
    let len = data.remaining_bytes() / 2;

    let values = if let Some(bulk) = bulk_values(data, &elem_desc.kind, len) {
        bulk
    } else {
        if depth >= ctx.config.max_depth {
            tracing::debug!(
                target = "flint.engine",
                elem = %elem_desc.name,
                depth,
                "depth budget exhausted; resolving array to the absent value"
            );
            return Ok(Value::Null);
        }
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(consume(ctx, data, elem, depth + 1)?);
        }
        values
    };
    Ok(Value::Array { elem, values })
}

/// Fast path for the five bulk-decodable element kinds; `None` for
/// everything that must recurse per element.
fn bulk_values(data: &mut dyn DataProvider, kind: &TypeKind, len: usize) -> Option<Vec<Value>> {
    let kind = match kind {
        TypeKind::Primitive(k) | TypeKind::Wrapper(k) => *k,
        _ => return None,
    };
    let values = match kind {
        PrimitiveKind::Byte => data
            .consume_bytes(len)
            .into_iter()
            .map(|b| Value::Byte(b as i8))
            .collect(),
        PrimitiveKind::Short => data.consume_shorts(len).into_iter().map(Value::Short).collect(),
        PrimitiveKind::Int => data.consume_ints(len).into_iter().map(Value::Int).collect(),
        PrimitiveKind::Long => data.consume_longs(len).into_iter().map(Value::Long).collect(),
        PrimitiveKind::Boolean => data.consume_bools(len).into_iter().map(Value::Boolean).collect(),
        PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::Char => return None,
    };
    Some(values)
}

fn consume_polymorphic(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    ty: TypeId,
    depth: u32,
) -> Result<Value, Fault> {
    let candidates = ctx.registry.resolve(ctx.schema, ctx.index, ty);
    if candidates.is_empty() {
        return Err(ConstructionError::NoImplementor {
            ty: ctx.schema.name_of(ty).to_owned(),
        }
        .into());
    }
    let concrete = candidates[data.pick_index(candidates.len())];
    if ctx.config.log_plans {
        tracing::debug!(
            target = "flint.engine",
            requested = %ctx.schema.name_of(ty),
            chosen = %ctx.schema.name_of(concrete),
            "resolved polymorphic type"
        );
    }
    consume(ctx, data, concrete, depth)
}

fn consume_class(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    ty: TypeId,
    depth: u32,
) -> Result<Value, Fault> {
    let constructors = ctx.schema.constructors_of(ty);
    if !constructors.is_empty() {
        let ctor = &constructors[data.pick_index(constructors.len())];
        if ctx.config.log_plans {
            tracing::debug!(
                target = "flint.engine",
                ty = %ctx.schema.name_of(ty),
                arity = ctor.arity(),
                "picked constructor"
            );
        }
        return invoke::construct(ctx, data, ctor, depth);
    }

    let builders = ctx.schema.builders_of(ty);
    if !builders.is_empty() {
        return builder::synthesize(ctx, data, ty, builders, depth);
    }

    // Not instantiable; the absent value is a legal degenerate argument.
    Ok(Value::Null)
}
