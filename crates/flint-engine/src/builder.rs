use std::sync::Arc;

use flint_model::{Callable, TypeId, Value};
use flint_provider::DataProvider;

use crate::fault::{ConstructionError, Fault};
use crate::generate::Ctx;
use crate::invoke;

/// Builds a value of `target` through one of its declared builder types.
///
/// The builder's instance methods partition by return type into cascading
/// operations (returning the builder) and terminal operations (returning
/// the target). The call plan draws `k` cascading operations without
/// replacement, so no operation repeats. Any stage failure aborts the
/// whole synthesis as a single construction fault; an inner construction
/// fault is re-raised as-is, never nested.
pub(crate) fn synthesize(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    target: TypeId,
    builders: &[TypeId],
    depth: u32,
) -> Result<Value, Fault> {
    run_stages(ctx, data, target, builders, depth)
        .map_err(|fault| fault.downgrade(ctx.schema.name_of(target)))
}

fn run_stages(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    target: TypeId,
    builders: &[TypeId],
    depth: u32,
) -> Result<Value, Fault> {
    let builder_ty = builders[data.pick_index(builders.len())];

    let mut cascading: Vec<&Arc<Callable>> = Vec::new();
    let mut terminal: Vec<&Arc<Callable>> = Vec::new();
    for method in ctx.schema.methods_of(builder_ty) {
        if method.is_static() {
            continue;
        }
        match method.return_type() {
            Some(ret) if ret == builder_ty => cascading.push(method),
            Some(ret) if ret == target => terminal.push(method),
            _ => {}
        }
    }
    if terminal.is_empty() {
        return Err(ConstructionError::NoTerminalOp {
            target: ctx.schema.name_of(target).to_owned(),
            builder: ctx.schema.name_of(builder_ty).to_owned(),
        }
        .into());
    }

    // Pick-and-remove: the pool shrinks as the plan grows.
    let planned = data.consume_int_in_range(0, cascading.len() as i32) as usize;
    let mut plan: Vec<&Arc<Callable>> = Vec::with_capacity(planned);
    for _ in 0..planned {
        let idx = data.pick_index(cascading.len());
        plan.push(cascading.remove(idx));
    }

    if ctx.config.log_plans {
        tracing::debug!(
            target = "flint.engine",
            builder = %ctx.schema.name_of(builder_ty),
            plan = ?plan.iter().map(|op| op.name()).collect::<Vec<_>>(),
            "builder call plan"
        );
    }

    let constructors = ctx.schema.constructors_of(builder_ty);
    if constructors.is_empty() {
        return Err(ConstructionError::NoBuilderConstructor {
            builder: ctx.schema.name_of(builder_ty).to_owned(),
        }
        .into());
    }
    let ctor = &constructors[data.pick_index(constructors.len())];
    let mut instance = invoke::construct(ctx, data, ctor, depth)?;

    for op in plan {
        let args = invoke::build_arguments(ctx, data, op, depth)?;
        instance = invoke::call(ctx, op, Some(&instance), &args)?;
    }

    let finisher = terminal[data.pick_index(terminal.len())];
    let args = invoke::build_arguments(ctx, data, finisher, depth)?;
    invoke::call(ctx, finisher, Some(&instance), &args)
}
