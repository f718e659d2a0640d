use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use flint_model::{CallError, Callable, PanicPayload, TargetCause, TypeId, Value};
use flint_provider::DataProvider;

use crate::fault::{ConstructionError, Fault, FrameworkError, TargetError};
use crate::generate::{self, Ctx};

/// Top-level generate-and-invoke for a schema callable.
///
/// Instance methods get a receiver of the declaring type generated first,
/// outside the argument downgrade boundary: a fault from the receiver's
/// own constructor body is a genuine top-level finding. A receiver that
/// resolves to the absent value aborts the attempt as a construction
/// fault. Methods without a return type complete with the absent value.
pub(crate) fn run(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    callable: &Arc<Callable>,
) -> Result<Value, Fault> {
    let receiver = if callable.is_static() {
        None
    } else {
        let value = generate::consume(ctx, data, callable.declaring_type(), 0)?;
        if value.is_null() {
            return Err(ConstructionError::NoReceiver {
                ty: ctx.schema.name_of(callable.declaring_type()).to_owned(),
            }
            .into());
        }
        Some(value)
    };

    let args = build_arguments(ctx, data, callable, 0)?;
    let result = call(ctx, callable, receiver.as_ref(), &args)?;
    Ok(match callable.return_type() {
        Some(_) => result,
        None => Value::Null,
    })
}

/// Generates one argument per declared parameter, in declaration order.
///
/// This is the downgrade boundary of the fault taxonomy: any failure
/// caught here counts against input synthesis, not against the target.
pub(crate) fn build_arguments(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    callable: &Callable,
    depth: u32,
) -> Result<Vec<Value>, Fault> {
    let mut args = Vec::with_capacity(callable.arity());
    for &param in callable.params() {
        args.push(consume_checked(ctx, data, param, depth)?);
    }
    Ok(args)
}

/// `consume` with argument-position fault reclassification, followed by
/// the conformance assertion: a generated value whose shape does not fit
/// the requested type is an engine bug, reported as a framework fault.
pub(crate) fn consume_checked(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    ty: TypeId,
    depth: u32,
) -> Result<Value, Fault> {
    let value = generate::consume(ctx, data, ty, depth + 1)
        .map_err(|fault| fault.downgrade(ctx.schema.name_of(ty)))?;
    if !value.is_null() && !value.conforms_to(ctx.schema, ty) {
        return Err(FrameworkError::new(format!(
            "generated a {} where `{}` was requested",
            value.describe(),
            ctx.schema.name_of(ty)
        ))
        .into());
    }
    Ok(value)
}

/// Builds an instance through `ctor`: arguments first, then the call. A
/// fault from the constructor body itself is a target fault here; whether
/// it stays one depends on the caller's boundary.
pub(crate) fn construct(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    ctor: &Arc<Callable>,
    depth: u32,
) -> Result<Value, Fault> {
    let args = build_arguments(ctx, data, ctor, depth)?;
    call(ctx, ctor, None, &args)
}

/// Invokes the closure with shape checks and panic capture.
pub(crate) fn call(
    ctx: &Ctx<'_>,
    callable: &Callable,
    receiver: Option<&Value>,
    args: &[Value],
) -> Result<Value, Fault> {
    let location = location_of(ctx, callable);
    if args.len() != callable.arity() {
        return Err(FrameworkError::new(format!(
            "`{location}` takes {} arguments, got {}",
            callable.arity(),
            args.len()
        ))
        .into());
    }
    if !callable.is_static() && !receiver.is_some_and(|r| !r.is_null()) {
        return Err(FrameworkError::new(format!("`{location}` requires a receiver")).into());
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| callable.invoke(receiver, args)));
    classify(&location, outcome)
}

/// Maps a closure outcome onto the fault taxonomy. Shared with the
/// functional adapter.
pub(crate) fn classify(
    location: &str,
    outcome: thread::Result<Result<Value, CallError>>,
) -> Result<Value, Fault> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(CallError::BadShape(message))) => {
            Err(FrameworkError::new(format!("`{location}`: {message}")).into())
        }
        Ok(Err(CallError::Raised(cause))) => Err(TargetError::new(location.to_owned(), cause).into()),
        Err(payload) => Err(TargetError::new(
            location.to_owned(),
            TargetCause::Panic(PanicPayload::new(payload)),
        )
        .into()),
    }
}

fn location_of(ctx: &Ctx<'_>, callable: &Callable) -> String {
    format!(
        "{}::{}",
        ctx.schema.name_of(callable.declaring_type()),
        callable.name()
    )
}
