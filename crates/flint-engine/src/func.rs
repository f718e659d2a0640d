use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use flint_model::{CallError, TypeId, Value};
use flint_provider::DataProvider;

use crate::fault::{Fault, FrameworkError};
use crate::generate::Ctx;
use crate::invoke;

/// Signature of the closure backing a [`FunctionTarget`].
pub type FunctionFn = dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync;

/// A plain function value under test, with explicit type tags standing in
/// for a registered callable descriptor.
///
/// Tags must resolve against the engine's schema at run time; a tag the
/// schema does not know is a framework fault, the closest analog of type
/// erasure defeating argument synthesis.
#[derive(Clone)]
pub struct FunctionTarget {
    name: String,
    params: Vec<TypeId>,
    result: Option<TypeId>,
    run: Arc<FunctionFn>,
}

impl FunctionTarget {
    pub fn unary<F>(name: impl Into<String>, param: TypeId, result: TypeId, run: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: vec![param],
            result: Some(result),
            run: Arc::new(run),
        }
    }

    /// A unary consumer: invoked for effect, completes with the absent
    /// value.
    pub fn unary_void<F>(name: impl Into<String>, param: TypeId, run: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: vec![param],
            result: None,
            run: Arc::new(run),
        }
    }

    pub fn binary<F>(
        name: impl Into<String>,
        first: TypeId,
        second: TypeId,
        result: TypeId,
        run: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: vec![first, second],
            result: Some(result),
            run: Arc::new(run),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    #[must_use]
    pub fn result(&self) -> Option<TypeId> {
        self.result
    }
}

impl fmt::Debug for FunctionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTarget")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Generates arguments for the function's type tags and applies it.
pub(crate) fn run(
    ctx: &Ctx<'_>,
    data: &mut dyn DataProvider,
    func: &FunctionTarget,
) -> Result<Value, Fault> {
    let mut tags = func.params().to_vec();
    tags.extend(func.result());
    for tag in tags {
        if ctx.schema.descriptor(tag).is_none() {
            return Err(FrameworkError::new(format!(
                "function `{}` carries a type tag {tag:?} the schema does not know",
                func.name()
            ))
            .into());
        }
    }

    let mut args = Vec::with_capacity(func.params().len());
    for &param in func.params() {
        args.push(invoke::consume_checked(ctx, data, param, 0)?);
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (func.run)(&args)));
    let value = invoke::classify(func.name(), outcome)?;
    Ok(match func.result() {
        Some(_) => value,
        None => Value::Null,
    })
}
