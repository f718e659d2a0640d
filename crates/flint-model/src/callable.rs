use std::any::Any;
use std::error::Error;
use std::fmt;

use crate::ty::TypeId;
use crate::value::Value;

/// Signature of the closure backing a [`Callable`].
///
/// The first slot is the bound receiver for instance methods and `None`
/// for constructors and static methods.
pub type CallFn = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallableKind {
    Method,
    Constructor,
}

/// One invocable operation of a registered type.
///
/// Callables are plain closures over target code; there is no runtime
/// reflection anywhere. The schema owns them and the engine only ever
/// sees them behind `Arc`.
pub struct Callable {
    kind: CallableKind,
    is_static: bool,
    declaring_type: TypeId,
    name: String,
    params: Vec<TypeId>,
    return_type: Option<TypeId>,
    run: Box<CallFn>,
}

impl Callable {
    /// A constructor for `declaring`. Always static; always returns an
    /// instance of the declaring type.
    pub fn constructor<F>(declaring: TypeId, params: Vec<TypeId>, run: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            kind: CallableKind::Constructor,
            is_static: true,
            declaring_type: declaring,
            name: "new".to_owned(),
            params,
            return_type: Some(declaring),
            run: Box::new(run),
        }
    }

    /// An instance method; the invoker will synthesize a receiver for it.
    pub fn method<F>(
        declaring: TypeId,
        name: impl Into<String>,
        params: Vec<TypeId>,
        return_type: Option<TypeId>,
        run: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            kind: CallableKind::Method,
            is_static: false,
            declaring_type: declaring,
            name: name.into(),
            params,
            return_type,
            run: Box::new(run),
        }
    }

    /// A static method; invoked without a receiver.
    pub fn static_method<F>(
        declaring: TypeId,
        name: impl Into<String>,
        params: Vec<TypeId>,
        return_type: Option<TypeId>,
        run: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            kind: CallableKind::Method,
            is_static: true,
            declaring_type: declaring,
            name: name.into(),
            params,
            return_type,
            run: Box::new(run),
        }
    }

    #[must_use]
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.kind == CallableKind::Constructor
    }

    #[must_use]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring_type
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
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn return_type(&self) -> Option<TypeId> {
        self.return_type
    }

    /// Runs the backing closure. Shape checks happen in the engine before
    /// this call; target panics are caught there as well.
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, CallError> {
        (self.run)(receiver, args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("declaring_type", &self.declaring_type)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Failure reported by a callable's backing closure.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The closure was handed values it cannot work with. This is a
    /// harness bug, not target behavior.
    #[error("call shape invalid: {0}")]
    BadShape(String),
    /// The target itself raised.
    #[error("target raised: {0}")]
    Raised(TargetCause),
}

impl CallError {
    pub fn shape(msg: impl Into<String>) -> Self {
        CallError::BadShape(msg.into())
    }

    pub fn raised<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        CallError::Raised(TargetCause::Error(err.into()))
    }
}

/// What the target did when it failed: returned an error, or panicked.
#[derive(Debug)]
pub enum TargetCause {
    Error(Box<dyn Error + Send + Sync>),
    Panic(PanicPayload),
}

impl fmt::Display for TargetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetCause::Error(err) => write!(f, "{err}"),
            TargetCause::Panic(payload) => match payload.message() {
                Some(msg) => write!(f, "panicked: {msg}"),
                None => f.write_str("panicked"),
            },
        }
    }
}

/// The raw payload of a caught panic, preserved for reporting.
pub struct PanicPayload(Box<dyn Any + Send>);

impl PanicPayload {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self(payload)
    }

    /// The panic message, when the payload is a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.0.downcast_ref::<&'static str>() {
            Some(s)
        } else {
            self.0.downcast_ref::<String>().map(String::as_str)
        }
    }

    #[must_use]
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.0
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "PanicPayload({msg:?})"),
            None => f.write_str("PanicPayload(<opaque>)"),
        }
    }
}
