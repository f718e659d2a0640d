//! Registered object model for Flint.
//!
//! Everything the engine can generate or invoke is declared ahead of time
//! in a [`Schema`]: type descriptors, subtype edges, and callables backed
//! by plain closures. There is no runtime reflection or discovery; the
//! schema is the whole universe.

mod callable;
mod schema;
mod ty;
mod value;

pub use callable::{CallError, CallFn, Callable, CallableKind, PanicPayload, TargetCause};
pub use schema::{Schema, SchemaError, TypeIndex};
pub use ty::{PrimitiveKind, TypeDescriptor, TypeId, TypeKind};
pub use value::{ObjectValue, Value};
