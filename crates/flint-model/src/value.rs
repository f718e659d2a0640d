use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::schema::Schema;
use crate::ty::{PrimitiveKind, TypeId, TypeKind};

/// A runtime value produced by the generator and fed to callables.
///
/// Scalars carry their payload inline; reference values carry the
/// [`TypeId`] they were generated as so conformance can be re-checked at
/// the invocation boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    Array { elem: TypeId, values: Vec<Value> },
    Enum { ty: TypeId, ordinal: usize },
    Object(ObjectValue),
}

impl Value {
    /// Wraps an arbitrary target-side object under the given type id.
    pub fn object<T: Any + Send + Sync>(ty: TypeId, inner: T) -> Self {
        Value::Object(ObjectValue::new(ty, inner))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the wrapped object if this is an `Object` of type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short shape name for diagnostics.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array { .. } => "array",
            Value::Enum { .. } => "enum",
            Value::Object(_) => "object",
        }
    }

    fn scalar_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Byte(_) => Some(PrimitiveKind::Byte),
            Value::Short(_) => Some(PrimitiveKind::Short),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::Char(_) => Some(PrimitiveKind::Char),
            _ => None,
        }
    }

    /// Whether this value can be bound to a slot declared as `ty`.
    ///
    /// `Null` binds to every reference type but never to a primitive.
    /// Objects bind to their own type and, through the schema's supertype
    /// edges, to anything they are assignable to. Arrays check their
    /// element type strictly.
    #[must_use]
    pub fn conforms_to(&self, schema: &Schema, ty: TypeId) -> bool {
        let Some(desc) = schema.descriptor(ty) else {
            return false;
        };
        match (&desc.kind, self) {
            (TypeKind::Primitive(k), v) => v.scalar_kind() == Some(*k),
            (TypeKind::Wrapper(_), Value::Null) => true,
            (TypeKind::Wrapper(k), v) => v.scalar_kind() == Some(*k),
            (_, Value::Null) => true,
            (TypeKind::Str, Value::Str(_)) => true,
            (TypeKind::Bytes, Value::Bytes(_)) => true,
            (TypeKind::Array { elem }, Value::Array { elem: have, .. }) => have == elem,
            (TypeKind::Enum { .. }, Value::Enum { ty: have, .. }) => *have == ty,
            (
                TypeKind::Interface | TypeKind::Abstract | TypeKind::Class,
                Value::Object(obj),
            ) => schema.is_assignable(obj.ty(), ty),
            _ => false,
        }
    }
}

/// A generated target-side object: its registered type plus an opaque,
/// shared payload.
///
/// Payloads are shared by `Arc` so a value can be bound both as a receiver
/// and as an argument without cloning target state. Equality is identity
/// of the payload, not structural.
#[derive(Clone)]
pub struct ObjectValue {
    ty: TypeId,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    pub fn new<T: Any + Send + Sync>(ty: TypeId, inner: T) -> Self {
        Self {
            ty,
            inner: Arc::new(inner),
        }
    }

    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}
