use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a registered type.
///
/// Ids are dense indexes into the owning [`Schema`](crate::Schema) and are
/// the only key the engine caches on, so they must stay valid for the whole
/// fuzzing run. The well-known leaf types below are interned by
/// `Schema::new` in this exact order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }

    pub const BYTE: TypeId = TypeId(0);
    pub const SHORT: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const LONG: TypeId = TypeId(3);
    pub const FLOAT: TypeId = TypeId(4);
    pub const DOUBLE: TypeId = TypeId(5);
    pub const BOOLEAN: TypeId = TypeId(6);
    pub const CHAR: TypeId = TypeId(7);

    pub const BOXED_BYTE: TypeId = TypeId(8);
    pub const BOXED_SHORT: TypeId = TypeId(9);
    pub const BOXED_INT: TypeId = TypeId(10);
    pub const BOXED_LONG: TypeId = TypeId(11);
    pub const BOXED_FLOAT: TypeId = TypeId(12);
    pub const BOXED_DOUBLE: TypeId = TypeId(13);
    pub const BOXED_BOOLEAN: TypeId = TypeId(14);
    pub const BOXED_CHAR: TypeId = TypeId(15);

    pub const STRING: TypeId = TypeId(16);
    pub const BYTES: TypeId = TypeId(17);
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// The eight fixed-width primitive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
        }
    }
}

/// Shape of a registered type, as seen by the generator's dispatch rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// Boxed counterpart of a primitive; generated identically, but
    /// assignable where an object is expected.
    Wrapper(PrimitiveKind),
    Str,
    /// Opaque byte sequence (distinct from `Array` of `byte`).
    Bytes,
    Array {
        elem: TypeId,
    },
    Enum {
        /// Declared constants, in declaration order.
        constants: Vec<String>,
    },
    Interface,
    /// Abstract class: has an identity and possibly subclasses, but can
    /// never be instantiated directly.
    Abstract,
    /// Concrete class, constructible through registered constructors or a
    /// declared builder.
    Class,
}

impl TypeKind {
    /// Types that resolve through the implementation registry.
    #[must_use]
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Abstract)
    }

    /// Types whose values are plain data decoded straight off the stream.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            TypeKind::Primitive(_) | TypeKind::Wrapper(_) | TypeKind::Str | TypeKind::Bytes
        )
    }
}

/// An immutable registered type: identity, display name, and shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub(crate) fn new(id: TypeId, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
