use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use crate::callable::{Callable, CallableKind};
use crate::ty::{PrimitiveKind, TypeDescriptor, TypeId, TypeKind};

/// Source of subtype information for polymorphic generation.
///
/// `implementors_of` returns every known transitive subtype of `ty`,
/// abstract ones included; filtering down to constructible classes is the
/// caller's job. Implementations may be expensive, callers are expected
/// to memoize.
pub trait TypeIndex: Send + Sync {
    fn implementors_of(&self, ty: TypeId) -> Vec<TypeId>;
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("type `{0}` is already registered")]
    Duplicate(String),
    #[error("unknown type {0:?}")]
    Unknown(TypeId),
    #[error("`{ty}` cannot declare {what}")]
    BadDeclaration { ty: String, what: &'static str },
    #[error("expected a {want:?} callable, got {got:?}")]
    WrongCallableKind { want: CallableKind, got: CallableKind },
    #[error("`{child}` cannot be registered as an implementor of `{parent}`")]
    BadImplementor { parent: String, child: String },
    #[error("cannot register `{builder}` as a builder for `{target}`: both must be concrete classes")]
    BadBuilder { target: String, builder: String },
    #[error("enum `{0}` must declare at least one constant")]
    EmptyEnum(String),
}

/// The registered type universe: every type, constructor, method, subtype
/// edge, and builder the engine is allowed to reach.
///
/// A schema is populated once, ahead of fuzzing, and immutable afterwards;
/// there is no runtime discovery. The primitive, wrapper, string, and byte
/// types are pre-interned by [`Schema::new`] under the well-known ids on
/// [`TypeId`].
#[derive(Debug, Default)]
pub struct Schema {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
    constructors: HashMap<TypeId, Vec<Arc<Callable>>>,
    methods: HashMap<TypeId, Vec<Arc<Callable>>>,
    subtypes: BTreeMap<TypeId, Vec<TypeId>>,
    supertypes: BTreeMap<TypeId, Vec<TypeId>>,
    builders: HashMap<TypeId, Vec<TypeId>>,
    arrays: HashMap<TypeId, TypeId>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        let mut schema = Schema {
            types: Vec::new(),
            by_name: HashMap::new(),
            constructors: HashMap::new(),
            methods: HashMap::new(),
            subtypes: BTreeMap::new(),
            supertypes: BTreeMap::new(),
            builders: HashMap::new(),
            arrays: HashMap::new(),
        };
        // Interned in the order of the well-known `TypeId` constants.
        for kind in PrimitiveKind::ALL {
            schema.push_type(kind.name().to_owned(), TypeKind::Primitive(kind));
        }
        for kind in PrimitiveKind::ALL {
            schema.push_type(wrapper_name(kind).to_owned(), TypeKind::Wrapper(kind));
        }
        schema.push_type("String".to_owned(), TypeKind::Str);
        schema.push_type("bytes".to_owned(), TypeKind::Bytes);
        debug_assert_eq!(schema.types.len(), TypeId::BYTES.idx() + 1);
        schema
    }

    fn push_type(&mut self, name: String, kind: TypeKind) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(TypeDescriptor::new(id, name.clone(), kind));
        self.by_name.insert(name, id);
        id
    }

    fn declare(&mut self, name: String, kind: TypeKind) -> Result<TypeId, SchemaError> {
        if self.by_name.contains_key(&name) {
            return Err(SchemaError::Duplicate(name));
        }
        Ok(self.push_type(name, kind))
    }

    pub fn declare_class(&mut self, name: impl Into<String>) -> Result<TypeId, SchemaError> {
        self.declare(name.into(), TypeKind::Class)
    }

    pub fn declare_interface(&mut self, name: impl Into<String>) -> Result<TypeId, SchemaError> {
        self.declare(name.into(), TypeKind::Interface)
    }

    pub fn declare_abstract_class(
        &mut self,
        name: impl Into<String>,
    ) -> Result<TypeId, SchemaError> {
        self.declare(name.into(), TypeKind::Abstract)
    }

    /// Declares an enum with its constants in declaration order. At least
    /// one constant is required; generation must be able to return a
    /// valid constant even from an empty stream.
    pub fn declare_enum(
        &mut self,
        name: impl Into<String>,
        constants: Vec<String>,
    ) -> Result<TypeId, SchemaError> {
        let name = name.into();
        if constants.is_empty() {
            return Err(SchemaError::EmptyEnum(name));
        }
        self.declare(name, TypeKind::Enum { constants })
    }

    /// Interns the array type over `elem`, reusing the id on repeat calls.
    pub fn array_of(&mut self, elem: TypeId) -> Result<TypeId, SchemaError> {
        if let Some(&existing) = self.arrays.get(&elem) {
            return Ok(existing);
        }
        let elem_name = self
            .types
            .get(elem.idx())
            .ok_or(SchemaError::Unknown(elem))?
            .name
            .clone();
        let name = format!("{elem_name}[]");
        if self.by_name.contains_key(&name) {
            return Err(SchemaError::Duplicate(name));
        }
        let id = self.push_type(name, TypeKind::Array { elem });
        self.arrays.insert(elem, id);
        Ok(id)
    }

    /// Registers a constructor on its declaring type, which must be a
    /// concrete class.
    pub fn add_constructor(&mut self, ctor: Callable) -> Result<(), SchemaError> {
        if ctor.kind() != CallableKind::Constructor {
            return Err(SchemaError::WrongCallableKind {
                want: CallableKind::Constructor,
                got: ctor.kind(),
            });
        }
        let declaring = ctor.declaring_type();
        self.check_signature(&ctor)?;
        let desc = self.require(declaring)?;
        if desc.kind != TypeKind::Class {
            return Err(SchemaError::BadDeclaration {
                ty: desc.name.clone(),
                what: "constructors",
            });
        }
        self.constructors
            .entry(declaring)
            .or_default()
            .push(Arc::new(ctor));
        Ok(())
    }

    /// Registers a method on its declaring type. Interfaces and abstract
    /// classes may declare methods; their receivers are resolved to a
    /// concrete implementor at generation time.
    pub fn add_method(&mut self, method: Callable) -> Result<(), SchemaError> {
        if method.kind() != CallableKind::Method {
            return Err(SchemaError::WrongCallableKind {
                want: CallableKind::Method,
                got: method.kind(),
            });
        }
        let declaring = method.declaring_type();
        self.check_signature(&method)?;
        let desc = self.require(declaring)?;
        if !matches!(
            desc.kind,
            TypeKind::Class | TypeKind::Interface | TypeKind::Abstract
        ) {
            return Err(SchemaError::BadDeclaration {
                ty: desc.name.clone(),
                what: "methods",
            });
        }
        self.methods
            .entry(declaring)
            .or_default()
            .push(Arc::new(method));
        Ok(())
    }

    fn check_signature(&self, callable: &Callable) -> Result<(), SchemaError> {
        for &param in callable.params() {
            self.require(param)?;
        }
        if let Some(ret) = callable.return_type() {
            self.require(ret)?;
        }
        Ok(())
    }

    /// Records `child` as a direct implementor (or subclass) of `parent`.
    /// Chains through interfaces and abstract classes are allowed; the
    /// transitive closure is taken at lookup time.
    pub fn add_implementor(&mut self, parent: TypeId, child: TypeId) -> Result<(), SchemaError> {
        let parent_desc = self.require(parent)?;
        let child_desc = self.require(child)?;
        let parent_ok = parent_desc.kind.is_polymorphic();
        let child_ok = matches!(
            child_desc.kind,
            TypeKind::Class | TypeKind::Interface | TypeKind::Abstract
        );
        if !parent_ok || !child_ok {
            return Err(SchemaError::BadImplementor {
                parent: parent_desc.name.clone(),
                child: child_desc.name.clone(),
            });
        }
        let children = self.subtypes.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
        let parents = self.supertypes.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        Ok(())
    }

    /// Declares that instances of `target` can be produced through the
    /// fluent `builder` type instead of a direct constructor.
    pub fn declare_builder(&mut self, target: TypeId, builder: TypeId) -> Result<(), SchemaError> {
        let target_desc = self.require(target)?;
        let builder_desc = self.require(builder)?;
        if target_desc.kind != TypeKind::Class || builder_desc.kind != TypeKind::Class {
            return Err(SchemaError::BadBuilder {
                target: target_desc.name.clone(),
                builder: builder_desc.name.clone(),
            });
        }
        let builders = self.builders.entry(target).or_default();
        if !builders.contains(&builder) {
            builders.push(builder);
        }
        Ok(())
    }

    fn require(&self, id: TypeId) -> Result<&TypeDescriptor, SchemaError> {
        self.types.get(id.idx()).ok_or(SchemaError::Unknown(id))
    }

    #[must_use]
    pub fn descriptor(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.idx())
    }

    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Display name for diagnostics; total even for bogus ids.
    #[must_use]
    pub fn name_of(&self, id: TypeId) -> &str {
        self.types
            .get(id.idx())
            .map_or("<unknown>", |desc| desc.name.as_str())
    }

    #[must_use]
    pub fn constructors_of(&self, id: TypeId) -> &[Arc<Callable>] {
        self.constructors.get(&id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn methods_of(&self, id: TypeId) -> &[Arc<Callable>] {
        self.methods.get(&id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn builders_of(&self, id: TypeId) -> &[TypeId] {
        self.builders.get(&id).map_or(&[], Vec::as_slice)
    }

    /// First registered method named `name` on `ty`.
    #[must_use]
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<&Arc<Callable>> {
        self.methods_of(ty).iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn enum_constant_name(&self, id: TypeId, ordinal: usize) -> Option<&str> {
        match &self.descriptor(id)?.kind {
            TypeKind::Enum { constants } => constants.get(ordinal).map(String::as_str),
            _ => None,
        }
    }

    /// Whether a value of type `sub` can be bound where `sup` is expected.
    #[must_use]
    pub fn is_assignable(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        let mut seen: BTreeSet<TypeId> = BTreeSet::new();
        let mut queue: VecDeque<TypeId> = self
            .supertypes
            .get(&sub)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            if next == sup {
                return true;
            }
            if let Some(parents) = self.supertypes.get(&next) {
                queue.extend(parents.iter().copied());
            }
        }
        false
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }
}

/// The schema doubles as the default type index: a breadth-first walk over
/// its registered subtype edges, in registration order.
impl TypeIndex for Schema {
    fn implementors_of(&self, ty: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut seen: BTreeSet<TypeId> = BTreeSet::new();
        let mut queue: VecDeque<TypeId> = self
            .subtypes
            .get(&ty)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(children) = self.subtypes.get(&next) {
                queue.extend(children.iter().copied());
            }
        }

        out
    }
}

fn wrapper_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Byte => "Byte",
        PrimitiveKind::Short => "Short",
        PrimitiveKind::Int => "Int",
        PrimitiveKind::Long => "Long",
        PrimitiveKind::Float => "Float",
        PrimitiveKind::Double => "Double",
        PrimitiveKind::Boolean => "Boolean",
        PrimitiveKind::Char => "Char",
    }
}
