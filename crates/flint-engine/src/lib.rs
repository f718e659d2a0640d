//! Type-directed call synthesis for fuzzing registered APIs.
//!
//! Given a [`Schema`](flint_model::Schema) describing an API surface and a
//! byte stream from the fuzzer, the engine synthesizes well-typed
//! arguments for a target callable, invokes it, and classifies the
//! outcome: a [`TargetError`] is the finding the fuzzer is looking for, a
//! [`ConstructionError`] means the input could not be synthesized for
//! this shape and should be skipped, and a [`FrameworkError`] means the
//! engine itself is broken.
//!
//! Generation is deterministic in the stream contents and the
//! registration order of the schema, which is what makes recorded crash
//! inputs replayable.

mod builder;
mod config;
mod fault;
mod func;
mod generate;
mod invoke;
mod registry;

pub use config::EngineConfig;
pub use fault::{ConstructionError, Fault, FrameworkError, TargetError};
pub use func::{FunctionFn, FunctionTarget};
pub use registry::ImplementationRegistry;

use std::fmt;
use std::sync::Arc;

use flint_model::{Callable, Schema, TypeId, TypeIndex, Value};
use flint_provider::DataProvider;

use crate::generate::Ctx;

/// What one fuzz iteration drives: a callable registered in the schema,
/// or a plain function value carrying its own type tags.
#[derive(Clone, Debug)]
pub enum FuzzTarget {
    Callable(Arc<Callable>),
    Function(FunctionTarget),
}

/// The engine: a schema, an implementor cache over its type index, and
/// the configuration.
///
/// One instance serves any number of runs; concurrent fuzz workers may
/// share it, while each run exclusively owns its provider.
pub struct Autofuzz {
    schema: Arc<Schema>,
    index: Arc<dyn TypeIndex>,
    registry: ImplementationRegistry,
    config: EngineConfig,
}

impl Autofuzz {
    /// Engine over `schema` with default configuration; the schema's own
    /// registration edges serve as the type index.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(schema: Arc<Schema>, config: EngineConfig) -> Self {
        let index: Arc<dyn TypeIndex> = schema.clone();
        Self::with_index(schema, index, config)
    }

    /// Full control: a separate type index (memoized by the engine's
    /// registry, never by the index itself).
    #[must_use]
    pub fn with_index(
        schema: Arc<Schema>,
        index: Arc<dyn TypeIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            schema,
            index,
            registry: ImplementationRegistry::new(),
            config,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ImplementationRegistry {
        &self.registry
    }

    /// Synthesizes arguments for `target` from the stream and invokes it.
    ///
    /// Constructors and functions produce their value; methods without a
    /// return type complete with the absent value.
    pub fn run(&self, data: &mut dyn DataProvider, target: &FuzzTarget) -> Result<Value, Fault> {
        match target {
            FuzzTarget::Callable(callable) => self.run_callable(data, callable),
            FuzzTarget::Function(func) => self.run_function(data, func),
        }
    }

    pub fn run_callable(
        &self,
        data: &mut dyn DataProvider,
        callable: &Arc<Callable>,
    ) -> Result<Value, Fault> {
        invoke::run(&self.ctx(), data, callable)
    }

    pub fn run_function(
        &self,
        data: &mut dyn DataProvider,
        func: &FunctionTarget,
    ) -> Result<Value, Fault> {
        func::run(&self.ctx(), data, func)
    }

    /// Generates a standalone value of `ty`; the generator's public face.
    pub fn consume(&self, data: &mut dyn DataProvider, ty: TypeId) -> Result<Value, Fault> {
        generate::consume(&self.ctx(), data, ty, 0)
    }

    /// Drops the memoized implementor list for `ty`; the next request
    /// rescans the index.
    pub fn invalidate_implementors(&self, ty: TypeId) {
        self.registry.invalidate(ty);
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx {
            schema: &self.schema,
            index: self.index.as_ref(),
            registry: &self.registry,
            config: &self.config,
        }
    }
}

impl fmt::Debug for Autofuzz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autofuzz")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
