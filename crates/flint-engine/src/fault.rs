use flint_model::TargetCause;

/// Classification of a failed generate-and-invoke attempt.
///
/// The three kinds have strictly distinct propagation. `Target` is the
/// genuine finding and reaches the harness with its cause intact.
/// `Construction` means "could not synthesize an input for this shape"
/// and should make the harness discard the attempt. `Framework` means the
/// engine itself violated an invariant and is broken.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl Fault {
    #[must_use]
    pub fn is_framework(&self) -> bool {
        matches!(self, Fault::Framework(_))
    }

    #[must_use]
    pub fn is_target(&self) -> bool {
        matches!(self, Fault::Target(_))
    }

    #[must_use]
    pub fn is_construction(&self) -> bool {
        matches!(self, Fault::Construction(_))
    }

    /// Reclassifies a fault caught while synthesizing a value of `ty` for
    /// an argument slot (or a builder stage).
    ///
    /// A construction fault passes through untouched so it is never
    /// nested. A target fault is demoted to construction carrying its
    /// original cause: a crash inside a nested constructor is an input we
    /// failed to build, not a finding about the outer callable. Anything
    /// else is wrapped, keeping the inner fault as the source.
    pub(crate) fn downgrade(self, ty: &str) -> Fault {
        match self {
            Fault::Construction(inner) => Fault::Construction(inner),
            Fault::Target(target) => Fault::Construction(ConstructionError::NestedTarget {
                ty: ty.to_owned(),
                cause: target.into_cause(),
            }),
            Fault::Framework(framework) => Fault::Construction(ConstructionError::Internal {
                ty: ty.to_owned(),
                source: framework,
            }),
        }
    }
}

/// Internal invariant violation: an invalid generated call shape, an
/// unresolved type tag, or a generated value that does not conform to its
/// requested type. Always fatal for the current input, never retried.
#[derive(Debug, thiserror::Error)]
#[error("autofuzz invariant violated: {message}")]
pub struct FrameworkError {
    message: String,
}

impl FrameworkError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The callable under test raised during its own execution. Carries the
/// original cause unmodified, panic payloads included, so the harness can
/// report or re-raise it verbatim.
#[derive(Debug, thiserror::Error)]
#[error("`{location}` raised: {cause}")]
pub struct TargetError {
    location: String,
    cause: TargetCause,
}

impl TargetError {
    pub(crate) fn new(location: String, cause: TargetCause) -> Self {
        Self { location, cause }
    }

    /// Which callable raised, as `DeclaringType::name`.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn cause(&self) -> &TargetCause {
        &self.cause
    }

    #[must_use]
    pub fn into_cause(self) -> TargetCause {
        self.cause
    }
}

/// Argument synthesis failed. Never a statement about the code under
/// test.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("no concrete implementor registered for `{ty}`")]
    NoImplementor { ty: String },
    #[error("no receiver could be synthesized for `{ty}`")]
    NoReceiver { ty: String },
    #[error("builder `{builder}` declares no terminal operation returning `{target}`")]
    NoTerminalOp { target: String, builder: String },
    #[error("builder `{builder}` has no registered constructor")]
    NoBuilderConstructor { builder: String },
    /// A nested target raised while the argument was being built; the
    /// cause is preserved but this is not a reportable finding.
    #[error("target raised while constructing `{ty}`: {cause}")]
    NestedTarget { ty: String, cause: TargetCause },
    #[error("could not construct `{ty}`")]
    Internal {
        ty: String,
        #[source]
        source: FrameworkError,
    },
}
