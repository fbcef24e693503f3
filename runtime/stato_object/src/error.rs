//! Error types.
//!
//! Configuration problems (`BuildError`, `FactoryError`, `ConfigError`) are
//! reported eagerly while a shape is being registered or built. Access
//! problems (`AccessError`) are reported on every accessor call when safety
//! checks are on.

use stato_layout::{Kind, LayoutError};

/// Which write-once slot of a property was initialised twice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitSlot {
    Kind,
    Offset,
    Shape,
}

impl InitSlot {
    fn name(self) -> &'static str {
        match self {
            InitSlot::Kind => "kind",
            InitSlot::Offset => "offset",
            InitSlot::Shape => "shape",
        }
    }
}

impl std::fmt::Display for InitSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Misuse of a property's write-once fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error(
        "attempt to reinitialize the {what} of static property '{id}' of type '{}'; \
         was it added to more than one builder or multiple times to the same builder?",
        kind_name(*.kind)
    )]
    AlreadyInitialized {
        id: String,
        /// Declared kind, if the property got that far.
        kind: Option<Kind>,
        what: InitSlot,
    },
}

fn kind_name(kind: Option<Kind>) -> &'static str {
    kind.map_or("unknown", Kind::name)
}

/// Failure while registering properties or building a shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("property id cannot be empty")]
    InvalidId,

    #[error("a property with id '{id}' is already registered to this builder")]
    DuplicateId { id: String },

    #[error("this builder already contains the maximum number of properties: {limit}")]
    TooManyProperties { limit: usize },

    #[error("this builder instance has already been used")]
    BuilderClosed,

    #[error("parent shape belongs to a different object model")]
    ModelMismatch,

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    InvalidFactory(#[from] FactoryError),
}

/// Invalid storage base type or factory interface, or a factory call that
/// does not match its declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("'{name}' must be an interface")]
    NotAnInterface { name: String },

    #[error("method '{method}' does not match any visible constructor of the storage base type")]
    NoMatchingConstructor { method: String },

    #[error("method '{method}' returns '{returns}', which is not assignable from '{base}'")]
    ReturnTypeNotAssignable {
        method: String,
        returns: String,
        base: String,
    },

    #[error("factory has no method named '{method}'")]
    UnknownMethod { method: String },

    #[error("arguments do not match the parameters of factory method '{method}'")]
    ArgumentMismatch { method: String },
}

/// Failure of the sub-word compare-and-exchange emulation.
///
/// Offsets produced by the layout engine are always aligned, so these only
/// surface when storage is addressed with hand-made offsets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CasError {
    #[error("unsupported access width {width}")]
    UnsupportedWidth { width: u32 },

    #[error("{width}-byte access at offset {offset} spans two words")]
    SpansWords { offset: u32, width: u32 },
}

/// Failure of a typed accessor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("static property '{id}' of type '{declared}' cannot be accessed as '{requested}'")]
    KindMismatch {
        id: String,
        declared: Kind,
        requested: Kind,
    },

    #[error("incompatible shape on property access: '{id}' does not belong to the object's shape")]
    ShapeMismatch { id: String },

    #[error("static property '{id}' has not been built into a shape yet")]
    Unbound { id: String },

    #[error(transparent)]
    Cas(#[from] CasError),
}

/// Invalid or repeated process-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("the global object model is already configured")]
    AlreadyConfigured,

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}
