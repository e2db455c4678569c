use crate::registry::MAX_TYPE_ARGS;
use gschema_engine::{ConstructError, SchemaError};
use std::borrow::Cow;

/// A specialized [`GenericError`] enum for generic schema operations.
#[gschema_derive::schema_error]
pub enum GenericError {
    /// The slot holds no concrete type: the class is still generic, bound the
    /// position to "no type", or never inherited the type-argument capture.
    #[error("Type argument {index} of `{class}` is not bound{}", format_context(.context))]
    UnboundTypeArg { class: Cow<'static, str>, index: usize, context: Option<Cow<'static, str>> },

    #[error(
        "Type argument index {index} is out of range, expected 0..{}{}",
        MAX_TYPE_ARGS,
        format_context(.context)
    )]
    SlotOutOfRange { index: usize, context: Option<Cow<'static, str>> },

    /// The bound type rejected the validated field mapping.
    #[error("Construction failed{}: {source}", format_context(.context))]
    Construction { source: ConstructError, context: Option<Cow<'static, str>> },

    #[error(
        "`{class}` produces `{found}`, not `{expected}`{}",
        format_context(.context)
    )]
    TypeMismatch {
        class: Cow<'static, str>,
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("`{class}` does not derive from GenericSchema{}", format_context(.context))]
    NotGenericSchema { class: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Errors owned by the engine, validation failures included, passed through unchanged.
    #[error("{source}{}", format_context(.context))]
    Schema { source: SchemaError, context: Option<Cow<'static, str>> },

    #[error("Internal generic schema error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl GenericError {
    /// Converts an engine error from a load call, recovering errors raised by
    /// the construction hook under their own kind.
    #[must_use]
    pub fn surface(err: SchemaError) -> Self {
        let (source, context) = match err {
            SchemaError::Hook { source, context } => (source, context),
            other => return Self::Schema { source: other, context: None },
        };
        let source = match source.downcast::<Self>() {
            Ok(generic) => return *generic,
            Err(source) => source,
        };
        match source.downcast::<ConstructError>() {
            Ok(construct) => Self::Construction { source: *construct, context: None },
            Err(source) => Self::Schema { source: SchemaError::Hook { source, context }, context: None },
        }
    }

    /// Returns the engine's validation messages if the load failed validation.
    #[must_use]
    pub const fn validation(&self) -> Option<&gschema_engine::ValidationError> {
        match self {
            Self::Schema { source, .. } => source.validation(),
            _ => None,
        }
    }
}
