//! # Schema Errors
//!
//! This module defines the [`SchemaError`] enum reported by the engine and the
//! [`ValidationError`] collection produced when input fails field validation.

use std::borrow::Cow;
use std::fmt;

/// Error type returned by post-load hooks.
///
/// Hooks may fail for reasons the engine knows nothing about; the boxed error is
/// carried through [`SchemaError::Hook`] untouched so callers can downcast it.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) const MISSING: &str = "Missing data for required field.";
pub(crate) const NULL: &str = "Field may not be null.";
pub(crate) const UNKNOWN_FIELD: &str = "Unknown field.";
pub(crate) const INVALID_INPUT: &str = "Invalid input type.";

/// Key used for errors about the record as a whole rather than one field.
pub const SCHEMA_KEY: &str = "_schema";

/// A specialized [`SchemaError`] enum for engine failures.
#[gschema_derive::schema_error]
pub enum SchemaError {
    /// Input failed field validation. Post-load hooks were not invoked.
    #[error("Validation error{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },

    /// The text payload could not be decoded, or the output could not be encoded.
    #[error("Codec error{}: {source}", format_context(.context))]
    Codec { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A post-load hook failed; the hook's own error is preserved as the source.
    #[error("Post-load hook failed{}: {source}", format_context(.context))]
    Hook { source: HookError, context: Option<Cow<'static, str>> },

    /// A class or schema instance was declared inconsistently.
    #[error("Invalid schema definition{}: {message}", format_context(.context))]
    Definition { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An object could not be serialized through the schema's fields.
    #[error("Dump error{}: {message}", format_context(.context))]
    Dump { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal schema error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SchemaError {
    pub(crate) fn definition(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Definition { message: message.into(), context: None }
    }

    pub(crate) fn dump(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Dump { message: message.into(), context: None }
    }

    /// Returns the validation messages if this is a validation failure.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A single validation message bound to the path of the offending input.
///
/// Paths use the input keys (`data_key` when set) joined by `.`; records of a
/// collection are prefixed by their index, e.g. `1.field2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub path: String,
    pub message: Cow<'static, str>,
}

impl fmt::Display for FieldMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All messages gathered while validating one load call.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    messages: Vec<FieldMessage>,
}

impl ValidationError {
    /// Records a message for `path`.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<Cow<'static, str>>) {
        self.messages.push(FieldMessage { path: path.into(), message: message.into() });
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn messages(&self) -> &[FieldMessage] {
        &self.messages
    }

    /// Returns the messages recorded for exactly `path`.
    #[must_use]
    pub fn messages_for(&self, path: &str) -> Vec<&str> {
        self.messages.iter().filter(|m| m.path == path).map(|m| m.message.as_ref()).collect()
    }

    /// Returns `true` if any message was recorded for `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.messages.iter().any(|m| m.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}
