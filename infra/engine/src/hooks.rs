//! # Post-Load Hooks
//!
//! Hooks run once per record, after the whole load call validated, in
//! registration order. Each hook receives the previous hook's output.

use crate::error::HookError;
use crate::options::Partial;
use crate::schema::Schema;
use crate::FieldMap;
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// The value threaded through the post-load hooks of one record.
pub enum Loaded {
    /// The validated field mapping, as produced by the engine.
    Data(FieldMap),
    /// An object a hook constructed from the mapping.
    Object(Box<dyn Any + Send>),
}

impl Loaded {
    /// Returns the mapping if no hook replaced it yet.
    #[must_use]
    pub const fn as_data(&self) -> Option<&FieldMap> {
        match self {
            Self::Data(fields) => Some(fields),
            Self::Object(_) => None,
        }
    }

    /// Recovers a constructed object of type `T`.
    ///
    /// # Errors
    /// Gives `self` back unchanged if it holds a mapping or an object of another type.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        match self {
            Self::Object(object) => object.downcast::<T>().map(|b| *b).map_err(Self::Object),
            data @ Self::Data(_) => Err(data),
        }
    }
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(fields) => f.debug_tuple("Data").field(fields).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Call-level facts a hook may consult.
#[derive(Debug, Clone, Copy)]
pub struct LoadMeta<'a> {
    /// Whether the call loads a collection.
    pub many: bool,
    /// Position of the record within the collection.
    pub index: Option<usize>,
    /// The record exactly as received.
    pub original: &'a Value,
    pub partial: &'a Partial,
}

/// A callback applied to each validated record.
pub trait PostLoad: fmt::Debug + Send + Sync + 'static {
    /// Transforms the record's value.
    ///
    /// # Errors
    /// Any error aborts the load call and reaches the caller as
    /// [`SchemaError::Hook`](crate::SchemaError::Hook) with this error as its source.
    fn post_load(&self, schema: &Schema, data: Loaded, meta: &LoadMeta<'_>) -> Result<Loaded, HookError>;
}

/// Adapts a closure into a [`PostLoad`] hook.
pub struct PostLoadFn<F> {
    name: &'static str,
    hook: F,
}

impl<F> PostLoadFn<F>
where
    F: Fn(&Schema, Loaded, &LoadMeta<'_>) -> Result<Loaded, HookError> + Send + Sync + 'static,
{
    pub const fn new(name: &'static str, hook: F) -> Self {
        Self { name, hook }
    }
}

impl<F> fmt::Debug for PostLoadFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostLoadFn").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<F> PostLoad for PostLoadFn<F>
where
    F: Fn(&Schema, Loaded, &LoadMeta<'_>) -> Result<Loaded, HookError> + Send + Sync + 'static,
{
    fn post_load(&self, schema: &Schema, data: Loaded, meta: &LoadMeta<'_>) -> Result<Loaded, HookError> {
        (self.hook)(schema, data, meta)
    }
}
