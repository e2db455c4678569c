//! # Type Parameters and Arguments
//!
//! Schema classes may be declared generic over named type variables. A subclass
//! binds those variables by passing [`TypeParam`]s for each position of its
//! generic base. A bound position carries a [`TypeArg`]: a runtime handle to a
//! concrete Rust type that knows how to construct itself from a field mapping.

use crate::FieldMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A domain type a schema can construct with keyword-argument semantics.
///
/// Usually implemented through the `#[model]` attribute rather than by hand.
pub trait Model: Serialize + DeserializeOwned + Send + 'static {
    /// Human-readable type name used in diagnostics.
    const NAME: &'static str;
    /// Every key the constructor accepts.
    const FIELDS: &'static [&'static str];
    /// Keys the constructor cannot do without.
    const REQUIRED: &'static [&'static str];
}

/// A named placeholder declared by a generic class, e.g. `T0` or `Model`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar(Cow<'static, str>);

impl TypeVar {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Constructor parameters of a type, as far as they are known statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub accepted: &'static [&'static str],
    pub required: &'static [&'static str],
}

impl Signature {
    /// Returns the parameters that `fields` cannot satisfy.
    ///
    /// The first list holds required parameters missing from `fields`, the second
    /// holds field names the constructor would not accept.
    #[must_use]
    pub fn mismatch<'a>(&self, fields: &[&'a str]) -> (Vec<&'static str>, Vec<&'a str>) {
        let missing = self.required.iter().copied().filter(|req| !fields.contains(req)).collect();
        let extra = fields.iter().copied().filter(|name| !self.accepted.contains(name)).collect();
        (missing, extra)
    }
}

/// Failure raised while constructing a bound type from a field mapping.
#[derive(Debug, thiserror::Error)]
#[error("Cannot construct `{type_name}`: {source}")]
pub struct ConstructError {
    pub type_name: Cow<'static, str>,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ConstructError {
    pub fn new(
        type_name: impl Into<Cow<'static, str>>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self { type_name: type_name.into(), source: source.into() }
    }
}

type Factory =
    dyn Fn(FieldMap) -> Result<Box<dyn Any + Send>, ConstructError> + Send + Sync + 'static;

struct TypeArgInner {
    id: TypeId,
    name: &'static str,
    signature: Option<Signature>,
    factory: Box<Factory>,
}

/// A concrete type bound to a generic position.
///
/// Cloning is cheap; clones share the same handle, so [`TypeArg::ptr_eq`]
/// identifies the exact registration a class recorded.
#[derive(Clone)]
pub struct TypeArg(Arc<TypeArgInner>);

impl TypeArg {
    /// Binds `T`, constructed by deserializing the field mapping as keyword arguments.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::build::<T, _>(None, deserialize_from_fields::<T>)
    }

    /// Binds a [`Model`], keeping its constructor signature for diagnostics.
    #[must_use]
    pub fn model<T: Model>() -> Self {
        Self::build::<T, _>(
            Some(Signature { accepted: T::FIELDS, required: T::REQUIRED }),
            deserialize_from_fields::<T>,
        )
    }

    /// Binds `T` with a custom constructor.
    #[must_use]
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn(FieldMap) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        Self::build::<T, _>(None, factory)
    }

    fn build<T, F>(signature: Option<Signature>, factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn(FieldMap) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        let factory: Box<Factory> =
            Box::new(move |fields| factory(fields).map(|value| Box::new(value) as Box<dyn Any + Send>));
        Self(Arc::new(TypeArgInner {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            signature,
            factory,
        }))
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    #[must_use]
    pub fn signature(&self) -> Option<Signature> {
        self.0.signature
    }

    /// Returns `true` if this handle binds `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.0.id == TypeId::of::<T>()
    }

    /// Returns `true` for the unit type, which stands for "no type" in a position.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.is::<()>()
    }

    /// Returns `true` if both handles are the same registration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Invokes the bound type's constructor with `fields` as keyword arguments.
    ///
    /// # Errors
    /// Returns [`ConstructError`] if the constructor rejects the mapping.
    pub fn construct(&self, fields: FieldMap) -> Result<Box<dyn Any + Send>, ConstructError> {
        (self.0.factory)(fields)
    }
}

impl PartialEq for TypeArg {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeArg {}

impl fmt::Debug for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeArg").field(&self.0.name).finish()
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

fn deserialize_from_fields<T>(fields: FieldMap) -> Result<T, ConstructError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|err| ConstructError::new(std::any::type_name::<T>(), err))
}

/// One argument passed to a generic base at declaration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeParam {
    /// Still open: the subclass re-exports the variable.
    Var(TypeVar),
    /// Explicitly "no type" for this position.
    Absent,
    /// A concrete type.
    Concrete(TypeArg),
}

impl TypeParam {
    /// Binds `T`; the unit type maps to [`TypeParam::Absent`].
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            Self::Absent
        } else {
            Self::Concrete(TypeArg::of::<T>())
        }
    }

    #[must_use]
    pub fn model<T: Model>() -> Self {
        Self::Concrete(TypeArg::model::<T>())
    }

    pub fn var(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Var(TypeVar::new(name))
    }

    #[must_use]
    pub const fn absent() -> Self {
        Self::Absent
    }

    /// Returns the concrete type when this parameter binds a real one.
    #[must_use]
    pub fn concrete(&self) -> Option<&TypeArg> {
        match self {
            Self::Concrete(arg) if !arg.is_absent() => Some(arg),
            _ => None,
        }
    }
}

impl From<TypeArg> for TypeParam {
    fn from(arg: TypeArg) -> Self {
        Self::Concrete(arg)
    }
}

impl From<TypeVar> for TypeParam {
    fn from(var: TypeVar) -> Self {
        Self::Var(var)
    }
}
