//! A small field-validation engine for JSON-shaped data.
//! It turns loosely typed input into validated field mappings and formats
//! attributes back into plain data, with an extension point for class creation
//! that generic schemas build upon.
//!
//! # Core Features
//!
//! - **Class Objects**: Immutable, shared [`SchemaClass`] descriptions with field inheritance,
//!   parameterized bases and typed class-level state.
//! - **Aggregated Validation**: Every record of a call is validated before anything else runs;
//!   all messages are reported together with their input paths.
//! - **Post-Load Hooks**: [`PostLoad`] callbacks turn validated mappings into domain objects.
//! - **Unknown-Field Policy**: [`Unknown::Exclude`], [`Unknown::Include`] or [`Unknown::Raise`].
//! - **Subclass Extensions**: [`InitSubclass`] runs when a subclass is built, before it is published.
//!
//! # Architectural Overview
//!
//! 1.  **[`SchemaClass`]** / **[`ClassBuilder`]**: declaration, built once and shared through `Arc`.
//! 2.  **[`Schema`]**: a configured instance running load and dump.
//! 3.  **[`TypeArg`]** / **[`TypeParam`]**: runtime handles for generic parameterization.
//!
//! # Examples
//!
//! ```rust
//! use gschema_engine::{Field, LoadOptions, Schema, SchemaClass, SchemaError};
//! use serde_json::json;
//!
//! fn main() -> Result<(), SchemaError> {
//!     let class = SchemaClass::builder("Point")
//!         .field("x", Field::integer().required())
//!         .field("y", Field::integer().load_default(0))
//!         .build()?;
//!
//!     let schema = Schema::new(&class)?;
//!     let loaded = schema.load_one(&json!({"x": "3"}))?;
//!     assert_eq!(loaded.as_data().and_then(|d| d.get("y")), Some(&json!(0)));
//!
//!     let err = schema.load(&json!({"y": 1}), &LoadOptions::default()).unwrap_err();
//!     assert_eq!(err.kind(), "Validation");
//!     Ok(())
//! }
//! ```

mod class;
mod error;
mod field;
mod generics;
mod hooks;
mod options;
mod schema;

pub use class::{Base, ClassBuilder, ClassDraft, Extensions, InitSubclass, SchemaClass};
pub use error::{FieldMessage, HookError, SCHEMA_KEY, SchemaError, SchemaErrorExt, ValidationError};
pub use field::{Field, FieldKind};
pub use generics::{ConstructError, Model, Signature, TypeArg, TypeParam, TypeVar};
pub use hooks::{LoadMeta, Loaded, PostLoad, PostLoadFn};
pub use options::{EXCLUDE, INCLUDE, LoadOptions, Partial, RAISE, SchemaOptions, SchemaOpts, Unknown};
pub use schema::{LoadOutput, Schema};

/// A validated field mapping: attribute name to coerced value.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

pub mod prelude {
    pub use crate::{
        Field, FieldMap, LoadOptions, Loaded, Partial, PostLoad, Schema, SchemaClass, SchemaError,
        SchemaOptions, SchemaOpts, TypeArg, TypeParam, TypeVar, Unknown,
    };
}
