//! Facade crate for generic schemas.
//! Re-exports the validation engine, the typed generic layer and the derive macros.
//! Keep this crate thin: it should compose other crates, not implement schema logic.
//!
//! ## Usage
//! - Declare domain types with [`macro@model`].
//! - Bind a schema class to one with [`GenericSchema::define`].
//! - Load and dump through the typed entry points.
//!
//! ```rust
//! use gschema::prelude::*;
//! use gschema::serde_json::json;
//!
//! #[model]
//! pub struct Foo {
//!     pub field1: i64,
//!     pub field2: String,
//! }
//!
//! fn main() -> Result<(), GenericError> {
//!     let schema = GenericSchema::<Foo>::define("FooSchema")
//!         .field("field1", Field::integer())
//!         .field("field2", Field::string())
//!         .build()?;
//!
//!     let foo = schema.load(&json!({"field1": 1, "field2": "test"}))?;
//!     assert_eq!(foo, Foo { field1: 1, field2: "test".to_owned() });
//!     Ok(())
//! }
//! ```

#[cfg(feature = "config")]
pub mod config;

pub use gschema_derive::{model, schema_error};
pub use gschema_engine as engine;
pub use gschema_engine::{
    EXCLUDE, Field, FieldMap, INCLUDE, LoadOptions, Model, Partial, RAISE, Schema, SchemaClass,
    SchemaError, SchemaOptions, SchemaOpts, TypeArg, TypeParam, TypeVar, Unknown,
};
pub use gschema_generic as generic;
pub use gschema_generic::{
    Deserialized, GenericError, GenericInsight, GenericSchema, Instantiate, MAX_TYPE_ARGS, base_class,
};

// Paths used by `#[model]` expansions.
pub use serde;
pub use serde_json;

pub mod prelude {
    pub use crate::{
        Deserialized, Field, GenericError, GenericInsight, GenericSchema, LoadOptions, Model,
        SchemaClass, SchemaOptions, SchemaOpts, TypeArg, TypeParam, Unknown, model,
    };
}
