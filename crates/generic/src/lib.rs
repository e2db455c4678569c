//! Typed schemas over the `gschema-engine` validation engine.
//!
//! A schema class declared once as generic over a domain type keeps that type
//! as class-level state. Every load entry point then returns the domain type
//! itself, or a `Vec` of it, without the caller repeating annotations.
//!
//! # Core Features
//!
//! - **Type-Argument Registry**: [`GenericInsight`] records the concrete types bound
//!   to up to [`MAX_TYPE_ARGS`] generic positions when a class is built.
//! - **Construction Hook**: [`Instantiate`] turns each validated record into the bound type.
//! - **Typed Entry Points**: [`GenericSchema`] exposes `load`, `load_many`, `loads`,
//!   `loads_many`, `dump` and `dumps` over the bound type.
//!
//! # Examples
//!
//! ```rust
//! use gschema_engine::{Field, TypeArg};
//! use gschema_generic::{GenericError, GenericSchema};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Foo {
//!     field1: i64,
//!     field2: String,
//! }
//!
//! fn main() -> Result<(), GenericError> {
//!     let schema = GenericSchema::<Foo>::define_with("FooSchema", TypeArg::of::<Foo>())
//!         .field("field1", Field::integer())
//!         .field("field2", Field::string())
//!         .build()?;
//!
//!     let foo: Foo = schema.load(&json!({"field1": 1, "field2": "test"}))?;
//!     assert_eq!(foo, Foo { field1: 1, field2: "test".to_owned() });
//!     assert_eq!(schema.dumps(&foo)?, r#"{"field1":1,"field2":"test"}"#);
//!     Ok(())
//! }
//! ```

mod error;
mod registry;
mod schema;

pub use error::{GenericError, GenericErrorExt};
pub use registry::{GenericInsight, MAX_TYPE_ARGS, Slot, TypeArgCapture, TypeArgs};
pub use schema::{Deserialized, GenericSchema, GenericSchemaBuilder, Instantiate, base_class};

pub mod prelude {
    pub use crate::{Deserialized, GenericError, GenericInsight, GenericSchema};
}
