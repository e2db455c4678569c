use gschema_engine::{Field, Model};
use gschema_generic::GenericSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Foo {
    pub field1: i64,
    pub field2: String,
}

impl Model for Foo {
    const NAME: &'static str = "Foo";
    const FIELDS: &'static [&'static str] = &["field1", "field2"];
    const REQUIRED: &'static [&'static str] = &["field1", "field2"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bar {
    pub name: String,
}

impl Model for Bar {
    const NAME: &'static str = "Bar";
    const FIELDS: &'static [&'static str] = &["name"];
    const REQUIRED: &'static [&'static str] = &["name"];
}

/// Builds the canonical `FooSchema`: two plain fields bound to [`Foo`].
/// # Panics
/// * If the class definition fails, the function will panic.
#[must_use]
pub fn foo_schema() -> GenericSchema<Foo> {
    GenericSchema::<Foo>::define("FooSchema")
        .field("field1", Field::integer())
        .field("field2", Field::string())
        .build()
        .expect("FooSchema definition failed")
}
