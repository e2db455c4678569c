pub mod fixtures;

use fixtures::*;
use gschema_engine::{Field, LoadOptions, SchemaError, SchemaOpts, TypeArg, Unknown};
use gschema_generic::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[test]
fn test_dump_and_load_roundtrip() {
    let schema = foo_schema();
    let foo = Foo { field1: 1, field2: "test".to_owned() };

    let dumped = schema.dump(&foo).expect("Dump failed");
    assert_eq!(serde_json::Value::Object(dumped.clone()), json!({"field1": 1, "field2": "test"}));

    let loaded: Foo = schema.load(&serde_json::Value::Object(dumped)).expect("Load failed");
    assert_eq!(loaded, foo);

    let text = schema.dumps(&foo).expect("Dumps failed");
    assert_eq!(text, r#"{"field1":1,"field2":"test"}"#);
    assert_eq!(schema.loads(&text).expect("Loads failed"), foo);
}

#[test]
fn test_collection_mode() {
    let schema = foo_schema();
    let foos = vec![
        Foo { field1: 2, field2: "b".to_owned() },
        Foo { field1: 1, field2: "a".to_owned() },
    ];

    let text = schema.dumps_many(&foos).expect("Dumps failed");
    assert_eq!(schema.loads_many(&text).expect("Loads failed"), foos);
    assert!(schema.load_many(&json!([])).expect("Empty load failed").is_empty());
}

#[test]
fn test_load_with_runtime_flag() {
    let mut schema = foo_schema();
    let input = json!([{"field1": 1, "field2": "x"}]);

    let many = schema.load_with(&input, &LoadOptions::collection()).expect("Load failed");
    assert!(matches!(many, Deserialized::Many(ref items) if items.len() == 1));

    schema.set_many(true);
    let default_many = schema.load_with(&input, &LoadOptions::default()).expect("Load failed");
    assert_eq!(default_many.into_vec().len(), 1);
}

#[test]
fn test_validation_failure_is_reported_by_the_engine() {
    let schema = foo_schema();
    let err = schema.load(&json!({"field1": "one", "field2": "x"})).unwrap_err();

    assert!(matches!(err, GenericError::Schema { source: SchemaError::Validation { .. }, .. }));
    let validation = err.validation().expect("Validation messages expected");
    assert_eq!(validation.messages_for("field1"), vec!["Not a valid integer."]);
}

#[test]
fn test_construction_failure_is_not_a_validation_failure() {
    // `field2` is optional on the schema but required by the constructor.
    let schema = GenericSchema::<Foo>::define("LooseFooSchema")
        .field("field1", Field::integer())
        .field("field2", Field::string())
        .build()
        .expect("Definition failed");

    let err = schema.load(&json!({"field1": 1})).unwrap_err();
    assert!(matches!(err, GenericError::Construction { .. }), "got {err:?}");
    assert!(err.validation().is_none());
}

#[test]
fn test_undeclared_constructor_parameter_fails_construction() {
    let schema = GenericSchema::<Foo>::define("PartialFooSchema")
        .field("field1", Field::integer())
        .build()
        .expect("Definition failed");

    let err = schema.load(&json!({"field1": 1})).unwrap_err();
    assert_eq!(err.kind(), "Construction");
    assert!(err.to_string().contains("field2"), "got {err}");
    assert!(err.validation().is_none());

    let err = schema.load_many(&json!([{"field1": 1}, {"field1": 2}])).unwrap_err();
    assert!(matches!(err, GenericError::Construction { .. }), "got {err:?}");
}

#[test]
fn test_unknown_keys_reach_the_constructor_when_included() {
    let schema = GenericSchema::<Foo>::define("IncludeSchema")
        .field("field1", Field::integer())
        .field("field2", Field::string())
        .opts(SchemaOpts { unknown: Unknown::Include, many: false })
        .build()
        .expect("Definition failed");

    let err = schema.load(&json!({"field1": 1, "field2": "x", "extra": 0})).unwrap_err();
    assert_eq!(err.kind(), "Construction");
}

#[test]
fn test_unbound_class_fails_on_first_load() {
    let class = gschema_engine::SchemaClass::builder("StillGeneric")
        .extends(gschema_generic::base_class())
        .field("field1", Field::integer())
        .build()
        .expect("Definition failed");
    let schema = GenericSchema::<Foo>::from_class(&class).expect("Unbound classes are accepted");

    let err = schema.load(&json!({"field1": 1})).unwrap_err();
    assert!(matches!(err, GenericError::UnboundTypeArg { index: 0, .. }), "got {err:?}");
}

#[test]
fn test_from_class_rejects_other_bindings() {
    let bar = GenericSchema::<Bar>::define("BarSchema")
        .field("name", Field::string())
        .build()
        .expect("Definition failed");

    let err = GenericSchema::<Foo>::from_class(bar.class()).unwrap_err();
    assert_eq!(err.kind(), "TypeMismatch");

    let plain = gschema_engine::SchemaClass::builder("Plain").build().expect("Definition failed");
    let err = GenericSchema::<Foo>::from_class(&plain).unwrap_err();
    assert_eq!(err.kind(), "NotGenericSchema");
}

#[test]
fn test_subclass_keeps_the_binding() {
    let parent = foo_schema();
    let child = gschema_engine::SchemaClass::builder("ChildSchema")
        .extends(parent.class())
        .build()
        .expect("Definition failed");

    let schema = GenericSchema::<Foo>::from_class(&child).expect("Binding is inherited");
    let foo = schema.load(&json!({"field1": 5, "field2": "five"})).expect("Load failed");
    assert_eq!(foo.field1, 5);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Empty {}

#[test]
fn test_empty_dump() {
    let schema = GenericSchema::<Empty>::define_with("EmptySchema", TypeArg::of::<Empty>())
        .build()
        .expect("Definition failed");

    assert_eq!(schema.dumps(&Empty {}).expect("Dumps failed"), "{}");
    assert_eq!(schema.dumps_many(&[Empty {}]).expect("Dumps failed"), "[{}]");
    assert!(schema.dump(&Empty {}).expect("Dump failed").is_empty());
    assert_eq!(schema.load(&json!({})).expect("Load failed"), Empty {});
}
