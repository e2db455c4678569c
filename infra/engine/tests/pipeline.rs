use gschema_engine::prelude::*;
use gschema_engine::{HookError, LoadMeta, LoadOutput, PostLoadFn};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Counter(Arc<AtomicUsize>);

impl PostLoad for Counter {
    fn post_load(&self, _: &Schema, data: Loaded, _: &LoadMeta<'_>) -> Result<Loaded, HookError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(data)
    }
}

fn tagging_hook(
    _: &Schema,
    data: Loaded,
    meta: &LoadMeta<'_>,
) -> Result<Loaded, HookError> {
    let Loaded::Data(mut fields) = data else {
        return Err("expected a mapping".into());
    };
    fields.insert("index".to_owned(), meta.index.map_or(Value::Null, |idx| json!(idx)));
    Ok(Loaded::Data(fields))
}

fn class_with(counter: &Arc<AtomicUsize>) -> Arc<SchemaClass> {
    SchemaClass::builder("Item")
        .field("id", Field::integer().required())
        .field("label", Field::string())
        .post_load(Counter(Arc::clone(counter)))
        .post_load(PostLoadFn::new("tag", tagging_hook))
        .build()
        .expect("Class definition failed")
}

#[test]
fn test_hooks_run_per_record_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = Schema::new(&class_with(&calls)).expect("Schema creation failed");

    let loaded = schema.load_many(&json!([{"id": 3}, {"id": 1}, {"id": 2}])).expect("Load failed");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let seen: Vec<(i64, u64)> = loaded
        .iter()
        .filter_map(Loaded::as_data)
        .map(|fields| (fields["id"].as_i64().unwrap(), fields["index"].as_u64().unwrap()))
        .collect();
    assert_eq!(seen, vec![(3, 0), (1, 1), (2, 2)]);
}

#[test]
fn test_validation_failure_skips_every_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = Schema::new(&class_with(&calls)).expect("Schema creation failed");

    let err = schema.load_many(&json!([{"id": 1}, {"id": "x"}])).unwrap_err();
    assert!(matches!(err, SchemaError::Validation { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "Hooks must not run when any record failed");
}

#[test]
fn test_hook_failure_keeps_its_source() {
    let class = SchemaClass::builder("Failing")
        .field("id", Field::integer())
        .post_load(PostLoadFn::new(
            "fail",
            |_: &Schema, _: Loaded, _: &LoadMeta<'_>| -> Result<Loaded, HookError> {
                Err(std::fmt::Error.into())
            },
        ))
        .build()
        .expect("Class definition failed");
    let schema = Schema::new(&class).expect("Schema creation failed");

    let err = schema.load_one(&json!({"id": 1})).unwrap_err();
    let SchemaError::Hook { source, .. } = &err else {
        panic!("Expected a hook error, got {err:?}");
    };
    assert!(source.downcast_ref::<std::fmt::Error>().is_some());
}

#[test]
fn test_subclass_inherits_hooks_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let parent = class_with(&calls);
    let child = SchemaClass::builder("Child")
        .extends(&parent)
        .field("extra", Field::boolean())
        .build()
        .expect("Class definition failed");
    assert_eq!(child.post_load_hooks().len(), 2);

    let schema = Schema::new(&child).expect("Schema creation failed");
    let output = schema.loads(r#"{"id": 1, "extra": "yes"}"#, &LoadOptions::default()).expect("Load failed");
    let LoadOutput::One(loaded) = output else {
        panic!("Expected a single record");
    };
    assert_eq!(loaded.as_data().and_then(|d| d.get("extra")), Some(&json!(true)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_non_array_collection_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = Schema::new(&class_with(&calls)).expect("Schema creation failed");

    let err = schema.load_many(&json!({"id": 1})).unwrap_err();
    let validation = err.validation().expect("Expected validation messages");
    assert_eq!(validation.messages_for("_schema"), vec!["Invalid input type."]);
}

#[test]
fn test_dump_many_keeps_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = Schema::new(&class_with(&calls)).expect("Schema creation failed");

    let out = schema.dump(&json!([{"id": 2, "label": "b"}, {"id": 1}]), true).expect("Dump failed");
    assert_eq!(out, json!([{"id": 2, "label": "b"}, {"id": 1}]));
}
