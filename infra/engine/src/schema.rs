//! # Schema Instances
//!
//! A [`Schema`] pairs a shared [`SchemaClass`] with per-instance settings and
//! runs the load and dump pipelines.
//!
//! Loading validates every record of the call first. Messages from all records
//! are aggregated into one [`ValidationError`]; post-load hooks run only when the
//! whole call validated, once per record, in order.

use crate::class::SchemaClass;
use crate::error::{
    INVALID_INPUT, MISSING, SCHEMA_KEY, SchemaError, SchemaErrorExt, UNKNOWN_FIELD, ValidationError,
};
use crate::field::Field;
use crate::hooks::{LoadMeta, Loaded};
use crate::options::{LoadOptions, Partial, SchemaOptions, Unknown};
use crate::FieldMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{instrument, trace};

/// Result of a load call, shaped by the collection flag in effect.
#[derive(Debug)]
pub enum LoadOutput {
    One(Loaded),
    Many(Vec<Loaded>),
}

/// A configured instance of a schema class.
#[derive(Debug, Clone)]
pub struct Schema {
    class: Arc<SchemaClass>,
    many: bool,
    unknown: Unknown,
    partial: Partial,
    load_fields: Vec<(String, Field)>,
    dump_fields: Vec<(String, Field)>,
}

impl Schema {
    /// Creates an instance with the class defaults.
    ///
    /// # Errors
    /// See [`Schema::with_options`].
    pub fn new(class: &Arc<SchemaClass>) -> Result<Self, SchemaError> {
        Self::with_options(class, SchemaOptions::default())
    }

    /// Creates an instance with explicit settings.
    ///
    /// # Errors
    /// Returns [`SchemaError::Definition`] if `only`, `exclude`, `load_only` or
    /// `dump_only` name a field the class does not declare.
    pub fn with_options(class: &Arc<SchemaClass>, options: SchemaOptions) -> Result<Self, SchemaError> {
        let SchemaOptions { many, unknown, partial, only, exclude, load_only, dump_only } = options;

        let declared: BTreeSet<&str> = class.fields().iter().map(|(name, _)| name.as_str()).collect();
        let invalid: Vec<&str> = only
            .iter()
            .flatten()
            .chain(&exclude)
            .chain(&load_only)
            .chain(&dump_only)
            .map(String::as_str)
            .filter(|name| !declared.contains(name))
            .collect();
        if !invalid.is_empty() {
            return Err(SchemaError::definition(format!(
                "Invalid fields for `{}`: {}",
                class.name(),
                invalid.join(", ")
            )));
        }

        let selected = class.fields().iter().filter(|(name, _)| {
            only.as_ref().is_none_or(|only| only.contains(name)) && !exclude.contains(name)
        });
        let load_fields = selected
            .clone()
            .filter(|(name, field)| !field.is_dump_only() && !dump_only.contains(name))
            .cloned()
            .collect();
        let dump_fields = selected
            .filter(|(name, field)| !field.is_load_only() && !load_only.contains(name))
            .cloned()
            .collect();

        Ok(Self {
            class: Arc::clone(class),
            many: many.unwrap_or(class.opts().many),
            unknown: unknown.unwrap_or(class.opts().unknown),
            partial,
            load_fields,
            dump_fields,
        })
    }

    #[must_use]
    pub const fn class(&self) -> &Arc<SchemaClass> {
        &self.class
    }

    /// Default collection flag for load and dump calls.
    #[must_use]
    pub const fn many(&self) -> bool {
        self.many
    }

    pub const fn set_many(&mut self, many: bool) {
        self.many = many;
    }

    #[must_use]
    pub const fn unknown(&self) -> Unknown {
        self.unknown
    }

    #[must_use]
    pub const fn partial(&self) -> &Partial {
        &self.partial
    }

    /// Fields read on load, in declaration order.
    #[must_use]
    pub fn load_fields(&self) -> &[(String, Field)] {
        &self.load_fields
    }

    /// Fields written on dump, in declaration order.
    #[must_use]
    pub fn dump_fields(&self) -> &[(String, Field)] {
        &self.dump_fields
    }

    /// Validates `data` and runs the post-load hooks on every record.
    ///
    /// # Errors
    /// Returns [`SchemaError::Validation`] with the messages of all records if any
    /// record failed, or [`SchemaError::Hook`] with the first hook failure.
    #[instrument(level = "trace", skip_all, fields(class = %self.class.name()))]
    pub fn load(&self, data: &Value, options: &LoadOptions) -> Result<LoadOutput, SchemaError> {
        let many = options.many.unwrap_or(self.many);
        let unknown = options.unknown.unwrap_or(self.unknown);
        let partial = options.partial.as_ref().unwrap_or(&self.partial);
        let mut errors = ValidationError::default();

        if !many {
            let fields = self.validate_record(data, None, unknown, partial, &mut errors);
            if !errors.is_empty() {
                return Err(errors.into());
            }
            let meta = LoadMeta { many, index: None, original: data, partial };
            return self.run_hooks(fields, &meta).map(LoadOutput::One);
        }

        let Value::Array(items) = data else {
            errors.push(SCHEMA_KEY, INVALID_INPUT);
            return Err(errors.into());
        };
        let validated: Vec<FieldMap> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.validate_record(item, Some(idx), unknown, partial, &mut errors))
            .collect();
        if !errors.is_empty() {
            trace!(records = items.len(), messages = errors.len(), "Collection failed validation");
            return Err(errors.into());
        }

        items
            .iter()
            .zip(validated)
            .enumerate()
            .map(|(idx, (original, fields))| {
                let meta = LoadMeta { many, index: Some(idx), original, partial };
                self.run_hooks(fields, &meta)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(LoadOutput::Many)
    }

    /// Loads a single record regardless of the instance's collection flag.
    ///
    /// # Errors
    /// See [`Schema::load`].
    pub fn load_one(&self, data: &Value) -> Result<Loaded, SchemaError> {
        match self.load(data, &LoadOptions::single())? {
            LoadOutput::One(loaded) => Ok(loaded),
            LoadOutput::Many(_) => Err("single-record load produced a collection".into()),
        }
    }

    /// Loads a collection regardless of the instance's collection flag.
    ///
    /// # Errors
    /// See [`Schema::load`].
    pub fn load_many(&self, data: &Value) -> Result<Vec<Loaded>, SchemaError> {
        match self.load(data, &LoadOptions::collection())? {
            LoadOutput::Many(loaded) => Ok(loaded),
            LoadOutput::One(_) => Err("collection load produced a single record".into()),
        }
    }

    /// Decodes `text` as JSON, then loads it.
    ///
    /// # Errors
    /// Returns [`SchemaError::Codec`] for malformed JSON, otherwise see [`Schema::load`].
    pub fn loads(&self, text: &str, options: &LoadOptions) -> Result<LoadOutput, SchemaError> {
        let data: Value = serde_json::from_str(text).context("Decoding input")?;
        self.load(&data, options)
    }

    /// Validates `data` without running hooks and returns every message found.
    #[must_use]
    pub fn validate(&self, data: &Value, options: &LoadOptions) -> ValidationError {
        let many = options.many.unwrap_or(self.many);
        let unknown = options.unknown.unwrap_or(self.unknown);
        let partial = options.partial.as_ref().unwrap_or(&self.partial);
        let mut errors = ValidationError::default();

        match (many, data) {
            (false, _) => {
                self.validate_record(data, None, unknown, partial, &mut errors);
            },
            (true, Value::Array(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    self.validate_record(item, Some(idx), unknown, partial, &mut errors);
                }
            },
            (true, _) => errors.push(SCHEMA_KEY, INVALID_INPUT),
        }
        errors
    }

    fn validate_record(
        &self,
        data: &Value,
        index: Option<usize>,
        unknown: Unknown,
        partial: &Partial,
        errors: &mut ValidationError,
    ) -> FieldMap {
        let prefix = index.map(|idx| format!("{idx}.")).unwrap_or_default();
        let mut fields = FieldMap::new();

        let Value::Object(input) = data else {
            errors.push(format!("{prefix}{SCHEMA_KEY}"), INVALID_INPUT);
            return fields;
        };

        for (name, field) in &self.load_fields {
            let key = field.key(name);
            let path = format!("{prefix}{key}");
            match input.get(key) {
                Some(value) => {
                    if let Some(value) = field.deserialize(value, &path, errors) {
                        fields.insert(name.clone(), value);
                    }
                },
                None => {
                    if let Some(default) = field.default_value() {
                        fields.insert(name.clone(), default.clone());
                    } else if field.is_required() && !partial.allows_missing(name) {
                        errors.push(path, MISSING);
                    }
                },
            }
        }

        if unknown != Unknown::Exclude {
            for (key, value) in input {
                if self.load_fields.iter().any(|(name, field)| field.key(name) == key) {
                    continue;
                }
                match unknown {
                    Unknown::Raise => errors.push(format!("{prefix}{key}"), UNKNOWN_FIELD),
                    Unknown::Include => {
                        fields.insert(key.clone(), value.clone());
                    },
                    Unknown::Exclude => {},
                }
            }
        }

        fields
    }

    fn run_hooks(&self, fields: FieldMap, meta: &LoadMeta<'_>) -> Result<Loaded, SchemaError> {
        self.class.post_load_hooks().iter().try_fold(Loaded::Data(fields), |loaded, hook| {
            hook.post_load(self, loaded, meta)
                .map_err(|source| SchemaError::Hook { source, context: None })
        })
    }

    /// Projects one object onto the dump fields.
    ///
    /// Attributes missing from `obj` are skipped.
    ///
    /// # Errors
    /// Returns [`SchemaError::Dump`] if `obj` is not an object or an attribute
    /// cannot be formatted by its field.
    pub fn dump_record(&self, obj: &Value) -> Result<FieldMap, SchemaError> {
        let Value::Object(attrs) = obj else {
            return Err(SchemaError::dump(format!(
                "`{}` can only dump objects with attributes",
                self.class.name()
            )));
        };

        let mut out = FieldMap::new();
        for (name, field) in &self.dump_fields {
            let Some(value) = attrs.get(name) else { continue };
            let value = field
                .serialize(value)
                .map_err(|message| SchemaError::dump(format!("`{name}`: {message}")))?;
            out.insert(field.key(name).to_owned(), value);
        }
        Ok(out)
    }

    /// Dumps one object, or every element of an array when `many` is set.
    ///
    /// # Errors
    /// See [`Schema::dump_record`].
    #[instrument(level = "trace", skip_all, fields(class = %self.class.name()))]
    pub fn dump(&self, obj: &Value, many: bool) -> Result<Value, SchemaError> {
        if !many {
            return self.dump_record(obj).map(Value::Object);
        }
        let Value::Array(items) = obj else {
            return Err(SchemaError::dump("collection dump expects an array"));
        };
        items
            .iter()
            .map(|item| self.dump_record(item).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// Dumps and encodes as JSON text.
    ///
    /// # Errors
    /// See [`Schema::dump`]; encoding failures are [`SchemaError::Codec`].
    pub fn dumps(&self, obj: &Value, many: bool) -> Result<String, SchemaError> {
        let value = self.dump(obj, many)?;
        serde_json::to_string(&value).context("Encoding output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SchemaOpts;
    use serde_json::json;

    fn user_class() -> Arc<SchemaClass> {
        SchemaClass::builder("User")
            .field("id", Field::integer().required())
            .field("name", Field::string().data_key("userName"))
            .field("secret", Field::string().load_only())
            .field("created", Field::string().dump_only())
            .build()
            .expect("class")
    }

    fn data(loaded: Loaded) -> FieldMap {
        match loaded {
            Loaded::Data(fields) => fields,
            Loaded::Object(_) => panic!("no hooks registered"),
        }
    }

    #[test]
    fn load_renames_and_coerces() {
        let schema = Schema::new(&user_class()).expect("schema");
        let fields = data(schema.load_one(&json!({"id": "7", "userName": "ann"})).expect("load"));
        assert_eq!(fields.get("id"), Some(&json!(7)));
        assert_eq!(fields.get("name"), Some(&json!("ann")));
    }

    #[test]
    fn unknown_policy() {
        let class = user_class();
        let input = json!({"id": 1, "extra": true, "created": "now"});

        let err = Schema::new(&class).expect("schema").load_one(&input).expect_err("raise");
        let validation = err.validation().expect("validation");
        assert_eq!(validation.messages_for("extra"), vec![UNKNOWN_FIELD]);
        assert_eq!(validation.messages_for("created"), vec![UNKNOWN_FIELD]);

        let options = SchemaOptions::builder().unknown(Unknown::Include).build();
        let fields = data(Schema::with_options(&class, options).expect("schema").load_one(&input).expect("include"));
        assert_eq!(fields.get("extra"), Some(&json!(true)));

        let options = SchemaOptions::builder().unknown(Unknown::Exclude).build();
        let fields = data(Schema::with_options(&class, options).expect("schema").load_one(&input).expect("exclude"));
        assert!(!fields.contains_key("extra"));
    }

    #[test]
    fn collection_errors_are_indexed() {
        let schema = Schema::new(&user_class()).expect("schema");
        let err = schema.load_many(&json!([{"id": 1}, {"name": "x"}, 5])).expect_err("invalid");
        let validation = err.validation().expect("validation");
        assert_eq!(validation.messages_for("1.id"), vec![MISSING]);
        assert_eq!(validation.messages_for("2._schema"), vec![INVALID_INPUT]);
        assert!(!validation.contains("0.id"));
    }

    #[test]
    fn partial_skips_required() {
        let schema = Schema::new(&user_class()).expect("schema");
        let options = LoadOptions::builder().partial(true).build();
        let output = schema.load(&json!({"userName": "ann"}), &options).expect("partial");
        assert!(matches!(output, LoadOutput::One(_)));
    }

    #[test]
    fn class_opts_set_instance_defaults() {
        let class = SchemaClass::builder("Loose")
            .field("id", Field::integer())
            .opts(SchemaOpts { unknown: Unknown::Exclude, many: true })
            .build()
            .expect("class");
        let schema = Schema::new(&class).expect("schema");
        assert!(schema.many());
        let output = schema.load(&json!([{"id": 1, "x": 2}]), &LoadOptions::default()).expect("load");
        assert!(matches!(output, LoadOutput::Many(ref items) if items.len() == 1));
    }

    #[test]
    fn dump_projects_declared_fields() {
        let schema = Schema::new(&user_class()).expect("schema");
        let out = schema
            .dump(&json!({"id": 1, "name": "ann", "secret": "s", "created": "now", "other": 0}), false)
            .expect("dump");
        assert_eq!(out, json!({"id": 1, "userName": "ann", "created": "now"}));
        assert_eq!(schema.dumps(&json!([{}]), true).expect("dumps"), "[{}]");
    }

    #[test]
    fn only_rejects_undeclared_names() {
        let options = SchemaOptions::builder().only(&["missing"]).build();
        let err = Schema::with_options(&user_class(), options).expect_err("invalid");
        assert_eq!(err.kind(), "Definition");
    }

    #[test]
    fn malformed_json_is_a_codec_error() {
        let schema = Schema::new(&user_class()).expect("schema");
        let err = schema.loads("{", &LoadOptions::default()).expect_err("codec");
        assert_eq!(err.kind(), "Codec");
    }
}
