//! # Generic Schemas
//!
//! [`GenericSchema<M>`] is a schema whose class bound `M` to the first type
//! argument of the generic base. Its post-load hook, [`Instantiate`], builds an
//! `M` from every validated record, so the load entry points return `M` directly.

use crate::error::GenericError;
use crate::registry::GenericInsight;
use gschema_engine::{
    ClassBuilder, ConstructError, Field, FieldMap, HookError, LoadMeta, LoadOptions, LoadOutput,
    Loaded, Model, PostLoad, Schema, SchemaClass, SchemaError, SchemaOptions, SchemaOpts, TypeArg,
    TypeParam, ValidationError,
};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};
use tracing::{trace, warn};

static GENERIC_SCHEMA: LazyLock<Arc<SchemaClass>> = LazyLock::new(|| {
    SchemaClass::builder("GenericSchema")
        .extends_generic(GenericInsight::mixin1(), [TypeParam::var("Model")])
        .post_load(Instantiate)
        .build()
        .expect("GenericSchema declaration is static")
});

/// The generic base class every typed schema derives from.
#[must_use]
pub fn base_class() -> &'static Arc<SchemaClass> {
    &GENERIC_SCHEMA
}

/// Post-load hook constructing the type bound to slot 0 from the validated mapping.
///
/// Performs no validation of its own. Lookup and construction failures are
/// returned as [`GenericError`] so the typed entry points can report them by kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instantiate;

impl Instantiate {
    /// Constructs the bound type of `class` with `fields` as keyword arguments.
    ///
    /// # Errors
    /// Returns [`GenericError::UnboundTypeArg`] if slot 0 is unbound, or
    /// [`GenericError::Construction`] if the type rejects the mapping.
    pub fn construct(class: &SchemaClass, fields: FieldMap) -> Result<Box<dyn Any + Send>, GenericError> {
        let arg = GenericInsight::type_arg0(class)?;
        trace!(class = class.name(), model = arg.name(), "Constructing model");
        Ok(arg.construct(fields)?)
    }
}

impl PostLoad for Instantiate {
    fn post_load(&self, schema: &Schema, data: Loaded, _meta: &LoadMeta<'_>) -> Result<Loaded, HookError> {
        let class = schema.class();
        match data {
            Loaded::Data(fields) => Ok(Loaded::Object(Self::construct(class, fields)?)),
            Loaded::Object(_) => {
                let arg = GenericInsight::type_arg0(class)?;
                let err = ConstructError::new(arg.name(), "post-load data is not a field mapping");
                Err(GenericError::from(err).into())
            },
        }
    }
}

/// Output of [`GenericSchema::load_with`], shaped by the collection flag in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deserialized<M> {
    One(M),
    Many(Vec<M>),
}

impl<M> Deserialized<M> {
    /// Returns every loaded object, in input order.
    #[must_use]
    pub fn into_vec(self) -> Vec<M> {
        match self {
            Self::One(one) => vec![one],
            Self::Many(many) => many,
        }
    }

    #[must_use]
    pub fn into_one(self) -> Option<M> {
        match self {
            Self::One(one) => Some(one),
            Self::Many(_) => None,
        }
    }
}

/// A schema instance whose loads produce `M`.
pub struct GenericSchema<M> {
    schema: Schema,
    marker: PhantomData<fn() -> M>,
}

impl<M> fmt::Debug for GenericSchema<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericSchema")
            .field("model", &std::any::type_name::<M>())
            .field("schema", &self.schema)
            .finish()
    }
}

impl<M> Clone for GenericSchema<M> {
    fn clone(&self) -> Self {
        Self { schema: self.schema.clone(), marker: PhantomData }
    }
}

impl<M: Send + 'static> GenericSchema<M> {
    /// Starts a schema class bound to `M` through its [`Model`] implementation.
    pub fn define(name: &'static str) -> GenericSchemaBuilder<M>
    where
        M: Model,
    {
        Self::define_with(name, TypeArg::model::<M>())
    }

    /// Starts a schema class bound to `arg`, which must describe `M`.
    pub fn define_with(name: &'static str, arg: TypeArg) -> GenericSchemaBuilder<M> {
        GenericSchemaBuilder {
            class: SchemaClass::builder(name)
                .extends_generic(base_class(), [TypeParam::Concrete(arg.clone())]),
            arg,
            options: SchemaOptions::default(),
            marker: PhantomData,
        }
    }

    /// Wraps an existing class with default instance settings.
    ///
    /// # Errors
    /// See [`GenericSchema::with_options`].
    pub fn from_class(class: &Arc<SchemaClass>) -> Result<Self, GenericError> {
        Self::with_options(class, SchemaOptions::default())
    }

    /// Wraps an existing class.
    ///
    /// An unbound slot 0 is accepted here and reported by the first load.
    ///
    /// # Errors
    /// Returns [`GenericError::NotGenericSchema`] if `class` does not derive from
    /// [`base_class`], [`GenericError::TypeMismatch`] if it is bound to a type
    /// other than `M`, or the engine's error for invalid options.
    pub fn with_options(class: &Arc<SchemaClass>, options: SchemaOptions) -> Result<Self, GenericError> {
        if !class.is_subclass_of(base_class()) {
            return Err(GenericError::NotGenericSchema { class: class.name().to_owned().into(), context: None });
        }
        if let Ok(arg) = GenericInsight::type_arg0(class)
            && !arg.is::<M>()
        {
            return Err(mismatch::<M>(class, arg.name()));
        }
        let schema = Schema::with_options(class, options)?;
        Ok(Self { schema, marker: PhantomData })
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn class(&self) -> &Arc<SchemaClass> {
        self.schema.class()
    }

    /// The type bound to slot 0 of this schema's class.
    ///
    /// # Errors
    /// See [`GenericInsight::type_arg`].
    pub fn model_type(&self) -> Result<&TypeArg, GenericError> {
        GenericInsight::type_arg0(self.class())
    }

    #[must_use]
    pub const fn many(&self) -> bool {
        self.schema.many()
    }

    /// Changes the default collection flag used by [`GenericSchema::load_with`].
    ///
    /// The typed entry points fix their result shape by name, so the flag has no
    /// effect on them.
    pub fn set_many(&mut self, many: bool) {
        warn!(
            class = self.class().name(),
            many,
            "Setting `many` on a generic schema does not change what load/load_many return; \
             use load_with to pick the shape at runtime"
        );
        self.schema.set_many(many);
    }

    /// Runs the construction hook directly on an already validated mapping.
    ///
    /// # Errors
    /// See [`Instantiate::construct`].
    pub fn instantiate(&self, fields: FieldMap) -> Result<M, GenericError> {
        let object = Instantiate::construct(self.class(), fields)?;
        self.downcast(Loaded::Object(object))
    }

    /// Loads one record into `M`.
    ///
    /// # Errors
    /// Validation failures are returned as [`GenericError::Schema`]; lookup and
    /// construction failures keep their own kinds.
    pub fn load(&self, data: &Value) -> Result<M, GenericError> {
        let loaded = self.schema.load_one(data).map_err(GenericError::surface)?;
        self.downcast(loaded)
    }

    /// Loads an array of records into `M`, preserving order and length.
    ///
    /// # Errors
    /// See [`GenericSchema::load`]; messages of all records are aggregated.
    pub fn load_many(&self, data: &Value) -> Result<Vec<M>, GenericError> {
        let loaded = self.schema.load_many(data).map_err(GenericError::surface)?;
        loaded.into_iter().map(|item| self.downcast(item)).collect()
    }

    /// Decodes JSON text, then loads one record.
    ///
    /// # Errors
    /// Malformed JSON is a [`SchemaError::Codec`] wrapped in [`GenericError::Schema`];
    /// otherwise see [`GenericSchema::load`].
    pub fn loads(&self, text: &str) -> Result<M, GenericError> {
        self.loads_with(text, &LoadOptions::single())?
            .into_one()
            .ok_or_else(|| "single-record load produced a collection".into())
    }

    /// Decodes JSON text, then loads an array of records.
    ///
    /// # Errors
    /// See [`GenericSchema::loads`].
    pub fn loads_many(&self, text: &str) -> Result<Vec<M>, GenericError> {
        match self.loads_with(text, &LoadOptions::collection())? {
            Deserialized::Many(many) => Ok(many),
            Deserialized::One(_) => Err("collection load produced a single record".into()),
        }
    }

    /// Loads with per-call options; `many: None` uses the instance flag.
    ///
    /// # Errors
    /// See [`GenericSchema::load`].
    pub fn load_with(&self, data: &Value, options: &LoadOptions) -> Result<Deserialized<M>, GenericError> {
        let output = self.schema.load(data, options).map_err(GenericError::surface)?;
        self.unpack(output)
    }

    /// Decodes JSON text, then loads with per-call options.
    ///
    /// # Errors
    /// See [`GenericSchema::loads`].
    pub fn loads_with(&self, text: &str, options: &LoadOptions) -> Result<Deserialized<M>, GenericError> {
        let output = self.schema.loads(text, options).map_err(GenericError::surface)?;
        self.unpack(output)
    }

    /// Validates without constructing anything.
    #[must_use]
    pub fn validate(&self, data: &Value, options: &LoadOptions) -> ValidationError {
        self.schema.validate(data, options)
    }

    fn unpack(&self, output: LoadOutput) -> Result<Deserialized<M>, GenericError> {
        match output {
            LoadOutput::One(one) => self.downcast(one).map(Deserialized::One),
            LoadOutput::Many(many) => {
                many.into_iter().map(|item| self.downcast(item)).collect::<Result<_, _>>().map(Deserialized::Many)
            },
        }
    }

    fn downcast(&self, loaded: Loaded) -> Result<M, GenericError> {
        match loaded.downcast::<M>() {
            Ok(object) => Ok(object),
            Err(Loaded::Data(_)) => Err(GenericError::Internal {
                message: "post-load hooks returned a mapping instead of an object".into(),
                context: None,
            }),
            Err(Loaded::Object(_)) => {
                let found = self.model_type().map_or("another type", TypeArg::name);
                Err(mismatch::<M>(self.class(), found))
            },
        }
    }
}

impl<M: Serialize + Send + 'static> GenericSchema<M> {
    /// Serializes `obj` through the schema's dump fields.
    ///
    /// # Errors
    /// Returns [`GenericError::Schema`] if `obj` cannot be represented.
    pub fn dump(&self, obj: &M) -> Result<FieldMap, GenericError> {
        let value = serde_json::to_value(obj).map_err(SchemaError::from)?;
        Ok(self.schema.dump_record(&value)?)
    }

    /// Serializes every element of `objs`, in order.
    ///
    /// # Errors
    /// See [`GenericSchema::dump`].
    pub fn dump_many(&self, objs: &[M]) -> Result<Vec<FieldMap>, GenericError> {
        objs.iter().map(|obj| self.dump(obj)).collect()
    }

    /// Serializes `obj` to JSON text.
    ///
    /// # Errors
    /// See [`GenericSchema::dump`].
    pub fn dumps(&self, obj: &M) -> Result<String, GenericError> {
        let fields = self.dump(obj)?;
        Ok(serde_json::to_string(&fields).map_err(SchemaError::from)?)
    }

    /// Serializes `objs` to a JSON array.
    ///
    /// # Errors
    /// See [`GenericSchema::dump`].
    pub fn dumps_many(&self, objs: &[M]) -> Result<String, GenericError> {
        let fields = self.dump_many(objs)?;
        Ok(serde_json::to_string(&fields).map_err(SchemaError::from)?)
    }
}

fn mismatch<M>(class: &SchemaClass, found: &'static str) -> GenericError {
    GenericError::TypeMismatch {
        class: class.name().to_owned().into(),
        expected: std::any::type_name::<M>().into(),
        found: found.into(),
        context: None,
    }
}

/// Declares a schema class bound to `M` and instantiates it.
#[must_use]
pub struct GenericSchemaBuilder<M> {
    class: ClassBuilder,
    arg: TypeArg,
    options: SchemaOptions,
    marker: PhantomData<fn() -> M>,
}

impl<M> fmt::Debug for GenericSchemaBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericSchemaBuilder")
            .field("class", &self.class)
            .field("model", &self.arg)
            .finish_non_exhaustive()
    }
}

impl<M: Send + 'static> GenericSchemaBuilder<M> {
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.class = self.class.field(name, field);
        self
    }

    /// Adds a plain base after the generic one, e.g. to share fields.
    pub fn extends(mut self, base: &Arc<SchemaClass>) -> Self {
        self.class = self.class.extends(base);
        self
    }

    /// Adds a hook that runs after [`Instantiate`] on the constructed object.
    pub fn post_load(mut self, hook: impl PostLoad) -> Self {
        self.class = self.class.post_load(hook);
        self
    }

    pub fn opts(mut self, opts: SchemaOpts) -> Self {
        self.class = self.class.opts(opts);
        self
    }

    /// Instance settings for the schema returned by [`GenericSchemaBuilder::build`].
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the class without instantiating it.
    ///
    /// # Errors
    /// Returns [`GenericError::TypeMismatch`] if the bound type is not `M`, or the
    /// engine's definition error.
    pub fn build_class(self) -> Result<(Arc<SchemaClass>, SchemaOptions), GenericError> {
        let Self { class, arg, options, .. } = self;
        let class = class.build()?;
        if !arg.is::<M>() {
            return Err(mismatch::<M>(&class, arg.name()));
        }
        warn_on_signature_mismatch(&class, &arg);
        Ok((class, options))
    }

    /// Builds the class and instantiates it.
    ///
    /// # Errors
    /// See [`GenericSchemaBuilder::build_class`] and [`GenericSchema::with_options`].
    pub fn build(self) -> Result<GenericSchema<M>, GenericError> {
        let (class, options) = self.build_class()?;
        GenericSchema::with_options(&class, options)
    }
}

/// Construction may still fail later; this only flags it early.
fn warn_on_signature_mismatch(class: &SchemaClass, arg: &TypeArg) {
    let Some(signature) = arg.signature() else { return };
    let names: Vec<&str> = class
        .fields()
        .iter()
        .filter(|(_, field)| !field.is_dump_only())
        .map(|(name, _)| name.as_str())
        .collect();
    let (missing, unexpected) = signature.mismatch(&names);
    if !missing.is_empty() || !unexpected.is_empty() {
        warn!(
            class = class.name(),
            model = arg.name(),
            ?missing,
            ?unexpected,
            "Schema fields do not match the model's constructor"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn base_class_is_generic_over_one_variable() {
        assert_eq!(base_class().type_params().len(), 1);
        assert!(base_class().is_subclass_of(GenericInsight::mixin()));
        assert_eq!(GenericInsight::type_arg0(base_class()).unwrap_err().kind(), "UnboundTypeArg");
    }

    #[test]
    fn instantiate_rejects_objects() {
        let schema = GenericSchema::<Point>::define_with("PointSchema", TypeArg::of::<Point>())
            .field("x", Field::integer())
            .field("y", Field::integer())
            .build()
            .expect("schema");
        let meta = LoadMeta { many: false, index: None, original: &Value::Null, partial: &Default::default() };
        let err = Instantiate
            .post_load(schema.schema(), Loaded::Object(Box::new(1_u8)), &meta)
            .expect_err("object input");
        let err = GenericError::surface(SchemaError::Hook { source: err, context: None });
        assert_eq!(err.kind(), "Construction");
    }

    #[test]
    fn instantiate_builds_from_mapping() {
        let schema = GenericSchema::<Point>::define_with("PointSchema", TypeArg::of::<Point>())
            .field("x", Field::integer())
            .field("y", Field::integer())
            .build()
            .expect("schema");
        let fields = match json!({"x": 1, "y": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(schema.instantiate(fields).expect("instantiate"), Point { x: 1, y: 2 });
    }

    #[test]
    fn define_with_checks_the_bound_type() {
        let err = GenericSchema::<Point>::define_with("Wrong", TypeArg::of::<i64>()).build().unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }
}
