//! # Schema Classes
//!
//! A [`SchemaClass`] is the immutable, shared description of a schema: its
//! fields, bases, open type parameters, hooks and class-level state. Classes are
//! built once through [`ClassBuilder`] and published behind an [`Arc`]; every
//! [`Schema`](crate::Schema) instance of the class reads the same object.
//!
//! Class creation is extensible: an [`InitSubclass`] registered on a class runs
//! whenever a subclass of it is built, before the subclass is published, and may
//! record class-level state in the subclass's [`Extensions`].

use crate::error::SchemaError;
use crate::field::Field;
use crate::generics::{TypeParam, TypeVar};
use crate::hooks::PostLoad;
use crate::options::SchemaOpts;
use fxhash::FxHashMap;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Typed class-level state, keyed by type.
#[derive(Default)]
pub struct Extensions {
    map: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Stores `value`, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Box::new(value));
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|value| value.downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("len", &self.map.len()).finish()
    }
}

/// A declared base class, optionally parameterized.
#[derive(Clone)]
pub struct Base {
    origin: Arc<SchemaClass>,
    args: Option<Vec<TypeParam>>,
}

impl Base {
    #[must_use]
    pub fn plain(origin: &Arc<SchemaClass>) -> Self {
        Self { origin: Arc::clone(origin), args: None }
    }

    #[must_use]
    pub fn generic(origin: &Arc<SchemaClass>, args: Vec<TypeParam>) -> Self {
        Self { origin: Arc::clone(origin), args: Some(args) }
    }

    #[must_use]
    pub const fn origin(&self) -> &Arc<SchemaClass> {
        &self.origin
    }

    /// Arguments in declaration order, or `None` for a plain base.
    #[must_use]
    pub fn args(&self) -> Option<&[TypeParam]> {
        self.args.as_deref()
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Base");
        out.field("origin", &self.origin.name());
        if let Some(args) = &self.args {
            out.field("args", args);
        }
        out.finish()
    }
}

/// The class under construction, as seen by [`InitSubclass`] extensions.
#[derive(Debug)]
pub struct ClassDraft<'a> {
    name: &'a str,
    bases: &'a [Base],
    extensions: &'a mut Extensions,
}

impl ClassDraft<'_> {
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name
    }

    /// Declared bases in declaration order.
    #[must_use]
    pub const fn bases(&self) -> &[Base] {
        self.bases
    }

    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &*self.extensions
    }

    pub const fn extensions_mut(&mut self) -> &mut Extensions {
        &mut *self.extensions
    }
}

/// Runs for every subclass built below the class that registered it.
pub trait InitSubclass: fmt::Debug + Send + Sync + 'static {
    /// Inspects the draft and records class-level state.
    ///
    /// # Errors
    /// Any error aborts the class creation.
    fn init_subclass(&self, draft: &mut ClassDraft<'_>) -> Result<(), SchemaError>;
}

/// An immutable schema class.
#[derive(Debug)]
pub struct SchemaClass {
    name: Cow<'static, str>,
    bases: Vec<Base>,
    type_params: Vec<TypeVar>,
    fields: Vec<(String, Field)>,
    post_load: Vec<Arc<dyn PostLoad>>,
    subclass_hooks: Vec<Arc<dyn InitSubclass>>,
    opts: SchemaOpts,
    extensions: Extensions,
}

impl SchemaClass {
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            bases: Vec::new(),
            type_params: None,
            fields: Vec::new(),
            post_load: Vec::new(),
            init_subclass: Vec::new(),
            opts: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    /// Type variables this class is still generic over.
    #[must_use]
    pub fn type_params(&self) -> &[TypeVar] {
        &self.type_params
    }

    #[must_use]
    pub const fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Declared and inherited fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, field)| field)
    }

    #[must_use]
    pub fn post_load_hooks(&self) -> &[Arc<dyn PostLoad>] {
        &self.post_load
    }

    #[must_use]
    pub const fn opts(&self) -> &SchemaOpts {
        &self.opts
    }

    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns `true` if `self` is `other` or derives from it through any base.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Arc<Self>) -> bool {
        std::ptr::eq(self, Arc::as_ptr(other))
            || self.bases.iter().any(|base| base.origin.is_subclass_of(other))
    }
}

/// Declares a new [`SchemaClass`].
#[must_use]
pub struct ClassBuilder {
    name: Cow<'static, str>,
    bases: Vec<Base>,
    type_params: Option<Vec<TypeVar>>,
    fields: Vec<(String, Field)>,
    post_load: Vec<Arc<dyn PostLoad>>,
    init_subclass: Vec<Arc<dyn InitSubclass>>,
    opts: Option<SchemaOpts>,
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("bases", &self.bases)
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

impl ClassBuilder {
    pub fn extends(mut self, base: &Arc<SchemaClass>) -> Self {
        self.bases.push(Base::plain(base));
        self
    }

    /// Adds a parameterized base, one argument per type parameter of `base`.
    pub fn extends_generic(
        mut self,
        base: &Arc<SchemaClass>,
        args: impl IntoIterator<Item = TypeParam>,
    ) -> Self {
        self.bases.push(Base::generic(base, args.into_iter().collect()));
        self
    }

    /// Declares the class's own type parameters explicitly.
    pub fn type_params(mut self, params: impl IntoIterator<Item = TypeVar>) -> Self {
        self.type_params = Some(params.into_iter().collect());
        self
    }

    /// Declares a field; a field inherited under the same name is overridden.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = field,
            None => self.fields.push((name, field)),
        }
        self
    }

    pub fn post_load(mut self, hook: impl PostLoad) -> Self {
        self.post_load.push(Arc::new(hook));
        self
    }

    /// Registers an extension that runs for every subclass of this class.
    pub fn init_subclass(mut self, extension: impl InitSubclass) -> Self {
        self.init_subclass.push(Arc::new(extension));
        self
    }

    pub const fn opts(mut self, opts: SchemaOpts) -> Self {
        self.opts = Some(opts);
        self
    }

    /// Validates the declaration, runs inherited subclass extensions and publishes the class.
    ///
    /// # Errors
    /// Returns [`SchemaError::Definition`] for a parameterized non-generic base, an
    /// argument count that does not match the base's parameters, or a duplicate base;
    /// any error raised by an [`InitSubclass`] extension is returned as is.
    pub fn build(self) -> Result<Arc<SchemaClass>, SchemaError> {
        let Self { name, bases, type_params, fields: own_fields, post_load: own_hooks, init_subclass, opts } =
            self;

        check_bases(&name, &bases)?;

        let type_params = type_params.unwrap_or_else(|| collect_type_vars(&bases));

        let mut fields: Vec<(String, Field)> = Vec::new();
        for (field_name, field) in bases.iter().flat_map(|base| base.origin.fields.iter()) {
            if !fields.iter().any(|(n, _)| n == field_name) {
                fields.push((field_name.clone(), field.clone()));
            }
        }
        for (field_name, field) in own_fields {
            match fields.iter_mut().find(|(n, _)| *n == field_name) {
                Some((_, existing)) => *existing = field,
                None => fields.push((field_name, field)),
            }
        }

        let mut post_load: Vec<Arc<dyn PostLoad>> = Vec::new();
        for hook in bases.iter().flat_map(|base| base.origin.post_load.iter()) {
            push_unique(&mut post_load, hook);
        }
        for hook in &own_hooks {
            push_unique(&mut post_load, hook);
        }

        let mut inherited: Vec<Arc<dyn InitSubclass>> = Vec::new();
        for extension in bases.iter().flat_map(|base| base.origin.subclass_hooks.iter()) {
            push_unique(&mut inherited, extension);
        }

        let opts = opts
            .or_else(|| bases.first().map(|base| base.origin.opts.clone()))
            .unwrap_or_default();

        let mut extensions = Extensions::default();
        {
            let mut draft = ClassDraft { name: &name, bases: &bases, extensions: &mut extensions };
            for extension in &inherited {
                extension.init_subclass(&mut draft)?;
            }
        }

        let mut subclass_hooks = inherited;
        for extension in &init_subclass {
            push_unique(&mut subclass_hooks, extension);
        }

        debug!(
            class = %name,
            bases = bases.len(),
            fields = fields.len(),
            type_params = type_params.len(),
            extensions = extensions.len(),
            "Schema class built"
        );

        Ok(Arc::new(SchemaClass {
            name,
            bases,
            type_params,
            fields,
            post_load,
            subclass_hooks,
            opts,
            extensions,
        }))
    }
}

fn check_bases(name: &str, bases: &[Base]) -> Result<(), SchemaError> {
    for (idx, base) in bases.iter().enumerate() {
        if bases[..idx].iter().any(|prev| Arc::ptr_eq(&prev.origin, &base.origin)) {
            return Err(SchemaError::definition(format!(
                "`{name}` lists base `{}` more than once",
                base.origin.name()
            )));
        }
        let Some(args) = base.args() else { continue };
        let params = base.origin.type_params();
        if params.is_empty() {
            return Err(SchemaError::definition(format!(
                "`{}` is not generic and cannot be parameterized",
                base.origin.name()
            )));
        }
        if args.len() != params.len() {
            return Err(SchemaError::definition(format!(
                "`{}` takes {} type argument(s) but {} were given",
                base.origin.name(),
                params.len(),
                args.len()
            )));
        }
    }
    Ok(())
}

fn collect_type_vars(bases: &[Base]) -> Vec<TypeVar> {
    let mut vars: Vec<TypeVar> = Vec::new();
    for param in bases.iter().filter_map(Base::args).flatten() {
        if let TypeParam::Var(var) = param
            && !vars.contains(var)
        {
            vars.push(var.clone());
        }
    }
    vars
}

fn push_unique<T: ?Sized>(items: &mut Vec<Arc<T>>, item: &Arc<T>) {
    if !items.iter().any(|existing| Arc::ptr_eq(existing, item)) {
        items.push(Arc::clone(item));
    }
}
