//! # Type-Argument Registry
//!
//! Generic schema classes forget their concrete parameterization unless it is
//! recorded when the class is created. The registry does exactly that: the
//! [`GenericInsight`] mixin classes register [`TypeArgCapture`] as a subclass
//! extension, so every class built below them gets a [`TypeArgs`] record of the
//! concrete types bound to its generic positions.
//!
//! ## Capture rules
//!
//! - Slots start from the bases' bound slots, first base first.
//! - Only the first parameterized base deriving from the mixin is inspected.
//! - Its arguments map to slots by position. Open variables and "no type"
//!   leave the slot untouched; concrete types are stored.
//!
//! ## Lookup
//!
//! [`GenericInsight::type_arg`] reads the record of a class. The record is shared
//! by every instance of the class and never changes once the class is built.

use crate::error::GenericError;
use gschema_engine::{Base, ClassDraft, InitSubclass, SchemaClass, SchemaError, TypeArg, TypeParam, TypeVar};
use std::sync::{Arc, LazyLock};
use tracing::trace;

/// Number of type-argument slots a class can record.
pub const MAX_TYPE_ARGS: usize = 5;

/// One registry position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slot {
    /// No concrete type was ever bound here.
    #[default]
    Unbound,
    Bound(TypeArg),
}

impl Slot {
    #[must_use]
    pub const fn bound(&self) -> Option<&TypeArg> {
        match self {
            Self::Bound(arg) => Some(arg),
            Self::Unbound => None,
        }
    }
}

/// Concrete types bound to a class's generic positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeArgs {
    slots: [Slot; MAX_TYPE_ARGS],
}

impl TypeArgs {
    /// Merges the records of `bases`, slot by slot; the first base with a bound slot wins.
    #[must_use]
    pub fn inherited(bases: &[Base]) -> Self {
        let mut merged = Self::default();
        for record in bases.iter().filter_map(|base| base.origin().extensions().get::<Self>()) {
            for (slot, inherited) in merged.slots.iter_mut().zip(&record.slots) {
                if *slot == Slot::Unbound {
                    slot.clone_from(inherited);
                }
            }
        }
        merged
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.bound().is_some()).count()
    }
}

/// Subclass extension recording [`TypeArgs`] on every class built below the mixin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeArgCapture;

impl InitSubclass for TypeArgCapture {
    fn init_subclass(&self, draft: &mut ClassDraft<'_>) -> Result<(), SchemaError> {
        let mut record = TypeArgs::inherited(draft.bases());

        let args = draft
            .bases()
            .iter()
            .find(|base| base.args().is_some() && base.origin().is_subclass_of(GenericInsight::mixin()))
            .and_then(Base::args);

        for (index, param) in args.into_iter().flatten().enumerate() {
            let Some(arg) = param.concrete() else { continue };
            let Some(slot) = record.slots.get_mut(index) else {
                return Err(SchemaError::Definition {
                    message: format!(
                        "`{}` binds type argument {index}, but at most {MAX_TYPE_ARGS} are recorded",
                        draft.name()
                    )
                    .into(),
                    context: None,
                });
            };
            *slot = Slot::Bound(arg.clone());
        }

        trace!(class = draft.name(), bound = record.bound_count(), "Type arguments captured");
        draft.extensions_mut().insert(record);
        Ok(())
    }
}

static MIXIN: LazyLock<Arc<SchemaClass>> = LazyLock::new(|| {
    SchemaClass::builder("GenericInsight")
        .type_params((0..MAX_TYPE_ARGS).map(|idx| TypeVar::new(format!("T{idx}"))))
        .init_subclass(TypeArgCapture)
        .build()
        .expect("GenericInsight declaration is static")
});

static MIXIN1: LazyLock<Arc<SchemaClass>> = LazyLock::new(|| pinned("GenericInsight1", 1));
static MIXIN2: LazyLock<Arc<SchemaClass>> = LazyLock::new(|| pinned("GenericInsight2", 2));

/// A mixin class with `open` variables; the remaining positions are "no type".
fn pinned(name: &'static str, open: usize) -> Arc<SchemaClass> {
    let args = (0..MAX_TYPE_ARGS).map(|idx| {
        if idx < open { TypeParam::var(format!("T{idx}")) } else { TypeParam::absent() }
    });
    SchemaClass::builder(name)
        .extends_generic(&MIXIN, args)
        .build()
        .expect("GenericInsight arity variants are static")
}

/// Entry point to the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericInsight;

impl GenericInsight {
    /// The mixin root, generic over `T0..T4`.
    #[must_use]
    pub fn mixin() -> &'static Arc<SchemaClass> {
        &MIXIN
    }

    /// The mixin generic over `T0` only.
    #[must_use]
    pub fn mixin1() -> &'static Arc<SchemaClass> {
        &MIXIN1
    }

    /// The mixin generic over `T0` and `T1`.
    #[must_use]
    pub fn mixin2() -> &'static Arc<SchemaClass> {
        &MIXIN2
    }

    /// Returns the record of `class`, if it derives from the mixin.
    #[must_use]
    pub fn type_args(class: &SchemaClass) -> Option<&TypeArgs> {
        class.extensions().get::<TypeArgs>()
    }

    /// Returns the concrete type bound to slot `index` of `class`.
    ///
    /// # Errors
    /// Returns [`GenericError::SlotOutOfRange`] for `index >= MAX_TYPE_ARGS` and
    /// [`GenericError::UnboundTypeArg`] if the slot holds no concrete type.
    pub fn type_arg(class: &SchemaClass, index: usize) -> Result<&TypeArg, GenericError> {
        if index >= MAX_TYPE_ARGS {
            return Err(GenericError::SlotOutOfRange { index, context: None });
        }
        Self::type_args(class)
            .and_then(|record| record.get(index))
            .and_then(Slot::bound)
            .ok_or_else(|| GenericError::UnboundTypeArg {
                class: class.name().to_owned().into(),
                index,
                context: None,
            })
    }

    /// Shorthand for slot 0, the type a generic schema constructs.
    ///
    /// # Errors
    /// See [`GenericInsight::type_arg`].
    pub fn type_arg0(class: &SchemaClass) -> Result<&TypeArg, GenericError> {
        Self::type_arg(class, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(name: &'static str, base: &Arc<SchemaClass>, args: Vec<TypeParam>) -> Arc<SchemaClass> {
        SchemaClass::builder(name).extends_generic(base, args).build().expect("class")
    }

    #[test]
    fn mixin_itself_records_nothing() {
        assert!(GenericInsight::type_args(GenericInsight::mixin()).is_none());
        assert_eq!(GenericInsight::mixin().type_params().len(), MAX_TYPE_ARGS);
        assert_eq!(GenericInsight::mixin1().type_params(), [TypeVar::new("T0")]);
        assert_eq!(GenericInsight::mixin2().type_params().len(), 2);
    }

    #[test]
    fn arity_variants_record_only_open_positions() {
        let class = bind("Pair", GenericInsight::mixin2(), vec![TypeParam::of::<i64>(), TypeParam::of::<String>()]);
        assert!(GenericInsight::type_arg(&class, 0).expect("slot 0").is::<i64>());
        assert!(GenericInsight::type_arg(&class, 1).expect("slot 1").is::<String>());
        assert_eq!(GenericInsight::type_arg(&class, 2).unwrap_err().kind(), "UnboundTypeArg");
    }

    #[test]
    fn inherited_slots_merge_per_position() {
        let first = bind(
            "First",
            GenericInsight::mixin(),
            vec![
                TypeParam::of::<i64>(),
                TypeParam::var("T1"),
                TypeParam::absent(),
                TypeParam::absent(),
                TypeParam::absent(),
            ],
        );
        let second = bind(
            "Second",
            GenericInsight::mixin(),
            vec![
                TypeParam::of::<bool>(),
                TypeParam::of::<String>(),
                TypeParam::absent(),
                TypeParam::absent(),
                TypeParam::absent(),
            ],
        );
        let both = SchemaClass::builder("Both").extends(&first).extends(&second).build().expect("class");

        assert!(GenericInsight::type_arg0(&both).expect("slot 0").is::<i64>());
        assert!(GenericInsight::type_arg(&both, 1).expect("slot 1").is::<String>());
    }

    #[test]
    fn binding_beyond_the_last_slot_is_a_definition_error() {
        let wide = SchemaClass::builder("Wide")
            .extends_generic(GenericInsight::mixin(), (0..MAX_TYPE_ARGS).map(|idx| TypeParam::var(format!("T{idx}"))))
            .type_params((0..=MAX_TYPE_ARGS).map(|idx| TypeVar::new(format!("T{idx}"))))
            .build()
            .expect("class");

        let mut args: Vec<TypeParam> = (0..MAX_TYPE_ARGS).map(|_| TypeParam::absent()).collect();
        args.push(TypeParam::of::<i64>());
        let err = SchemaClass::builder("WideBound").extends_generic(&wide, args).build().unwrap_err();
        assert_eq!(err.kind(), "Definition");
    }
}
