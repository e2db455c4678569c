//! # Options
//!
//! Class-level defaults ([`SchemaOpts`]), per-instance settings ([`SchemaOptions`])
//! and per-call overrides ([`LoadOptions`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use typed_builder::TypedBuilder;

/// Policy for input keys that match no declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unknown {
    /// Drop unknown keys.
    Exclude,
    /// Copy unknown keys into the validated mapping untouched.
    Include,
    /// Report every unknown key as a validation error.
    #[default]
    Raise,
}

pub const EXCLUDE: Unknown = Unknown::Exclude;
pub const INCLUDE: Unknown = Unknown::Include;
pub const RAISE: Unknown = Unknown::Raise;

/// Which required fields may be missing from the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PartialRepr", into = "PartialRepr")]
pub enum Partial {
    #[default]
    Off,
    All,
    Fields(BTreeSet<String>),
}

impl Partial {
    /// Partial loading for the given attribute names only.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(names.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if `name` may be missing even when required.
    #[must_use]
    pub fn allows_missing(&self, name: &str) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::Fields(names) => names.contains(name),
        }
    }
}

impl From<bool> for Partial {
    fn from(value: bool) -> Self {
        if value { Self::All } else { Self::Off }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PartialRepr {
    Flag(bool),
    Names(BTreeSet<String>),
}

impl From<PartialRepr> for Partial {
    fn from(repr: PartialRepr) -> Self {
        match repr {
            PartialRepr::Flag(flag) => flag.into(),
            PartialRepr::Names(names) => Self::Fields(names),
        }
    }
}

impl From<Partial> for PartialRepr {
    fn from(partial: Partial) -> Self {
        match partial {
            Partial::Off => Self::Flag(false),
            Partial::All => Self::Flag(true),
            Partial::Fields(names) => Self::Names(names),
        }
    }
}

/// Class-level defaults, inherited by subclasses that declare none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOpts {
    pub unknown: Unknown,
    pub many: bool,
}

fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

/// Settings fixed when a schema instance is created.
///
/// Unset values fall back to the class's [`SchemaOpts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    #[builder(default, setter(strip_option))]
    pub many: Option<bool>,
    #[builder(default, setter(strip_option))]
    pub unknown: Option<Unknown>,
    #[builder(default, setter(into))]
    pub partial: Partial,
    /// Restricts the instance to these attributes.
    #[builder(default, setter(transform = |names: &[&str]| Some(name_set(names))))]
    pub only: Option<BTreeSet<String>>,
    #[builder(default, setter(transform = |names: &[&str]| name_set(names)))]
    pub exclude: BTreeSet<String>,
    #[builder(default, setter(transform = |names: &[&str]| name_set(names)))]
    pub load_only: BTreeSet<String>,
    #[builder(default, setter(transform = |names: &[&str]| name_set(names)))]
    pub dump_only: BTreeSet<String>,
}

/// Overrides for a single load call; unset values use the instance settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct LoadOptions {
    #[builder(default, setter(strip_option))]
    pub many: Option<bool>,
    #[builder(default, setter(strip_option, into))]
    pub partial: Option<Partial>,
    #[builder(default, setter(strip_option))]
    pub unknown: Option<Unknown>,
}

impl LoadOptions {
    /// Forces a single-record load.
    #[must_use]
    pub fn single() -> Self {
        Self { many: Some(false), ..Self::default() }
    }

    /// Forces a collection load.
    #[must_use]
    pub fn collection() -> Self {
        Self { many: Some(true), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_accepts_flag_or_names() {
        let all: Partial = serde_json::from_str("true").expect("flag");
        assert_eq!(all, Partial::All);
        let some: Partial = serde_json::from_str(r#"["a", "b"]"#).expect("names");
        assert!(some.allows_missing("a"));
        assert!(!some.allows_missing("c"));
    }

    #[test]
    fn unknown_is_lowercase() {
        let opts: SchemaOpts = serde_json::from_str(r#"{"unknown": "exclude"}"#).expect("opts");
        assert_eq!(opts.unknown, EXCLUDE);
        assert!(!opts.many);
    }

    #[test]
    fn builder_collects_names() {
        let options = SchemaOptions::builder().many(true).only(&["a"]).exclude(&["b"]).build();
        assert_eq!(options.many, Some(true));
        assert_eq!(options.only.as_ref().map(BTreeSet::len), Some(1));
        assert!(options.exclude.contains("b"));
    }
}
