#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the generic schema workspace.
//! This crate provides attribute macros that remove the boilerplate around
//! error enums and domain models consumed by `GenericSchema`.
//!
//! ## Usage
//! Consumers normally reach these macros through the `gschema` facade:
//! ```toml
//! [dependencies]
//! gschema = { path = "../crates/gschema" }
//! ```
//!
//! See each macro’s docstring for examples; they are `ignore`d to avoid compiling in this crate,
//! but should be copied into consuming crates’ tests as needed.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro to declare a domain model a generic schema can construct.
///
/// The annotated struct becomes constructible from a validated field mapping,
/// with keyword-argument semantics: every key is matched to a field by name,
/// a missing required field or an unexpected key is a construction error.
///
/// # Injected Behaviors
///
/// * **Derives**: `Serialize` and `Deserialize` when missing; `Debug` and `PartialEq`
///   too unless `derive_extras = false`.
/// * **Serde Policy**: `deny_unknown_fields` by default (can be disabled).
/// * **Model**: implements `gschema::Model` with the accepted and required field names,
///   honoring `#[serde(rename)]`, `#[serde(default)]`, `#[serde(skip)]` and `Option` fields.
///
/// # Arguments
///
/// * `name = "..."` - Overrides the model name used in diagnostics.
/// * `deny_unknown_fields = false` - Ignores unexpected keys instead of failing.
/// * `derive_extras = false` - Skips `Debug` and `PartialEq`, for fields that lack them.
///
/// # Errors
/// Emits a compile-time error for non-structs, tuple structs, or a container-level
/// `rename_all` (attribute names must match the schema's field names).
///
/// # Example
///
/// ```rust,ignore
/// use gschema::prelude::*;
///
/// #[model]
/// pub struct Foo {
///     pub field1: i64,
///     pub field2: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::model::expand_model(args.into(), input).into()
}

/// A high-level attribute macro for defining crate error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a fully-featured
/// error type with contextual messages and stable kinds.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Stable Kinds**: Generates `kind()` returning the variant name, so callers
///   can branch on the error kind instead of message text.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`), and no two variants may wrap
///    the same source type.
/// 4. Tuple or unit variants are rejected to keep error wiring explicit and reliable.
///
/// # Example
///
/// ```rust,ignore
/// use gschema_derive::schema_error;
/// use std::borrow::Cow;
///
/// #[schema_error]
/// pub enum CodecError {
///     #[error("Decode error{}: {source}", format_context(.context))]
///     Decode { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(text: &str) -> Result<serde_json::Value, CodecError> {
///     serde_json::from_str(text).context("Decoding request body")
/// }
/// ```
#[proc_macro_attribute]
pub fn schema_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
