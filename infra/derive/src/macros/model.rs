use crate::macros::error::{derived_trait_names, single_generic_arg};
use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::Parser;
use syn::{Data, DeriveInput, Expr, Fields, Lit, LitBool, LitStr, Meta};

struct ModelArgs {
    name: LitStr,
    deny_unknown_fields: bool,
    derive_extras: bool,
}

/// Constructor parameters of a model as seen by serde.
#[derive(Default)]
struct FieldNames {
    accepted: Vec<String>,
    required: Vec<String>,
}

#[derive(Default)]
struct SerdeFieldAttrs {
    rename: Option<String>,
    skipped: bool,
    defaulted: bool,
}

fn lit_of(expr: &Expr) -> Option<&Lit> {
    match expr {
        Expr::Lit(expr_lit) => Some(&expr_lit.lit),
        _ => None,
    }
}

fn parse_args(args: TokenStream, input: &DeriveInput) -> Result<ModelArgs, TokenStream> {
    let mut name: Option<LitStr> = None;
    let mut deny_unknown_fields = true;
    let mut derive_extras = true;

    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "Expected `name = \"...\"`, `deny_unknown_fields = bool` or `derive_extras = bool`",
            )
            .to_compile_error());
        };

        if name_value.path.is_ident("name") {
            let Some(Lit::Str(lit)) = lit_of(&name_value.value) else {
                return Err(syn::Error::new_spanned(
                    &name_value.value,
                    "Expected string literal for `name = \"...\"`",
                )
                .to_compile_error());
            };
            if name.replace(lit.clone()).is_some() {
                return Err(syn::Error::new_spanned(name_value, "Duplicate `name` argument")
                    .to_compile_error());
            }
        } else if name_value.path.is_ident("deny_unknown_fields") {
            deny_unknown_fields = bool_arg(&name_value, "deny_unknown_fields")?;
        } else if name_value.path.is_ident("derive_extras") {
            derive_extras = bool_arg(&name_value, "derive_extras")?;
        } else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Only `name`, `deny_unknown_fields` and `derive_extras` are supported",
            )
            .to_compile_error());
        }
    }

    let name = name
        .unwrap_or_else(|| LitStr::new(&input.ident.to_string(), proc_macro2::Span::call_site()));
    Ok(ModelArgs { name, deny_unknown_fields, derive_extras })
}

fn bool_arg(name_value: &syn::MetaNameValue, arg: &str) -> Result<bool, TokenStream> {
    match lit_of(&name_value.value) {
        Some(Lit::Bool(LitBool { value, .. })) => Ok(*value),
        _ => Err(syn::Error::new_spanned(
            &name_value.value,
            format!("Expected boolean literal for `{arg}`"),
        )
        .to_compile_error()),
    }
}

fn skip_value(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _content;
        syn::parenthesized!(_content in meta.input);
    }
    Ok(())
}

fn serde_field_attrs(field: &syn::Field) -> Result<SerdeFieldAttrs, TokenStream> {
    let mut attrs = SerdeFieldAttrs::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.rename = Some(lit.value());
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                attrs.skipped = true;
            } else if meta.path.is_ident("default") {
                attrs.defaulted = true;
                skip_value(&meta)?;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        })
        .map_err(|err| err.to_compile_error())?;
    }

    Ok(attrs)
}

fn rejects_rename_all(input: &DeriveInput) -> Option<TokenStream> {
    let mut found = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                found = Some(meta.path.clone());
            }
            skip_value(&meta)
        });
    }
    found.map(|path| {
        syn::Error::new_spanned(
            path,
            "model field names must match schema attribute names; rename on the schema with `data_key`",
        )
        .to_compile_error()
    })
}

fn field_names(input: &DeriveInput) -> Result<FieldNames, TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "model only supports structs")
            .to_compile_error());
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "model only supports structs with named fields",
        )
        .to_compile_error());
    };

    let mut names = FieldNames::default();
    for field in &fields.named {
        let attrs = serde_field_attrs(field)?;
        if attrs.skipped {
            continue;
        }
        let Some(ident) = &field.ident else { continue };
        let name = attrs.rename.unwrap_or_else(|| {
            let raw = ident.to_string();
            raw.strip_prefix("r#").map_or_else(|| raw.clone(), str::to_owned)
        });
        if !attrs.defaulted && single_generic_arg(&field.ty, "Option").is_none() {
            names.required.push(name.clone());
        }
        names.accepted.push(name);
    }

    Ok(names)
}

/// Expands the `#[model]` attribute.
pub fn expand_model(args: TokenStream, input: DeriveInput) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let args = match parse_args(args, &input) {
        Ok(args) => args,
        Err(err) => return err,
    };
    if let Some(err) = rejects_rename_all(&input) {
        return err;
    }
    let FieldNames { accepted, required } = match field_names(&input) {
        Ok(names) => names,
        Err(err) => return err,
    };

    let derived = derived_trait_names(&input.attrs);
    let extras = [
        ("Debug", quote! { ::core::fmt::Debug }),
        ("PartialEq", quote! { ::core::cmp::PartialEq }),
    ];
    let derives: Vec<TokenStream> = [
        ("Serialize", quote! { ::gschema::serde::Serialize }),
        ("Deserialize", quote! { ::gschema::serde::Deserialize }),
    ]
    .into_iter()
    .chain(extras.into_iter().filter(|_| args.derive_extras))
    .filter(|(trait_name, _)| !derived.contains(*trait_name))
    .map(|(_, path)| path)
    .collect();

    let serde_policy = if args.deny_unknown_fields {
        quote! { #[serde(crate = "::gschema::serde", deny_unknown_fields)] }
    } else {
        quote! { #[serde(crate = "::gschema::serde")] }
    };
    let model_name = &args.name;

    quote! {
        #[derive(#(#derives),*)]
        #serde_policy
        #input

        #[automatically_derived]
        impl #impl_generics ::gschema::Model for #name #ty_generics #where_clause {
            const NAME: &'static str = #model_name;
            const FIELDS: &'static [&'static str] = &[#(#accepted),*];
            const REQUIRED: &'static [&'static str] = &[#(#required),*];
        }
    }
}
