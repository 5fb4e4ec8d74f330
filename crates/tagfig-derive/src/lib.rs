//! `#[derive(Walk)]` for tagfig configuration structs.
//!
//! ```ignore
//! #[derive(Walk, Default)]
//! struct Server {
//!     /// Address to bind.
//!     #[tagfig(env = "BIND_ADDR", short = "b")]
//!     pub addr: String,
//!
//!     #[tagfig(sep = ";", config = "peers,string")]
//!     pub peers: Vec<String>,
//!
//!     #[tagfig(ignore)]
//!     pub runtime_only: u64,
//! }
//! ```
//!
//! Every `key = "value"` pair inside `#[tagfig(...)]` becomes a tag on the
//! field, in the order written. `///` docs become the `help` tag unless one
//! is given explicitly. Private fields are not visited.
//!
//! On the struct itself, `#[tagfig(text)]` turns it into a single leaf that is
//! rendered with `Display` and parsed with `FromStr`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Field, Fields, Lit, LitStr, Meta, Result, Visibility,
    parse_macro_input,
};

#[proc_macro_derive(Walk, attributes(tagfig))]
pub fn derive_walk(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed `#[tagfig(...)]` on one field.
#[derive(Default)]
struct FieldAttrs {
    ignore: bool,
    tags: Vec<(String, String)>,
}

fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tagfig")) {
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("expected a tag name"));
            };
            let key = ident.to_string();
            if key == "ignore" {
                parsed.ignore = true;
                return Ok(());
            }
            let value: LitStr = meta.value()?.parse()?;
            parsed.tags.push((key, value.value()));
            Ok(())
        })?;
    }

    if !parsed.tags.iter().any(|(k, _)| k == "help") {
        let doc = doc_text(attrs);
        if !doc.is_empty() {
            parsed.tags.push(("help".to_string(), doc));
        }
    }
    Ok(parsed)
}

/// `///` lines joined into one sentence.
fn doc_text(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("doc")) {
        if let Meta::NameValue(nv) = &attr.meta
            && let Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) = &nv.value
        {
            let line = s.value();
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }
    lines.join(" ")
}

fn is_text_container(attrs: &[Attribute]) -> Result<bool> {
    let mut text = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("tagfig")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("text") {
                text = true;
                Ok(())
            } else {
                Err(meta.error("unsupported container attribute, expected `text`"))
            }
        })?;
    }
    Ok(text)
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Walk requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Walk can only be derived for structs",
            ));
        }
    };

    let mut visits = Vec::new();
    for field in fields {
        if matches!(field.vis, Visibility::Inherited) {
            continue;
        }
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.ignore {
            continue;
        }
        let ident = field.ident.as_ref().expect("named field");
        let field_name = ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name);
        let ty = &field.ty;
        let keys = attrs.tags.iter().map(|(k, _)| k);
        let values = attrs.tags.iter().map(|(_, v)| v);
        visits.push(quote! {
            walker.field(
                ::tagfig::FieldInfo {
                    name: #field_name,
                    type_name: ::core::any::type_name::<#ty>(),
                    tags: &[#((#keys, #values)),*],
                },
                &mut self.#ident,
            )?;
        });
    }

    let walker = if visits.is_empty() {
        quote! { _walker }
    } else {
        quote! { walker }
    };

    let text = is_text_container(&input.attrs)?;

    let as_value = if text {
        quote! {
            fn as_value(&mut self) -> ::core::option::Option<&mut dyn ::tagfig::FieldValue> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    let visit_body = if text {
        quote! { walker.leaf(field, self) }
    } else {
        quote! { walker.branch(field, self) }
    };

    let text_codec = if text {
        quote! {
            impl #impl_generics ::tagfig::FieldValue for #name #ty_generics #where_clause {
                fn kind(&self) -> ::tagfig::Kind {
                    ::tagfig::Kind::Opaque
                }

                fn encode(&self, _opts: &::tagfig::CodecOptions) -> ::std::string::String {
                    ::std::string::ToString::to_string(self)
                }

                fn decode(
                    &mut self,
                    raw: &str,
                    _opts: &::tagfig::CodecOptions,
                ) -> ::core::result::Result<(), ::tagfig::CodecError> {
                    *self = ::core::str::FromStr::from_str(raw)
                        .map_err(|e| ::tagfig::CodecError::new(raw, "value", e))?;
                    ::core::result::Result::Ok(())
                }
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl #impl_generics ::tagfig::Walk for #name #ty_generics #where_clause {
            fn walk<'__a>(
                &'__a mut self,
                #walker: &mut ::tagfig::Walker<'__a>,
            ) -> ::core::result::Result<(), ::tagfig::TagfigError> {
                #(#visits)*
                ::core::result::Result::Ok(())
            }

            #as_value
        }

        impl #impl_generics ::tagfig::Visit for #name #ty_generics #where_clause {
            fn visit<'__a>(
                &'__a mut self,
                field: &::tagfig::FieldInfo,
                walker: &mut ::tagfig::Walker<'__a>,
            ) -> ::core::result::Result<(), ::tagfig::TagfigError> {
                #visit_body
            }
        }

        impl #impl_generics ::tagfig::Element for #name #ty_generics #where_clause {
            const KIND: ::core::option::Option<::tagfig::Scalar> = ::core::option::Option::None;

            fn encode_element(&self, _opts: &::tagfig::CodecOptions) -> ::std::string::String {
                ::core::unreachable!("struct list elements are never encoded")
            }

            fn decode_element(
                _raw: &str,
                _opts: &::tagfig::CodecOptions,
            ) -> ::core::result::Result<Self, ::tagfig::CodecError> {
                ::core::unreachable!("struct list elements are never decoded")
            }
        }

        #text_codec
    })
}
