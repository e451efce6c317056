//! Derives for `hookcls`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Expr, Fields, parse_macro_input, spanned::Spanned};

/// Implements `hookcls::Props` for a struct with named fields.
///
/// Generates `{Name}Input`, the caller-facing form in which every field
/// marked `#[prop(default)]` or `#[prop(default = expr)]` becomes an
/// `Option`, and `{Name}Defaults`, the per-class default descriptor.
/// Defaulted field types must implement `Clone + Default`.
#[proc_macro_derive(Props, attributes(prop))]
pub fn derive_props(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

enum PropDefault {
    Required,
    FromClass,
    Value(Expr),
}

fn prop_default(field: &syn::Field) -> syn::Result<PropDefault> {
    let mut default = PropDefault::Required;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("prop")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("default") {
                return Err(meta.error("expected `default` or `default = ...`"));
            }
            default = if meta.input.peek(syn::Token![=]) {
                PropDefault::Value(meta.value()?.parse()?)
            } else {
                PropDefault::FromClass
            };
            Ok(())
        })?;
    }
    Ok(default)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Props cannot be derived for generic structs",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Props needs a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "Props can only be derived for structs",
            ));
        }
    };

    let vis = &input.vis;
    let name = &input.ident;
    let owner = name.to_string();
    let input_name = format_ident!("{}Input", name);
    let defaults_name = format_ident!("{}Defaults", name);

    let mut input_fields = Vec::new();
    let mut default_fields = Vec::new();
    let mut default_inits = Vec::new();
    let mut resolved = Vec::new();

    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
        let ty = &field.ty;
        let field_vis = &field.vis;
        let label = ident.to_string();
        match prop_default(field)? {
            PropDefault::Required => {
                input_fields.push(quote! { #field_vis #ident: #ty });
                resolved.push(quote! { #ident: input.#ident });
            }
            default => {
                input_fields.push(quote! { #field_vis #ident: ::std::option::Option<#ty> });
                default_fields.push(quote! { #field_vis #ident: ::std::option::Option<#ty> });
                default_inits.push(match default {
                    PropDefault::Value(expr) => quote! { #ident: ::std::option::Option::Some(#expr) },
                    _ => quote! { #ident: ::std::option::Option::None },
                });
                resolved.push(quote! {
                    #ident: ::hookcls::props::backfill(input.#ident, &defaults.#ident, #owner, #label)
                });
            }
        }
    }

    Ok(quote! {
        #[derive(Clone)]
        #vis struct #input_name {
            #(#input_fields,)*
        }

        #[derive(Clone)]
        #vis struct #defaults_name {
            #(#default_fields,)*
        }

        impl ::std::default::Default for #defaults_name {
            fn default() -> Self {
                Self {
                    #(#default_inits,)*
                }
            }
        }

        impl ::hookcls::Props for #name {
            type Input = #input_name;
            type Defaults = #defaults_name;

            #[allow(unused_variables)]
            fn resolve(input: #input_name, defaults: &#defaults_name) -> Self {
                Self {
                    #(#resolved,)*
                }
            }
        }
    })
}
