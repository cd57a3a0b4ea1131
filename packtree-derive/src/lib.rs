//! # packtree derive macros
//!
//! Provides `#[derive(Packable)]`, which implements the three mode traits
//! (`Writable`, `Readable`, `Definable`) so the generated traversals are
//! identical across modes by construction.
//!
//! Supported shapes:
//! 1. **Named-field structs** — object protocol, fields in declaration
//!    order. `#[packtree(trivial)]` additionally brackets the object in a
//!    trivial region sized as the sum of the field types.
//! 2. **Unit-variant enums** — `LabelledEnum` plus the enumerate protocol;
//!    labels are the snake_cased variant names.
//! 3. **Newtype-variant enums** — `LabelledVariant` plus the variant
//!    protocol, one label per arm.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DataEnum, DataStruct, DeriveInput, Fields};

/// Derives `Writable`, `Readable` and `Definable`.
#[proc_macro_derive(Packable, attributes(packtree))]
pub fn derive_packable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let result = match &input.data {
        Data::Struct(data) => derive_struct(&input, data),
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Packable does not support unions",
        )),
    };
    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// --- Structs ---

fn derive_struct(
    input: &DeriveInput,
    data: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Packable structs need named fields",
        ));
    };
    let trivial = parse_trivial(&input.attrs)?;

    let name = &input.ident;
    let idents: Vec<_> = fields
        .named
        .iter()
        .map(|f| f.ident.clone().expect("named field"))
        .collect();
    let keys: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let types: Vec<_> = fields.named.iter().map(|f| f.ty.clone()).collect();

    // The flat size of the region: field encodings are padding-free, so
    // the sum of the field sizes is the packed layout size.
    let size_expr = quote! { 0usize #(+ ::core::mem::size_of::<#types>())* };
    let open_trivial = trivial.then(|| quote! { let __trivial_size = #size_expr; });
    let write_trivial_begin = trivial.then(|| quote! { writer.trivial_begin(__trivial_size); });
    let write_trivial_end = trivial.then(|| quote! { writer.trivial_end(__trivial_size); });
    let read_trivial_begin = trivial.then(|| quote! { reader.trivial_begin(__trivial_size); });
    let read_trivial_end = trivial.then(|| quote! { reader.trivial_end(__trivial_size); });
    let define_trivial_begin = trivial.then(|| quote! { definer.trivial_begin(__trivial_size); });
    let define_trivial_end = trivial.then(|| quote! { definer.trivial_end(__trivial_size); });

    Ok(quote! {
        impl packtree::Writable for #name {
            fn write<W: packtree::Writer>(&self, writer: &mut W) {
                #open_trivial
                #write_trivial_begin
                writer.object_begin();
                #(
                    writer.value(#keys, &self.#idents);
                )*
                writer.object_end();
                #write_trivial_end
            }
        }

        impl packtree::Readable for #name {
            fn read<R: packtree::Reader>(&mut self, reader: &mut R) {
                #open_trivial
                #read_trivial_begin
                reader.object_begin();
                #(
                    reader.value(#keys, &mut self.#idents);
                )*
                reader.object_end();
                #read_trivial_end
            }
        }

        impl packtree::Definable for #name {
            fn define(definer: &mut packtree::Definer) {
                #open_trivial
                #define_trivial_begin
                definer.object_begin();
                #(
                    definer.object_next(#keys);
                    <#types as packtree::Definable>::define(definer);
                )*
                definer.object_end();
                #define_trivial_end
            }
        }
    })
}

/// Parses `#[packtree(...)]` attributes on a struct. Returns whether the
/// `trivial` flag is present.
fn parse_trivial(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut trivial = false;
    for attr in attrs {
        if attr.path().is_ident("packtree") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("trivial") {
                    trivial = true;
                    return Ok(());
                }
                Err(meta.error("unknown packtree attribute key"))
            })?;
        }
    }
    Ok(trivial)
}

// --- Enums ---

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let all_unit = data
        .variants
        .iter()
        .all(|v| matches!(v.fields, Fields::Unit));
    if all_unit {
        return derive_labelled_enum(input, data);
    }
    derive_labelled_variant(input, data)
}

fn derive_labelled_enum(
    input: &DeriveInput,
    data: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let idents: Vec<_> = data.variants.iter().map(|v| v.ident.clone()).collect();
    let labels: Vec<String> = idents.iter().map(|i| snake_case(&i.to_string())).collect();
    let indices: Vec<usize> = (0..idents.len()).collect();

    Ok(quote! {
        impl packtree::LabelledEnum for #name {
            fn labels() -> &'static [&'static str] {
                &[#(#labels),*]
            }

            fn to_index(&self) -> usize {
                match self {
                    #(Self::#idents => #indices,)*
                }
            }

            fn from_index(index: usize) -> Option<Self> {
                match index {
                    #(#indices => Some(Self::#idents),)*
                    _ => None,
                }
            }
        }

        impl packtree::Writable for #name {
            fn write<W: packtree::Writer>(&self, writer: &mut W) {
                packtree::label::write_enum(self, writer);
            }
        }

        impl packtree::Readable for #name {
            fn read<R: packtree::Reader>(&mut self, reader: &mut R) {
                packtree::label::read_enum(self, reader);
            }
        }

        impl packtree::Definable for #name {
            fn define(definer: &mut packtree::Definer) {
                packtree::label::define_enum::<Self>(definer);
            }
        }
    })
}

fn derive_labelled_variant(
    input: &DeriveInput,
    data: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let mut idents = Vec::new();
    let mut labels = Vec::new();
    let mut types = Vec::new();
    for variant in &data.variants {
        let Fields::Unnamed(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "Packable enum arms need exactly one unnamed field \
                 (each arm carries one value subtree); use a unit-only \
                 enum for the enumerate protocol",
            ));
        };
        if fields.unnamed.len() != 1 {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "Packable enum arms need exactly one unnamed field",
            ));
        }
        idents.push(variant.ident.clone());
        labels.push(snake_case(&variant.ident.to_string()));
        types.push(fields.unnamed[0].ty.clone());
    }

    Ok(quote! {
        impl packtree::LabelledVariant for #name {
            fn labels() -> &'static [&'static str] {
                &[#(#labels),*]
            }

            fn label(&self) -> &'static str {
                match self {
                    #(Self::#idents(_) => #labels,)*
                }
            }
        }

        impl packtree::Writable for #name {
            fn write<W: packtree::Writer>(&self, writer: &mut W) {
                writer.variant_begin(
                    packtree::LabelledVariant::label(self),
                    <Self as packtree::LabelledVariant>::labels(),
                );
                match self {
                    #(Self::#idents(value) => packtree::Writable::write(value, writer),)*
                }
                writer.variant_end();
            }
        }

        impl packtree::Readable for #name {
            fn read<R: packtree::Reader>(&mut self, reader: &mut R) {
                reader.variant_begin(<Self as packtree::LabelledVariant>::labels());
                let mut matched = false;
                #(
                    if !matched || reader.is_exhaustive() {
                        if reader.variant_match(#labels) {
                            matched = true;
                            let mut value = <#types as ::core::default::Default>::default();
                            packtree::Readable::read(&mut value, reader);
                            *self = Self::#idents(value);
                        }
                    }
                )*
                if !matched && !reader.is_exhaustive() {
                    reader.error("no matching variant label");
                }
                reader.variant_end();
            }
        }

        impl packtree::Definable for #name {
            fn define(definer: &mut packtree::Definer) {
                definer.variant_begin(<Self as packtree::LabelledVariant>::labels());
                #(
                    definer.variant_next(#labels);
                    <#types as packtree::Definable>::define(definer);
                )*
                definer.variant_end();
            }
        }
    })
}

/// CamelCase → snake_case for variant labels.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
