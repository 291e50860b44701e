//! # xnbcode Derive Macros
//!
//! This crate provides `#[derive(Content)]` for `xnbcode`. It generates the
//! static codec of a record (struct) or a C-like enum: its descriptor, the
//! codecs it depends on, and the field-by-field write and read order.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DataStruct, DeriveInput, Fields, Ident, LitInt, LitStr, Type,
    parse_macro_input, parse_quote,
};

/// Derives `xnbcode::Content`.
///
/// # Container attributes (`#[content(...)]`)
/// * `name = "..."`: logical descriptor name (defaults to the type name).
/// * `version = N`: type version written to the type table.
/// * `runtime_type = "..."`: name written in place of the logical name.
/// * `value`: written inline, like a math record.
/// * `no_compress`: a container holding this type is never compressed.
///
/// # Field attributes
/// * `ignore`: not serialized; reset to `Default` on a fresh read.
/// * `shared`: written through the shared-resource path
///   (`SharedRef<T>` or `Vec<SharedRef<T>>`).
/// * `base`: the base record; written first, inline.
///
/// Structs must implement `Default`. Enums must be unit-only and are
/// written through their `#[repr]` integer (default `i32`).
#[proc_macro_derive(Content, attributes(content))]
pub fn derive_content(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let result = match &input.data {
        Data::Struct(ds) => derive_struct(&input, ds),
        Data::Enum(de) => derive_enum(&input, de),
        Data::Union(_) => Err(syn::Error::new(
            input.ident.span(),
            "Content cannot be derived for unions",
        )),
    };
    result.unwrap_or_else(|e| e.to_compile_error()).into()
}

// --- Attribute parsing ---

#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
    version: Option<LitInt>,
    runtime_type: Option<String>,
    value: bool,
    no_compress: bool,
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("content") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let s: LitStr = meta.value()?.parse()?;
                out.name = Some(s.value());
                return Ok(());
            }
            if meta.path.is_ident("version") {
                out.version = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("runtime_type") {
                let s: LitStr = meta.value()?.parse()?;
                out.runtime_type = Some(s.value());
                return Ok(());
            }
            if meta.path.is_ident("value") {
                out.value = true;
                return Ok(());
            }
            if meta.path.is_ident("no_compress") {
                out.no_compress = true;
                return Ok(());
            }
            Err(meta.error(
                "unknown content attribute. Supported: name, version, runtime_type, value, no_compress",
            ))
        })?;
    }
    Ok(out)
}

#[derive(Clone, Copy, PartialEq)]
enum FieldKind {
    Member,
    Shared,
    Base,
    Ignored,
}

fn parse_field_kind(attrs: &[Attribute]) -> syn::Result<FieldKind> {
    let mut kind = FieldKind::Member;
    for attr in attrs {
        if !attr.path().is_ident("content") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("ignore") {
                FieldKind::Ignored
            } else if meta.path.is_ident("shared") {
                FieldKind::Shared
            } else if meta.path.is_ident("base") {
                FieldKind::Base
            } else {
                return Err(meta.error("unknown field attribute. Supported: ignore, shared, base"));
            };
            if kind != FieldKind::Member {
                return Err(meta.error("a field takes at most one of ignore, shared, base"));
            }
            kind = next;
            Ok(())
        })?;
    }
    Ok(kind)
}

// --- Descriptor ---

fn descriptor_expr(
    input: &DeriveInput,
    attrs: &ContainerAttrs,
    base_name: &str,
) -> proc_macro2::TokenStream {
    let name = attrs.name.clone().unwrap_or_else(|| base_name.to_owned());
    let type_params: Vec<&Ident> = input.generics.type_params().map(|p| &p.ident).collect();

    let mut expr = if type_params.is_empty() {
        quote! { ::xnbcode::TypeDescriptor::new(#name) }
    } else {
        quote! {
            ::xnbcode::TypeDescriptor::generic(
                #name,
                &[#(<#type_params as ::xnbcode::Content>::descriptor()),*],
            )
        }
    };
    if let Some(version) = &attrs.version {
        expr = quote! { #expr.with_version(#version) };
    }
    if let Some(rt) = &attrs.runtime_type {
        expr = quote! { #expr.with_runtime_name(#rt) };
    }
    expr
}

// --- Structs ---

struct FieldInfo {
    access: proc_macro2::TokenStream,
    ty: Type,
    kind: FieldKind,
}

fn derive_struct(input: &DeriveInput, ds: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = parse_container_attrs(&input.attrs)?;
    let ident = &input.ident;

    let mut fields = Vec::new();
    let iter: Box<dyn Iterator<Item = &syn::Field>> = match &ds.fields {
        Fields::Named(named) => Box::new(named.named.iter()),
        Fields::Unnamed(unnamed) => Box::new(unnamed.unnamed.iter()),
        Fields::Unit => Box::new(std::iter::empty()),
    };
    for (index, field) in iter.enumerate() {
        let access = match &field.ident {
            Some(name) => quote! { #name },
            None => {
                let index = syn::Index::from(index);
                quote! { #index }
            }
        };
        fields.push(FieldInfo {
            access,
            ty: field.ty.clone(),
            kind: parse_field_kind(&field.attrs)?,
        });
    }

    let bases: Vec<&FieldInfo> = fields.iter().filter(|f| f.kind == FieldKind::Base).collect();
    if bases.len() > 1 {
        return Err(syn::Error::new(
            ident.span(),
            "a record has at most one #[content(base)] field",
        ));
    }
    // The base always goes first, whatever its declaration position.
    let ordered: Vec<&FieldInfo> = bases
        .iter()
        .copied()
        .chain(fields.iter().filter(|f| matches!(f.kind, FieldKind::Member | FieldKind::Shared)))
        .collect();

    let registrations = ordered.iter().map(|f| {
        let ty = &f.ty;
        match f.kind {
            FieldKind::Shared => {
                quote! { <#ty as ::xnbcode::SharedSlot>::register_shared(registrar); }
            }
            _ => quote! { registrar.include::<#ty>(); },
        }
    });

    let writes = ordered.iter().map(|f| {
        let access = &f.access;
        match f.kind {
            FieldKind::Base => {
                quote! { ::xnbcode::Content::write_content(&self.#access, writer)?; }
            }
            FieldKind::Shared => {
                quote! { ::xnbcode::SharedSlot::write_shared(&self.#access, writer)?; }
            }
            _ => quote! { writer.write_member(&self.#access)?; },
        }
    });

    let reads = ordered.iter().map(|f| {
        let access = &f.access;
        match f.kind {
            FieldKind::Base => {
                quote! { ::xnbcode::Content::read_content_into(&mut self.#access, reader)?; }
            }
            FieldKind::Shared => {
                quote! { ::xnbcode::SharedSlot::read_shared(&mut self.#access, reader)?; }
            }
            _ => quote! { reader.read_member_into(&mut self.#access)?; },
        }
    });

    let descriptor = descriptor_expr(input, &attrs, &ident.to_string());
    let value_type = attrs.value;
    let should_compress = if attrs.no_compress {
        quote! {
            fn should_compress(_platform: ::xnbcode::TargetPlatform) -> bool {
                false
            }
        }
    } else {
        quote! {}
    };

    let (_, ty_generics, _) = input.generics.split_for_impl();
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::xnbcode::Content));
    }
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#ident #ty_generics: ::core::default::Default));
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::xnbcode::Content for #ident #ty_generics #where_clause {
            const VALUE_TYPE: bool = #value_type;

            fn descriptor() -> ::xnbcode::TypeDescriptor {
                #descriptor
            }

            #[allow(unused_variables)]
            fn register_dependencies(registrar: &mut ::xnbcode::Registrar<'_>) {
                #(#registrations)*
            }

            #should_compress

            #[allow(unused_variables)]
            fn write_content(&self, writer: &mut ::xnbcode::ContentWriter<'_>) -> ::xnbcode::Result<()> {
                #(#writes)*
                Ok(())
            }

            fn read_content(reader: &mut ::xnbcode::ContentReader<'_>) -> ::xnbcode::Result<Self> {
                let mut value = <Self as ::core::default::Default>::default();
                ::xnbcode::Content::read_content_into(&mut value, reader)?;
                Ok(value)
            }

            #[allow(unused_variables)]
            fn read_content_into(&mut self, reader: &mut ::xnbcode::ContentReader<'_>) -> ::xnbcode::Result<()> {
                #(#reads)*
                Ok(())
            }
        }
    })
}

// --- Enums ---

fn repr_type(attrs: &[Attribute]) -> syn::Result<Ident> {
    const INTEGERS: [&str; 8] = ["u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64"];
    let mut repr = format_ident!("i32");
    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident()
                && INTEGERS.contains(&ident.to_string().as_str())
            {
                repr = ident.clone();
            }
            Ok(())
        })?;
    }
    Ok(repr)
}

fn derive_enum(input: &DeriveInput, de: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = parse_container_attrs(&input.attrs)?;
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(ident.span(), "Content enums cannot be generic"));
    }
    if de.variants.is_empty() {
        return Err(syn::Error::new(ident.span(), "Content enums need at least one variant"));
    }
    for variant in &de.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.ident.span(),
                "Content enums must have unit variants only",
            ));
        }
    }
    let repr = repr_type(&input.attrs)?;
    let variants: Vec<&Ident> = de.variants.iter().map(|v| &v.ident).collect();
    let type_name = ident.to_string();

    let name = attrs.name.clone().unwrap_or_else(|| type_name.clone());
    let mut descriptor = quote! {
        ::xnbcode::TypeDescriptor::generic("Enum", &[::xnbcode::TypeDescriptor::new(#name)])
    };
    if let Some(version) = &attrs.version {
        descriptor = quote! { #descriptor.with_version(#version) };
    }
    if let Some(rt) = &attrs.runtime_type {
        descriptor = quote! { #descriptor.with_runtime_name(#rt) };
    }

    Ok(quote! {
        impl ::xnbcode::Content for #ident {
            const VALUE_TYPE: bool = true;

            fn descriptor() -> ::xnbcode::TypeDescriptor {
                #descriptor
            }

            fn register_dependencies(registrar: &mut ::xnbcode::Registrar<'_>) {
                registrar.include::<#repr>();
            }

            fn write_content(&self, writer: &mut ::xnbcode::ContentWriter<'_>) -> ::xnbcode::Result<()> {
                let raw: #repr = match self {
                    #(Self::#variants => Self::#variants as #repr,)*
                };
                ::xnbcode::Content::write_content(&raw, writer)
            }

            fn read_content(reader: &mut ::xnbcode::ContentReader<'_>) -> ::xnbcode::Result<Self> {
                let raw = <#repr as ::xnbcode::Content>::read_content(reader)?;
                #(
                    if raw == Self::#variants as #repr {
                        return Ok(Self::#variants);
                    }
                )*
                Err(::xnbcode::rt::invalid_discriminant(#type_name, raw))
            }
        }
    })
}
