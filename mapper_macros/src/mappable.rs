//! Mappable derive macro implementation
//!
//! Generates a `Mappable` impl whose descriptor lives in a `LazyLock` static, so every
//! instance of the type shares one `Arc<TypeDescriptor>`.

use heck::ToUpperCamelCase;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Fields, FieldsNamed, Ident, parse_macro_input};

use crate::attributes::{ContainerAttrs, parse_container_attrs, parse_field_attrs};

/// Implementation of the Mappable derive macro
pub fn derive_mappable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Mappable cannot be derived for generic types",
        ));
    }

    let container = parse_container_attrs(&input.attrs)?;
    let type_name = registered_name(&input.ident, &container);

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_struct(&input.ident, &type_name, &container, fields),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "Mappable structs need named fields",
            )),
        },
        Data::Enum(data) => {
            if container.configure.is_some() || container.default {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "`configure` and `default` apply to structs only",
                ));
            }
            expand_enum(&input.ident, &type_name, data)
        },
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Mappable cannot be derived for unions",
        )),
    }
}

/// Explicit `#[mapping(name)]`, else the module path of the deriving type
fn registered_name(ident: &Ident, container: &ContainerAttrs) -> TokenStream2 {
    match &container.name {
        Some(name) => quote! { #name },
        None => {
            let ident = ident.to_string();
            quote! { ::core::concat!(::core::module_path!(), "::", #ident) }
        },
    }
}

fn expand_struct(
    ident: &Ident,
    type_name: &TokenStream2,
    container: &ContainerAttrs,
    fields: &FieldsNamed,
) -> syn::Result<TokenStream2> {
    let mut field_descriptors = Vec::new();
    let mut registrations = Vec::new();
    let mut to_slots = Vec::new();
    let mut from_slots = Vec::new();

    for field in &fields.named {
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_ty = &field.ty;
        let field_name = field_ident.to_string().to_upper_camel_case();
        let attrs = parse_field_attrs(field)?;

        let mut descriptor = quote! {
            ::graph_mapper::FieldDescriptor::new(
                #field_name,
                <#field_ty as ::graph_mapper::Mappable>::field_type(),
            )
        };
        if let Some((candidates, literal)) = &attrs.bind_to {
            descriptor = if *literal {
                quote! { #descriptor.bind_to_literal(#candidates) }
            } else {
                quote! { #descriptor.bind_to(#candidates) }
            };
        }
        for bind in &attrs.complex_binds {
            let dest = &bind.dest;
            let source = &bind.source;
            descriptor = quote! { #descriptor.complex_bind(#dest, #source) };
        }
        if attrs.ignore {
            descriptor = quote! { #descriptor.ignore() };
        }
        if let Some(converter) = &attrs.converter {
            descriptor = quote! { #descriptor.converter(#converter) };
        }
        field_descriptors.push(descriptor);

        registrations.push(quote! {
            <#field_ty as ::graph_mapper::Mappable>::register(registry);
        });
        to_slots.push(quote! {
            ::graph_mapper::Mappable::to_value(&self.#field_ident)
        });
        from_slots.push(quote! {
            #field_ident: <#field_ty as ::graph_mapper::Mappable>::from_value(
                &object.get_by_name(#field_name)?,
            )?
        });
    }

    let configure = container.configure.as_ref().map(|path| {
        quote! { let builder = builder.configure(#path); }
    });
    let constructor = container.default.then(|| {
        quote! {
            let builder = builder.constructor(|| {
                ::graph_mapper::Mappable::to_value(
                    &<#ident as ::core::default::Default>::default(),
                )
            });
        }
    });

    Ok(quote! {
        impl ::graph_mapper::Mappable for #ident {
            fn field_type() -> ::graph_mapper::FieldType {
                ::graph_mapper::FieldType::object(#type_name)
            }

            fn register(registry: &::graph_mapper::TypeRegistry) {
                if registry.contains(&::graph_mapper::TypeName::from(#type_name)) {
                    return;
                }
                if let Some(descriptor) = <#ident as ::graph_mapper::Mappable>::descriptor() {
                    registry.register_shared(descriptor);
                }
                #(#registrations)*
            }

            fn descriptor() -> ::core::option::Option<
                ::std::sync::Arc<::graph_mapper::TypeDescriptor>,
            > {
                static DESCRIPTOR: ::std::sync::LazyLock<
                    ::std::sync::Arc<::graph_mapper::TypeDescriptor>,
                > = ::std::sync::LazyLock::new(|| {
                    let builder = ::graph_mapper::TypeDescriptor::structure(#type_name)
                        #(.field(#field_descriptors))*;
                    #configure
                    #constructor
                    ::std::sync::Arc::new(builder.build())
                });
                ::core::option::Option::Some(::std::sync::Arc::clone(&DESCRIPTOR))
            }

            fn to_value(&self) -> ::graph_mapper::Value {
                let slots = ::std::vec![#(#to_slots),*];
                match <#ident as ::graph_mapper::Mappable>::descriptor() {
                    ::core::option::Option::Some(descriptor) => ::graph_mapper::Value::Object(
                        ::graph_mapper::ObjectRef::new(descriptor, slots),
                    ),
                    ::core::option::Option::None => ::graph_mapper::Value::Null,
                }
            }

            fn from_value(value: &::graph_mapper::Value) -> ::core::option::Option<Self> {
                let object = value.as_object()?;
                ::core::option::Option::Some(Self {
                    #(#from_slots),*
                })
            }
        }
    })
}

fn expand_enum(
    ident: &Ident,
    type_name: &TokenStream2,
    data: &DataEnum,
) -> syn::Result<TokenStream2> {
    let mut variant_idents = Vec::new();
    let mut variant_names = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Mappable enums must have unit variants only",
            ));
        }
        variant_idents.push(&variant.ident);
        variant_names.push(variant.ident.to_string());
    }
    if variant_idents.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "Mappable enums need at least one variant",
        ));
    }

    Ok(quote! {
        impl ::graph_mapper::Mappable for #ident {
            fn field_type() -> ::graph_mapper::FieldType {
                ::graph_mapper::FieldType::enumeration(#type_name)
            }

            fn register(registry: &::graph_mapper::TypeRegistry) {
                if registry.contains(&::graph_mapper::TypeName::from(#type_name)) {
                    return;
                }
                if let Some(descriptor) = <#ident as ::graph_mapper::Mappable>::descriptor() {
                    registry.register_shared(descriptor);
                }
            }

            fn descriptor() -> ::core::option::Option<
                ::std::sync::Arc<::graph_mapper::TypeDescriptor>,
            > {
                static DESCRIPTOR: ::std::sync::LazyLock<
                    ::std::sync::Arc<::graph_mapper::TypeDescriptor>,
                > = ::std::sync::LazyLock::new(|| {
                    ::std::sync::Arc::new(::graph_mapper::TypeDescriptor::enumeration(
                        #type_name,
                        [#(#variant_names),*],
                    ))
                });
                ::core::option::Option::Some(::std::sync::Arc::clone(&DESCRIPTOR))
            }

            fn to_value(&self) -> ::graph_mapper::Value {
                let variant = match self {
                    #(Self::#variant_idents => #variant_names,)*
                };
                ::graph_mapper::Value::Enum(::graph_mapper::EnumValue::new(#type_name, variant))
            }

            fn from_value(value: &::graph_mapper::Value) -> ::core::option::Option<Self> {
                let ::graph_mapper::Value::Enum(enum_value) = value else {
                    return ::core::option::Option::None;
                };
                #(
                    if enum_value.variant.eq_ignore_ascii_case(#variant_names) {
                        return ::core::option::Option::Some(Self::#variant_idents);
                    }
                )*
                ::core::option::Option::None
            }
        }
    })
}
