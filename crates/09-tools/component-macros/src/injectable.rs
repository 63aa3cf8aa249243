//! `#[derive(Injectable)]` 实现

use crate::utils::{field_accessor, inject_target};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{punctuated::Punctuated, Data, DeriveInput, Error, Fields, Result, Token, Type};

/// 类型级别的注入参数
#[derive(Default)]
struct InjectableArgs {
    lifetime: Option<TokenStream>,
    disposable: bool,
    contracts: Vec<Type>,
}

impl InjectableArgs {
    fn from_attributes(input: &DeriveInput) -> Result<Self> {
        let mut args = Self::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
            attr.parse_nested_meta(|meta| {
                let lifetime = if meta.path.is_ident("singleton") {
                    Some(quote!(::infrastructure_common::Lifetime::Singleton))
                } else if meta.path.is_ident("scoped") {
                    Some(quote!(::infrastructure_common::Lifetime::Scoped))
                } else if meta.path.is_ident("transient") {
                    Some(quote!(::infrastructure_common::Lifetime::Transient))
                } else {
                    None
                };

                if let Some(lifetime) = lifetime {
                    if args.lifetime.is_some() {
                        return Err(meta.error("lifetime declared more than once"));
                    }
                    args.lifetime = Some(lifetime);
                    Ok(())
                } else if meta.path.is_ident("disposable") {
                    args.disposable = true;
                    Ok(())
                } else if meta.path.is_ident("implements") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let contracts = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                    args.contracts.extend(contracts);
                    Ok(())
                } else {
                    Err(meta.error("expected `singleton`, `scoped`, `transient`, `disposable` or `implements(..)`"))
                }
            })?;
        }
        Ok(args)
    }
}

pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    let args = InjectableArgs::from_attributes(&input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Injectable can only be derived for structs",
            ))
        }
    };

    let mut injections = Vec::new();
    let mut initializers = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let target = inject_target(field)?.ok_or_else(|| {
            Error::new_spanned(field, "all constructor parameters must be injectable")
        })?;
        injections.push(quote! { .inject(#index, &#target) });

        let accessor = field_accessor(field, index);
        initializers.push(quote! { #accessor: args.get(#index)? });
    }

    let arity = fields.len();
    let lifetime = args.lifetime.map(|lifetime| quote! { .lifetime(#lifetime) });
    let disposable = args.disposable.then(|| quote! { .disposable() });

    let construct = match fields {
        Fields::Unit => quote! { Self },
        _ => quote! { Self { #(#initializers),* } },
    };

    let contracts = args.contracts.iter().map(|contract| {
        quote! {
            impl #impl_generics ::di_abstractions::Implements<#contract> for #name #ty_generics #where_clause {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#contract> {
                    self
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Injectable for #name #ty_generics #where_clause {
            fn descriptor() -> ::di_abstractions::InjectableDescriptor {
                ::di_abstractions::InjectableDescriptor::builder::<Self>()
                    #lifetime
                    #(#injections)*
                    .arity(#arity)
                    #disposable
                    .build()
            }

            #[allow(unused_variables)]
            fn construct(
                args: ::di_abstractions::InjectionArgs,
            ) -> ::std::result::Result<Self, ::infrastructure_common::BoxError> {
                ::std::result::Result::Ok(#construct)
            }
        }

        #(#contracts)*
    })
}
