//! `#[derive(Message)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, Index, LitStr, Member, Type, parse_macro_input,
    spanned::Spanned,
};

/// Options read from `#[message(...)]` on the type.
#[derive(Default)]
struct TypeOptions {
    bus: Option<LitStr>,
}

/// A field tagged `#[message(...)]`.
struct TaggedField {
    member: Member,
    ty: Type,
    parent: bool,
    cancellation: bool,
}

fn parse_type_options(attrs: &[Attribute]) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("message")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("bus") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("bus name cannot be empty"));
                }
                if options.bus.replace(value).is_some() {
                    return Err(meta.error("duplicate `bus` attribute"));
                }
                Ok(())
            } else {
                Err(meta.error("unknown message attribute, expected `bus = \"...\"`"))
            }
        })?;
    }

    Ok(options)
}

fn parse_field_tags(attrs: &[Attribute]) -> syn::Result<(bool, bool)> {
    let mut parent = false;
    let mut cancellation = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("message")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                parent = true;
                Ok(())
            } else if meta.path.is_ident("cancellation") {
                cancellation = true;
                Ok(())
            } else {
                Err(meta.error("unknown field attribute, expected `parent` or `cancellation`"))
            }
        })?;
    }

    Ok((parent, cancellation))
}

fn tagged_fields(input: &DeriveInput) -> syn::Result<Vec<TaggedField>> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            for variant in &data.variants {
                for field in &variant.fields {
                    if field.attrs.iter().any(|a| a.path().is_ident("message")) {
                        return Err(syn::Error::new_spanned(
                            field,
                            "`#[message(...)]` fields are only supported on structs",
                        ));
                    }
                }
            }
            return Ok(Vec::new());
        }
        Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "Message cannot be derived for unions",
            ));
        }
    };

    let mut tagged = Vec::new();
    let mut cancellation_seen = false;

    let members: Vec<Member> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(Member::Named))
            .collect(),
        Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len())
            .map(|i| Member::Unnamed(Index::from(i)))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    for (field, member) in fields.iter().zip(members) {
        let (parent, cancellation) = parse_field_tags(&field.attrs)?;
        if !parent && !cancellation {
            continue;
        }
        if cancellation {
            if cancellation_seen {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field can hold the cancellation state",
                ));
            }
            cancellation_seen = true;
        }
        tagged.push(TaggedField {
            member,
            ty: field.ty.clone(),
            parent,
            cancellation,
        });
    }

    Ok(tagged)
}

/// Implementation of `#[derive(Message)]`.
pub fn derive_message_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let options = parse_type_options(&input.attrs)?;
    let fields = tagged_fields(input)?;

    let parents: Vec<&TaggedField> = fields.iter().filter(|f| f.parent).collect();
    let cancellation = fields.iter().find(|f| f.cancellation);

    let message_type = if parents.is_empty() {
        TokenStream2::new()
    } else {
        let parent_types = parents.iter().map(|f| &f.ty);
        quote! {
            fn message_type() -> ::herald::TypeKey {
                ::herald::TypeKey::with_parents::<Self>(|| {
                    ::std::vec![#(<#parent_types as ::herald::Message>::message_type()),*]
                })
            }
        }
    };

    let upcast = if parents.is_empty() {
        TokenStream2::new()
    } else {
        let parent_members = parents.iter().map(|f| &f.member);
        quote! {
            fn upcast_mut(
                &mut self,
                ty: ::std::any::TypeId,
            ) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    return ::std::option::Option::Some(self);
                }
                #(
                    if let ::std::option::Option::Some(view) =
                        ::herald::Message::upcast_mut(&mut self.#parent_members, ty)
                    {
                        return ::std::option::Option::Some(view);
                    }
                )*
                ::std::option::Option::None
            }
        }
    };

    let parent_members: Vec<&Member> = parents.iter().map(|f| &f.member).collect();

    // A message with its own state reports itself, so a parent cancelled
    // through its view still stops dispatch of the whole message.
    let cancellable = match cancellation {
        Some(_) => quote! {
            fn cancellable(&self) -> ::std::option::Option<&dyn ::herald::Cancellable> {
                ::std::option::Option::Some(self)
            }
        },
        None if !parents.is_empty() => quote! {
            fn cancellable(&self) -> ::std::option::Option<&dyn ::herald::Cancellable> {
                let mut first: ::std::option::Option<&dyn ::herald::Cancellable> =
                    ::std::option::Option::None;
                #(
                    if let ::std::option::Option::Some(state) =
                        ::herald::Message::cancellable(&self.#parent_members)
                    {
                        if state.is_cancelled() {
                            return ::std::option::Option::Some(state);
                        }
                        first = first.or(::std::option::Option::Some(state));
                    }
                )*
                first
            }
        },
        None => TokenStream2::new(),
    };

    let cancellable_impl = cancellation.map(|field| {
        let member = &field.member;
        quote! {
            impl #impl_generics ::herald::Cancellable for #name #ty_generics #where_clause {
                fn set_cancelled(
                    &mut self,
                    cancelled: bool,
                    message: ::std::option::Option<::std::string::String>,
                ) {
                    ::herald::Cancellable::set_cancelled(&mut self.#member, cancelled, message)
                }

                fn is_cancelled(&self) -> bool {
                    ::herald::Cancellable::is_cancelled(&self.#member)
                    #(
                        || ::herald::Message::cancellable(&self.#parent_members)
                            .is_some_and(|state| state.is_cancelled())
                    )*
                }

                fn cancellation_message(&self) -> ::std::option::Option<&str> {
                    if ::herald::Cancellable::is_cancelled(&self.#member) {
                        return ::herald::Cancellable::cancellation_message(&self.#member);
                    }
                    #(
                        if let ::std::option::Option::Some(state) =
                            ::herald::Message::cancellable(&self.#parent_members)
                        {
                            if state.is_cancelled() {
                                return state.cancellation_message();
                            }
                        }
                    )*
                    ::herald::Cancellable::cancellation_message(&self.#member)
                }
            }
        }
    });

    let routed_impl = options.bus.map(|bus| {
        quote! {
            impl #impl_generics ::herald::Routed for #name #ty_generics #where_clause {
                const BUS: &'static str = #bus;
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::herald::Message for #name #ty_generics #where_clause {
            #message_type
            #upcast
            #cancellable
        }

        #cancellable_impl
        #routed_impl
    })
}
