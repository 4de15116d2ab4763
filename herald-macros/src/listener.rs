//! Listener-related macros.
//!
//! This module contains:
//! - `#[listener]` - event bus handlers from `#[subscribe]` methods
//! - `#[observer]` - action observers from `#[observe("...")]` methods

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Path, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
};

/// Which `Listener` flavour an impl block produces.
#[derive(Clone, Copy)]
pub(crate) enum Kind {
    /// `Listener<TypeKey>`, handlers marked `#[subscribe]`.
    Listener,
    /// `Listener<ActionKey>`, handlers marked `#[observe("...")]`.
    Observer,
}

impl Kind {
    fn marker(self) -> &'static str {
        match self {
            Kind::Listener => "subscribe",
            Kind::Observer => "observe",
        }
    }

    fn key(self) -> TokenStream2 {
        match self {
            Kind::Listener => quote! { ::herald::TypeKey },
            Kind::Observer => quote! { ::herald::ActionKey },
        }
    }
}

/// Arguments for `#[listener]` and `#[observer]`.
#[derive(Default)]
pub(crate) struct ListenerArgs {
    /// Directory bus the listener is routed to.
    pub bus: Option<LitStr>,
    /// Replaces `Default::default` when creating the instance.
    pub constructor: Option<Path>,
}

impl Parse for ListenerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ListenerArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "bus" => {
                    let lit: LitStr = input.parse()?;
                    if lit.value().trim().is_empty() {
                        return Err(syn::Error::new(lit.span(), "bus name cannot be empty"));
                    }
                    args.bus = Some(lit);
                }
                "constructor" => {
                    args.constructor = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// How a handler is called.
enum Receiver {
    /// `&self` or `&mut self`.
    Instance,
    /// No receiver.
    Static,
}

/// One method that becomes one or more descriptors.
struct Handler {
    name: Ident,
    receiver: Receiver,
    message: Type,
    actions: Vec<LitStr>,
}

/// Implementation of `#[listener]` and `#[observer]`.
pub(crate) fn listener_impl(attr: TokenStream, item: TokenStream, kind: Kind) -> TokenStream {
    let args = parse_macro_input!(attr as ListenerArgs);
    let mut input = parse_macro_input!(item as ItemImpl);

    expand(&args, &mut input, kind)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: &ListenerArgs, input: &mut ItemImpl, kind: Kind) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[listener] and #[observer] must be placed on an inherent impl block",
        ));
    }

    let mut handlers = Vec::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            if let Some(handler) = take_handler(method, kind)? {
                handlers.push(handler);
            }
        }
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    let key = kind.key();

    let descriptors = handlers.iter().flat_map(|handler| descriptor_tokens(handler, kind));

    let construct = match &args.constructor {
        Some(path) => quote! {
            #path().map_err(::std::convert::Into::into)
        },
        None => quote! {
            ::std::result::Result::Ok(<Self as ::std::default::Default>::default())
        },
    };

    let routed = args.bus.as_ref().map(|bus| {
        quote! {
            impl #impl_generics ::herald::Routed for #self_ty #where_clause {
                const BUS: &'static str = #bus;
            }
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics ::herald::Listener<#key> for #self_ty #where_clause {
            fn scan() -> ::std::result::Result<
                ::std::vec::Vec<::herald::HandlerDescriptor<#key>>,
                ::herald::ScanError,
            > {
                ::std::result::Result::Ok(::std::vec![#(#descriptors),*])
            }

            fn construct() -> ::std::result::Result<Self, ::herald::BoxError> {
                #construct
            }
        }

        #routed
    })
}

/// Remove the marker attribute from `method` and describe the handler.
fn take_handler(method: &mut ImplItemFn, kind: Kind) -> syn::Result<Option<Handler>> {
    let marker = kind.marker();
    let (marked, rest): (Vec<Attribute>, Vec<Attribute>) = method
        .attrs
        .drain(..)
        .partition(|attr| is_marker(attr, marker));
    method.attrs = rest;

    if marked.is_empty() {
        return Ok(None);
    }

    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "handlers are called synchronously and cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "handlers cannot be generic",
        ));
    }

    let mut receiver = Receiver::Static;
    let mut parameters = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(recv) => {
                if recv.reference.is_none() || recv.colon_token.is_some() {
                    return Err(syn::Error::new_spanned(
                        recv,
                        "handlers must take `&self` or `&mut self`",
                    ));
                }
                receiver = Receiver::Instance;
            }
            FnArg::Typed(pat_type) => parameters.push(&*pat_type.ty),
        }
    }

    let message = match parameters.as_slice() {
        [Type::Reference(reference)] => (*reference.elem).clone(),
        [other] => {
            return Err(syn::Error::new_spanned(
                other,
                "the handler parameter must be `&Message` or `&mut Message`",
            ));
        }
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.inputs,
                "handlers take exactly one parameter: the message",
            ));
        }
    };

    let actions = match kind {
        Kind::Listener => {
            for attr in &marked {
                attr.meta.require_path_only()?;
            }
            Vec::new()
        }
        Kind::Observer => {
            let mut actions = Vec::new();
            for attr in &marked {
                let listed = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
                if listed.is_empty() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "expected at least one action: #[observe(\"action\")]",
                    ));
                }
                for action in listed {
                    if action.value().trim().is_empty() {
                        return Err(syn::Error::new(action.span(), "action names cannot be empty"));
                    }
                    actions.push(action);
                }
            }
            actions
        }
    };

    Ok(Some(Handler {
        name: sig.ident.clone(),
        receiver,
        message,
        actions,
    }))
}

fn is_marker(attr: &Attribute, marker: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == marker)
}

fn descriptor_tokens(handler: &Handler, kind: Kind) -> Vec<TokenStream2> {
    let name = &handler.name;
    let message = &handler.message;

    let (constructor, callback) = match handler.receiver {
        Receiver::Instance => (
            quote! { bind_method },
            quote! { |this, message| this.#name(message) },
        ),
        Receiver::Static => (
            quote! { bind_function },
            quote! { |message| Self::#name(message) },
        ),
    };

    match kind {
        Kind::Listener => vec![quote! {
            ::herald::HandlerDescriptor::#constructor::<Self, #message, _>(
                <#message as ::herald::Message>::message_type(),
                ::std::stringify!(#name),
                #callback,
            )
        }],
        Kind::Observer => handler
            .actions
            .iter()
            .map(|action| {
                quote! {
                    ::herald::HandlerDescriptor::#constructor::<Self, #message, _>(
                        ::herald::ActionKey::from(#action),
                        ::std::stringify!(#name),
                        #callback,
                    )
                }
            })
            .collect(),
    }
}

/// Expansion of a marker attribute used outside its impl block.
pub(crate) fn stray_marker(marker: &str, container: &str, item: TokenStream) -> TokenStream {
    let item = TokenStream2::from(item);
    let message = format!("#[{marker}] can only be used on methods inside a #[{container}] impl block");
    quote! {
        ::std::compile_error!(#message);
        #item
    }
    .into()
}
