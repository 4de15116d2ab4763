//! Procedural macros for Herald.
//!
//! - `#[derive(Message)]` - message ancestry, cancellation and routing
//! - `#[listener]` - turns `#[subscribe]` methods into event bus handlers
//! - `#[observer]` - turns `#[observe("action")]` methods into observers

use proc_macro::TokenStream;

mod listener;
mod message;

/// Derive macro for implementing the `Message` trait.
///
/// # Attributes
///
/// - `#[message(bus = "name")]` on the type: implements `Routed`
/// - `#[message(parent)]` on a field: the field's type is a parent of this
///   message, and handlers of the parent receive that field
/// - `#[message(cancellation)]` on a field: the field holds the cancellation
///   state; also implements `Cancellable` for the message
///
/// ```rust,ignore
/// #[derive(Message)]
/// #[message(bus = "orders")]
/// struct OrderPlaced {
///     #[message(parent)]
///     base: DomainEvent,
///     #[message(cancellation)]
///     cancellation: Cancellation,
///     id: u64,
/// }
/// ```
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message_impl(input)
}

/// Implements `Listener` for the type of an impl block.
///
/// Every method marked `#[subscribe]` becomes one handler. The message type
/// is taken from the method's only parameter, which must be `&E` or
/// `&mut E`. Methods taking `&self` or `&mut self` run on the cached
/// instance; associated functions run without one.
///
/// # Arguments
///
/// - `bus = "name"`: implements `Routed` for directory registration
/// - `constructor = path`: a `fn() -> Result<Self, E>` used instead of
///   `Default::default` to create the instance
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Logger;
///
/// #[listener(bus = "orders")]
/// impl Logger {
///     #[subscribe]
///     fn on_order_placed(&mut self, event: &OrderPlaced) {
///         println!("order {}", event.id);
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn listener(attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::listener_impl(attr, item, listener::Kind::Listener)
}

/// Implements `Listener<ActionKey>` for the type of an impl block.
///
/// Every `#[observe("action", ...)]` on a method registers that method for
/// each listed action. Accepts the same arguments as `#[listener]`.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct WelcomeMailer;
///
/// #[observer]
/// impl WelcomeMailer {
///     #[observe("created", "restored")]
///     fn greet(&mut self, user: &User) {}
/// }
/// ```
#[proc_macro_attribute]
pub fn observer(attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::listener_impl(attr, item, listener::Kind::Observer)
}

/// Marks a handler method inside a `#[listener]` impl block.
#[proc_macro_attribute]
pub fn subscribe(_attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::stray_marker("subscribe", "listener", item)
}

/// Marks an observer method inside an `#[observer]` impl block.
#[proc_macro_attribute]
pub fn observe(_attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::stray_marker("observe", "observer", item)
}
