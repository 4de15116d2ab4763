//! Listener types.

use crate::{
    descriptor::{HandlerDescriptor, Instance},
    error::{BoxError, ScanError},
    key::{SubjectKey, TypeKey},
};
use std::any::Any;

/// A named type declaring handler methods.
///
/// `scan` lists the type's handlers; `construct` creates an instance the
/// first time one of its instance handlers is dispatched. Both are usually
/// generated by `#[listener]` (event buses, keyed by [`TypeKey`]) or
/// `#[observer]` (observers, keyed by [`ActionKey`](crate::ActionKey)).
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Logger;
///
/// #[listener]
/// impl Logger {
///     #[subscribe]
///     fn on_order_placed(&mut self, event: &OrderPlaced) {
///         println!("order {}", event.id);
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Listener",
    label = "missing `Listener<{K}>` implementation",
    note = "Annotate the impl block with `#[listener]` or `#[observer]`."
)]
pub trait Listener<K: SubjectKey = TypeKey>: Any + Send + Sized {
    /// List every handler this type declares.
    fn scan() -> Result<Vec<HandlerDescriptor<K>>, ScanError>;

    /// Create an instance for lazy instantiation.
    fn construct() -> Result<Self, BoxError>;
}

/// A type bound to a named bus of a directory.
///
/// Generated by `#[message(bus = "...")]` and `#[listener(bus = "...")]`.
pub trait Routed {
    /// The name of the bus this type belongs to.
    const BUS: &'static str;
}

/// Creates a boxed listener instance.
pub type Constructor = fn() -> Result<Instance, BoxError>;

fn construct_boxed<L: Listener<K>, K: SubjectKey>() -> Result<Instance, BoxError> {
    L::construct().map(|listener| Box::new(listener) as Instance)
}

/// The [`Constructor`] of `L`, as registered in a bus's constructor table.
pub fn constructor<L: Listener<K>, K: SubjectKey>() -> Constructor {
    construct_boxed::<L, K>
}
