//! Message trait for fired values.

use crate::key::TypeKey;
use std::any::{Any, TypeId};

/// A value that can be fired through a bus or observed by observers.
///
/// A message knows its own [`TypeKey`], including the parent types it
/// embeds, and can hand out a mutable view of itself as any of those
/// ancestors. Handlers registered against a parent type receive that view,
/// which is how base-type handlers catch fired subtypes.
///
/// The defaults describe a message with no parents and no cancellation.
/// `#[derive(Message)]` generates the full implementation from
/// `#[message(parent)]` and `#[message(cancellation)]` fields.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Message)]
/// struct OrderPlaced {
///     #[message(parent)]
///     base: DomainEvent,
///     #[message(cancellation)]
///     cancellation: Cancellation,
///     order_id: u64,
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "missing `Message` implementation",
    note = "Derive `Message` or add `impl Message for {Self} {{}}`."
)]
pub trait Message: Any + Send {
    /// The type key of this message, linked to its parents.
    fn message_type() -> TypeKey
    where
        Self: Sized,
    {
        TypeKey::of::<Self>()
    }

    /// View this message as the ancestor type identified by `ty`.
    ///
    /// Returns `None` when `ty` is neither this type nor one of its parents.
    fn upcast_mut(&mut self, ty: TypeId) -> Option<&mut dyn Any>
    where
        Self: Sized,
    {
        if ty == TypeId::of::<Self>() {
            Some(self)
        } else {
            None
        }
    }

    /// The cancellation capability of this message, if it has one.
    fn cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }
}

/// A capability allowing handlers to halt further dispatch.
///
/// The dispatcher checks the flag after every handler call and stops once
/// it is set.
pub trait Cancellable {
    /// Set or clear the cancelled flag, with an optional reason.
    fn set_cancelled(&mut self, cancelled: bool, message: Option<String>);

    /// Whether the message has been cancelled.
    fn is_cancelled(&self) -> bool;

    /// The reason given when the message was cancelled.
    fn cancellation_message(&self) -> Option<&str>;

    /// Cancel with a reason.
    fn cancel(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.set_cancelled(true, Some(message.into()));
    }
}

/// The standard cancellation state, embedded in cancellable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cancellation {
    cancelled: bool,
    message: Option<String>,
}

impl Cancellation {
    /// A fresh, uncancelled state.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cancellable for Cancellation {
    fn set_cancelled(&mut self, cancelled: bool, message: Option<String>) {
        self.cancelled = cancelled;
        self.message = message;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn cancellation_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
