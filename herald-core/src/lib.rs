//! # herald-core
//!
//! Core types for the Herald handler registry and dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! listener crates that only need to *declare* handlers, without pulling in
//! the registry and dispatcher from `herald-std`.
//!
//! # Building Blocks
//!
//! ## Subjects ([`TypeKey`], [`ActionKey`])
//!
//! A subject is what a fired value is dispatched against. Event buses key
//! handlers by the runtime type of the message ([`TypeKey`]), observer
//! registries key them by an action name ([`ActionKey`]). Both implement
//! [`SubjectKey`], so the dispatcher is written once for either.
//!
//! ## Messages ([`Message`], [`Cancellable`])
//!
//! Anything fired through a bus is a [`Message`]. Messages describe their
//! ancestry (the parent types they embed) and may expose a [`Cancellable`]
//! view that handlers use to halt further dispatch.
//!
//! ## Bindings ([`HandlerDescriptor`], [`Listener`])
//!
//! A [`HandlerDescriptor`] binds a subject to one method of a listener type.
//! A [`Listener`] is a named type that can list its own descriptors; this is
//! usually generated by the `#[listener]` and `#[observer]` macros.
//!
//! ## Responses ([`Response`], [`IntoResponse`])
//!
//! Whatever a handler returns is converted into a [`Response`] and shown to
//! the caller's response predicate, which decides whether dispatch goes on.
//!
//! # Error Types
//!
//! - [`HeraldError`] - Top-level error type
//! - [`RegistrationError`] - Rejected registrations
//! - [`DispatchError`] - Failures while firing
//! - [`DirectoryError`] - Bus directory failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod descriptor;
mod error;
mod key;
mod listener;
mod message;
mod response;

// Re-exports
pub use descriptor::{HandlerDescriptor, Instance};
pub use error::{
    BoxError, DirectoryError, DispatchError, HeraldError, InvokeError, RegistrationError,
    ScanError,
};
pub use key::{ActionKey, SubjectKey, TypeKey};
pub use listener::{Constructor, Listener, Routed, constructor};
pub use message::{Cancellable, Cancellation, Message};
pub use response::{IntoResponse, Response};
