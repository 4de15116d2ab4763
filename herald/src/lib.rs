//! # herald - Type-Keyed Handler Dispatch
//!
//! `herald` routes fired values to handler methods declared on listener
//! types. Listeners are registered once; their instances are created lazily
//! on first use and reused for every later dispatch.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[derive(Message)]
//! struct OrderPlaced {
//!     id: u64,
//! }
//!
//! #[derive(Default)]
//! struct Logger {
//!     seen: Vec<u64>,
//! }
//!
//! #[listener]
//! impl Logger {
//!     #[subscribe]
//!     fn on_order_placed(&mut self, event: &OrderPlaced) {
//!         self.seen.push(event.id);
//!     }
//! }
//!
//! let mut bus = EventBus::new();
//! bus.register::<Logger>()?;
//! let event = bus.fire(OrderPlaced { id: 7 })?;
//! assert_eq!(bus.instance::<Logger>().unwrap().seen, [7]);
//! ```
//!
//! ## Three Surfaces
//!
//! - [`EventBus`]: handlers keyed by message type, including every ancestor
//!   the message declares with `#[message(parent)]`
//! - [`Observers`]: handlers of one observed type keyed by action name,
//!   matched exactly
//! - [`Directory`]: named event buses that messages and listeners are
//!   routed to by their `bus = "..."` tag
//!
//! Every surface is an ordinary owned value. There is no global registry.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

extern crate self as herald;

pub use herald_core::{
    // Subjects
    ActionKey,
    // Errors
    BoxError,
    // Messages
    Cancellable,
    Cancellation,
    // Bindings
    Constructor,
    DirectoryError,
    DispatchError,
    HandlerDescriptor,
    HeraldError,
    Instance,
    // Responses
    IntoResponse,
    InvokeError,
    Listener,
    Message,
    RegistrationError,
    Response,
    Routed,
    ScanError,
    SubjectKey,
    TypeKey,
    constructor,
};

// Buses
pub use herald_std::{Directory, EventBus, Observable, Observers};

/// Dispatch machinery shared by every bus.
///
/// Most code only needs the buses. These are for custom scanners, custom
/// instance factories, and building a bus with a different resolver.
pub mod dispatch {
    pub use herald_std::dispatch::{
        ConstructorTable, Dispatcher, ExactMatch, HandlerRegistry, Hierarchy, InstanceFactory,
        ListenerInstanceCache, SubjectResolver,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use herald_std::testing::*;
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ActionKey, BoxError, Cancellable, Cancellation, Directory, DispatchError, EventBus,
        IntoResponse, Listener, Message, Observable, Observers, RegistrationError, Response,
        TypeKey,
    };

    #[cfg(feature = "macros")]
    pub use crate::{listener, observe, observer, subscribe};
}

#[cfg(feature = "macros")]
pub use herald_macros::{Message, listener, observe, observer, subscribe};
