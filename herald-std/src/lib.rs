//! # herald-std
//!
//! Standard implementations for the Herald handler dispatch engine.
//!
//! This crate provides:
//! - **Dispatch machinery**: [`HandlerRegistry`], [`ListenerInstanceCache`],
//!   the [`SubjectResolver`] policies and the generic [`Dispatcher`]
//! - **Buses**: the type-keyed [`EventBus`], action-keyed [`Observers`] and
//!   the named-bus [`Directory`]
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use herald_core;

// Modules
pub mod bus;
pub mod dispatch;
pub mod testing;

pub use bus::{Directory, EventBus, Observable, Observers};
pub use dispatch::{
    ConstructorTable, Dispatcher, ExactMatch, HandlerRegistry, Hierarchy, InstanceFactory,
    ListenerInstanceCache, SubjectResolver,
};
