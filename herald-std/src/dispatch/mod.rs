//! The generic dispatch engine.
//!
//! - [`HandlerRegistry`] - subject → ordered handler descriptors
//! - [`ListenerInstanceCache`] - one lazily created instance per listener
//! - [`SubjectResolver`] - which registered subjects a fired subject matches
//! - [`Dispatcher`] - registration and the fire loop, generic over the key

mod cache;
mod dispatcher;
mod registry;
mod resolver;

pub use cache::{ConstructorTable, InstanceFactory, ListenerInstanceCache};
pub use dispatcher::Dispatcher;
pub use registry::HandlerRegistry;
pub use resolver::{ExactMatch, Hierarchy, SubjectResolver};
