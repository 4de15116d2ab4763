//! Entry points for registering listeners and firing messages.
//!
//! - [`EventBus`] - dispatch by message type, parents included
//! - [`Observers`] - dispatch by action name to observers of one type
//! - [`Directory`] - named buses selected by a routing tag

mod directory;
mod event_bus;
mod observers;

pub use directory::Directory;
pub use event_bus::EventBus;
pub use observers::{Observable, Observers};
