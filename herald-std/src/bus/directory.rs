//! Named buses.

use super::event_bus::EventBus;
use herald_core::{DirectoryError, Listener, Message, Response, Routed};
use std::collections::HashMap;

/// A set of event buses addressed by name.
///
/// Messages and listeners carry the name of their bus as a [`Routed`] tag,
/// so firing or listening through the directory picks the right bus
/// without the caller naming it.
///
/// # Example
///
/// ```rust,ignore
/// let mut directory = Directory::new();
/// directory.create("orders")?;
///
/// directory.listen::<Logger>()?;                    // #[listener(bus = "orders")]
/// let event = directory.fire(OrderPlaced { id: 7 })?; // #[message(bus = "orders")]
/// ```
#[derive(Debug, Default)]
pub struct Directory {
    buses: HashMap<String, EventBus>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bus named `name`.
    pub fn create(&mut self, name: impl Into<String>) -> Result<&mut EventBus, DirectoryError> {
        self.insert(name, EventBus::new())
    }

    /// Add an existing bus under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        bus: EventBus,
    ) -> Result<&mut EventBus, DirectoryError> {
        use std::collections::hash_map::Entry;

        match self.buses.entry(name.into()) {
            Entry::Occupied(entry) => Err(DirectoryError::DuplicateBus(entry.key().clone())),
            Entry::Vacant(entry) => {
                #[cfg(feature = "tracing")]
                {
                    tracing::debug!(bus = %entry.key(), "Created event bus");
                }
                Ok(entry.insert(bus))
            }
        }
    }

    /// Remove and return the bus named `name`.
    pub fn remove(&mut self, name: &str) -> Option<EventBus> {
        self.buses.remove(name)
    }

    /// The bus named `name`.
    pub fn bus(&self, name: &str) -> Option<&EventBus> {
        self.buses.get(name)
    }

    /// The bus named `name`, mutably.
    pub fn bus_mut(&mut self, name: &str) -> Option<&mut EventBus> {
        self.buses.get_mut(name)
    }

    fn routed_bus(&mut self, name: &'static str) -> Result<&mut EventBus, DirectoryError> {
        self.buses
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownBus(name.to_string()))
    }

    /// Register `L` with the bus it is routed to.
    pub fn listen<L: Listener + Routed>(&mut self) -> Result<&mut Self, DirectoryError> {
        self.routed_bus(L::BUS)?.register::<L>()?;
        Ok(self)
    }

    /// Fire `event` on the bus it is routed to.
    pub fn fire<E: Message + Routed>(&mut self, event: E) -> Result<E, DirectoryError> {
        Ok(self.routed_bus(E::BUS)?.fire(event)?)
    }

    /// Fire `event` on its bus, stopping when `predicate` rejects a response.
    pub fn fire_with<E, P>(&mut self, event: E, predicate: P) -> Result<E, DirectoryError>
    where
        E: Message + Routed,
        P: FnMut(&Response) -> bool,
    {
        Ok(self.routed_bus(E::BUS)?.fire_with(event, predicate)?)
    }

    /// The names of every bus, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buses.keys().map(String::as_str)
    }

    /// The number of buses.
    pub fn len(&self) -> usize {
        self.buses.len()
    }

    /// Whether there are no buses.
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}
