//! Listener instances and how they are created.

use herald_core::{
    BoxError, Constructor, DispatchError, Instance, Listener, SubjectKey, TypeKey, constructor,
};
use std::{
    any::Any,
    collections::{HashMap, hash_map::Entry},
};

/// Creates listener instances on first use.
///
/// Implemented for any `Fn(&TypeKey) -> Result<Instance, BoxError>`, so a
/// closure can be installed with `set_instance_factory`.
pub trait InstanceFactory: Send + Sync {
    /// Create an instance of `target`.
    fn create(&self, target: &TypeKey) -> Result<Instance, BoxError>;
}

impl<F> InstanceFactory for F
where
    F: Fn(&TypeKey) -> Result<Instance, BoxError> + Send + Sync,
{
    fn create(&self, target: &TypeKey) -> Result<Instance, BoxError> {
        self(target)
    }
}

/// The default factory: each registered listener's own constructor.
///
/// Filled at registration time from [`Listener::construct`].
#[derive(Debug, Default, Clone)]
pub struct ConstructorTable {
    constructors: HashMap<TypeKey, Constructor>,
}

impl ConstructorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the constructor of `L`.
    pub fn with<L: Listener<K>, K: SubjectKey>(mut self) -> Self {
        self.insert(TypeKey::of::<L>(), constructor::<L, K>());
        self
    }

    /// Add or replace the constructor for `target`.
    pub fn insert(&mut self, target: TypeKey, constructor: Constructor) {
        self.constructors.insert(target, constructor);
    }

    /// Forget the constructor for `target`.
    pub fn remove(&mut self, target: &TypeKey) -> Option<Constructor> {
        self.constructors.remove(target)
    }

    /// Whether `target` has a constructor.
    pub fn contains(&self, target: &TypeKey) -> bool {
        self.constructors.contains_key(target)
    }
}

impl InstanceFactory for ConstructorTable {
    fn create(&self, target: &TypeKey) -> Result<Instance, BoxError> {
        match self.constructors.get(target) {
            Some(construct) => construct(),
            None => Err(format!("no constructor registered for `{target}`").into()),
        }
    }
}

/// At most one instance per listener type.
///
/// Instances are inserted eagerly with [`put`](Self::put) or created lazily
/// by [`resolve`](Self::resolve). The cache owns them until they are
/// evicted.
#[derive(Default)]
pub struct ListenerInstanceCache {
    instances: HashMap<TypeKey, Instance>,
}

impl ListenerInstanceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` as the instance of `target`, replacing any other.
    pub fn put(&mut self, target: TypeKey, instance: Instance) {
        self.instances.insert(target, instance);
    }

    /// The instance of `target`, created with `factory` if there is none.
    pub fn resolve(
        &mut self,
        target: &TypeKey,
        factory: &dyn InstanceFactory,
    ) -> Result<&mut (dyn Any + Send), DispatchError> {
        let instance = match self.instances.entry(*target) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let created =
                    factory
                        .create(target)
                        .map_err(|source| DispatchError::Instantiation {
                            target: target.name(),
                            source,
                        })?;
                if (*created).type_id() != target.id() {
                    return Err(DispatchError::InstanceMismatch(target.name()));
                }

                #[cfg(feature = "tracing")]
                {
                    tracing::debug!(listener = %target, "Created listener instance");
                }

                entry.insert(created)
            }
        };
        Ok(&mut **instance)
    }

    /// Drop the instance of `target`. Returns whether there was one.
    pub fn evict(&mut self, target: &TypeKey) -> bool {
        self.instances.remove(target).is_some()
    }

    /// Whether `target` has an instance.
    pub fn contains(&self, target: &TypeKey) -> bool {
        self.instances.contains_key(target)
    }

    /// Borrow the instance of `L`.
    pub fn get<L: Any>(&self) -> Option<&L> {
        self.instances.get(&TypeKey::of::<L>())?.downcast_ref()
    }

    /// Mutably borrow the instance of `L`.
    pub fn get_mut<L: Any>(&mut self) -> Option<&mut L> {
        self.instances.get_mut(&TypeKey::of::<L>())?.downcast_mut()
    }

    /// The number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drop every instance.
    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl std::fmt::Debug for ListenerInstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.instances.keys()).finish()
    }
}
