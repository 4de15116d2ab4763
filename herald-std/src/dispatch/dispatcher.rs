//! The registration and dispatch engine.

use super::{
    cache::{ConstructorTable, InstanceFactory, ListenerInstanceCache},
    registry::HandlerRegistry,
    resolver::SubjectResolver,
};
use herald_core::{
    Constructor, DispatchError, HandlerDescriptor, InvokeError, Listener, Message,
    RegistrationError, Response, SubjectKey, TypeKey, constructor,
};
use std::{any::Any, fmt};

/// One registry, its listener instances and a matching policy.
///
/// `K` is the subject key handlers are registered against and `R` decides
/// which registered subjects a fired key reaches. [`EventBus`] and
/// [`Observers`] are thin facades over this type.
///
/// [`EventBus`]: crate::EventBus
/// [`Observers`]: crate::Observers
pub struct Dispatcher<K: SubjectKey, R> {
    registry: HandlerRegistry<K>,
    instances: ListenerInstanceCache,
    constructors: ConstructorTable,
    factory: Option<Box<dyn InstanceFactory>>,
    targets: Vec<TypeKey>,
    resolver: R,
}

impl<K: SubjectKey, R: SubjectResolver<K> + Default> Default for Dispatcher<K, R> {
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<K: SubjectKey, R: SubjectResolver<K>> Dispatcher<K, R> {
    /// Create an empty dispatcher using `resolver`.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            instances: ListenerInstanceCache::new(),
            constructors: ConstructorTable::new(),
            factory: None,
            targets: Vec::new(),
            resolver,
        }
    }

    /// Register every handler `L` declares.
    ///
    /// The instance is created on first dispatch.
    pub fn register_listener<L: Listener<K>>(&mut self) -> Result<(), RegistrationError> {
        let target = TypeKey::of::<L>();
        self.check_target(&target)?;

        let descriptors = L::scan().inspect_err(|_err| {
            #[cfg(feature = "tracing")]
            {
                tracing::warn!(listener = %target, error = %_err, "Listener scan failed");
            }
        })?;
        self.register_descriptors(target, descriptors, Some(constructor::<L, K>()))
    }

    /// Register `instance` and every handler its type declares.
    ///
    /// The instance is cached and used for every dispatch. If registration
    /// fails it is dropped again.
    pub fn register_listener_instance<L: Listener<K>>(
        &mut self,
        instance: L,
    ) -> Result<(), RegistrationError> {
        let target = TypeKey::of::<L>();
        self.check_target(&target)?;

        self.instances.put(target, Box::new(instance));
        self.register_listener::<L>().inspect_err(|_| {
            self.instances.evict(&target);
        })
    }

    /// Register descriptors produced outside of [`Listener::scan`].
    ///
    /// Every descriptor must belong to `target`. Nothing is registered
    /// unless all of them are accepted. `constructor`, if given, becomes the
    /// default way to create the instance of `target`.
    pub fn register_descriptors(
        &mut self,
        target: TypeKey,
        descriptors: Vec<HandlerDescriptor<K>>,
        constructor: Option<Constructor>,
    ) -> Result<(), RegistrationError> {
        self.check_descriptors(&target, &descriptors)
            .inspect_err(|_err| {
                #[cfg(feature = "tracing")]
                {
                    tracing::warn!(listener = %target, error = %_err, "Registration rejected");
                }
            })?;

        #[cfg(feature = "tracing")]
        let count = descriptors.len();
        for descriptor in descriptors {
            self.registry.add(descriptor);
        }
        self.targets.push(target);
        if let Some(constructor) = constructor {
            self.constructors.insert(target, constructor);
        }

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(listener = %target, handlers = count, "Registered listener");
        }

        Ok(())
    }

    fn check_target(&self, target: &TypeKey) -> Result<(), RegistrationError> {
        if target.is_closure() {
            return Err(RegistrationError::Closure(target.name()));
        }
        if self.is_registered(target) {
            return Err(RegistrationError::AlreadyRegistered(target.name()));
        }
        Ok(())
    }

    fn check_descriptors(
        &self,
        target: &TypeKey,
        descriptors: &[HandlerDescriptor<K>],
    ) -> Result<(), RegistrationError> {
        self.check_target(target)?;
        if descriptors.is_empty() {
            return Err(RegistrationError::NoHandlers(target.name()));
        }

        for descriptor in descriptors {
            if descriptor.target() != *target {
                return Err(RegistrationError::ForeignDescriptor {
                    target: target.name(),
                    method: descriptor.method(),
                    owner: descriptor.target().name(),
                });
            }
            self.resolver.validate(descriptor)?;
        }
        Ok(())
    }

    /// Remove `target`, its instance and all of its handlers.
    ///
    /// Returns `false` if `target` was not registered.
    pub fn unregister_target(&mut self, target: &TypeKey) -> bool {
        let Some(position) = self.targets.iter().position(|t| t == target) else {
            return false;
        };

        self.targets.remove(position);
        self.instances.evict(target);
        self.constructors.remove(target);
        let _removed = self.registry.remove_target(target);

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(listener = %target, handlers = _removed, "Unregistered listener");
        }

        true
    }

    /// Fire `subject` at every handler `key` resolves to.
    ///
    /// Handlers run in dispatch order. After each one, `predicate` sees its
    /// response and dispatch stops when it returns `false`. Dispatch also
    /// stops once `subject` reports itself cancelled. A handler error stops
    /// dispatch and is returned unchanged inside [`DispatchError::Handler`].
    pub fn dispatch<E: Message>(
        &mut self,
        key: &K,
        subject: &mut E,
        predicate: &mut dyn FnMut(&Response) -> bool,
    ) -> Result<(), DispatchError> {
        let handlers = self.resolver.resolve(&self.registry, key);
        if handlers.is_empty() {
            #[cfg(feature = "tracing")]
            {
                tracing::trace!(subject = %key, "No handlers");
            }
            return Ok(());
        }

        let factory: &dyn InstanceFactory = match &self.factory {
            Some(factory) => &**factory,
            None => &self.constructors,
        };

        for descriptor in handlers {
            let target = descriptor.target();
            let parameter = descriptor.parameter();

            #[cfg(feature = "tracing")]
            {
                tracing::trace!(
                    subject = %key,
                    listener = target.short_name(),
                    method = descriptor.method(),
                    "Invoking handler"
                );
            }

            let Some(argument) = subject.upcast_mut(parameter.id()) else {
                return Err(DispatchError::SubjectMismatch {
                    target: target.name(),
                    method: descriptor.method(),
                    expected: parameter.name(),
                    subject: std::any::type_name::<E>(),
                });
            };

            let instance: Option<&mut (dyn Any + Send)> = if descriptor.is_static() {
                None
            } else {
                Some(self.instances.resolve(&target, factory)?)
            };

            let response = descriptor
                .invoke(instance, argument)
                .map_err(|err| match err {
                    InvokeError::Handler(source) => DispatchError::Handler {
                        target: target.name(),
                        method: descriptor.method(),
                        source,
                    },
                    InvokeError::MissingInstance(_) => DispatchError::InstanceMismatch(target.name()),
                    InvokeError::ArgumentMismatch(_) => DispatchError::SubjectMismatch {
                        target: target.name(),
                        method: descriptor.method(),
                        expected: parameter.name(),
                        subject: std::any::type_name::<E>(),
                    },
                })?;

            if !predicate(&response) {
                #[cfg(feature = "tracing")]
                {
                    tracing::debug!(subject = %key, method = descriptor.method(), "Stopped by response predicate");
                }
                break;
            }

            if subject.cancellable().is_some_and(|c| c.is_cancelled()) {
                #[cfg(feature = "tracing")]
                {
                    tracing::debug!(subject = %key, method = descriptor.method(), "Stopped by cancellation");
                }
                break;
            }
        }

        Ok(())
    }

    /// How many handlers `key` currently resolves to.
    pub fn handler_count(&self, key: &K) -> usize {
        self.resolver.resolve(&self.registry, key).len()
    }

    /// Create lazy instances with `factory` instead of the listeners' own
    /// constructors.
    pub fn set_instance_factory(&mut self, factory: impl InstanceFactory + 'static) -> &mut Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Go back to the listeners' own constructors.
    pub fn reset_instance_factory(&mut self) -> &mut Self {
        self.factory = None;
        self
    }

    /// Whether `target` is registered.
    pub fn is_registered(&self, target: &TypeKey) -> bool {
        self.targets.contains(target)
    }

    /// Every registered listener, in registration order.
    pub fn targets(&self) -> &[TypeKey] {
        &self.targets
    }

    /// The registered handlers.
    pub fn registry(&self) -> &HandlerRegistry<K> {
        &self.registry
    }

    /// Borrow the live instance of `L`, if one was created or supplied.
    pub fn instance<L: Any>(&self) -> Option<&L> {
        self.instances.get::<L>()
    }

    /// Mutably borrow the live instance of `L`.
    pub fn instance_mut<L: Any>(&mut self) -> Option<&mut L> {
        self.instances.get_mut::<L>()
    }

    /// Unregister everything. The instance factory is kept.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.instances.clear();
        self.constructors = ConstructorTable::new();
        self.targets.clear();
    }
}

impl<K: SubjectKey, R: fmt::Debug> fmt::Debug for Dispatcher<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("targets", &self.targets)
            .field("registry", &self.registry)
            .field("instances", &self.instances)
            .field("custom_factory", &self.factory.is_some())
            .field("resolver", &self.resolver)
            .finish()
    }
}
