//! Type-keyed event bus.

use crate::dispatch::{Dispatcher, HandlerRegistry, Hierarchy, InstanceFactory};
use herald_core::{
    Constructor, DispatchError, HandlerDescriptor, Listener, Message, RegistrationError, Response,
    TypeKey,
};
use std::any::Any;

/// Dispatches messages by their runtime type.
///
/// Handlers registered for a type also receive every message that embeds
/// that type as a parent. Listener instances are created on first use and
/// reused until the listener is unregistered.
///
/// # Example
///
/// ```rust,ignore
/// let mut bus = EventBus::new();
/// bus.register::<Logger>()?.register::<Auditor>()?;
///
/// let event = bus.fire(OrderPlaced { id: 7 })?;
/// ```
#[derive(Debug, Default)]
pub struct EventBus {
    dispatcher: Dispatcher<TypeKey, Hierarchy>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every handler `L` declares.
    ///
    /// Registering a listener that is already registered fails with
    /// [`RegistrationError::AlreadyRegistered`] and leaves its handlers
    /// as they were, so each handler runs at most once per fire.
    pub fn register<L: Listener>(&mut self) -> Result<&mut Self, RegistrationError> {
        self.dispatcher.register_listener::<L>()?;
        Ok(self)
    }

    /// Register a ready-made listener instance.
    ///
    /// The bus keeps the instance and calls its handlers on it.
    pub fn register_instance<L: Listener>(&mut self, listener: L) -> Result<&mut Self, RegistrationError> {
        self.dispatcher.register_listener_instance(listener)?;
        Ok(self)
    }

    /// Register descriptors for `target` produced by a custom scanner.
    pub fn register_descriptors(
        &mut self,
        target: TypeKey,
        descriptors: Vec<HandlerDescriptor>,
        constructor: Option<Constructor>,
    ) -> Result<&mut Self, RegistrationError> {
        self.dispatcher
            .register_descriptors(target, descriptors, constructor)?;
        Ok(self)
    }

    /// Remove `L` and its instance. Returns whether it was registered.
    pub fn unregister<L: Any>(&mut self) -> bool {
        self.unregister_target(&TypeKey::of::<L>())
    }

    /// Remove `target` and its instance. Returns whether it was registered.
    pub fn unregister_target(&mut self, target: &TypeKey) -> bool {
        self.dispatcher.unregister_target(target)
    }

    /// Fire `event` at every matching handler and hand it back.
    pub fn fire<E: Message>(&mut self, event: E) -> Result<E, DispatchError> {
        self.fire_with(event, |_| true)
    }

    /// Fire `event`, stopping as soon as `predicate` rejects a response.
    pub fn fire_with<E, P>(&mut self, mut event: E, mut predicate: P) -> Result<E, DispatchError>
    where
        E: Message,
        P: FnMut(&Response) -> bool,
    {
        self.dispatcher
            .dispatch(&E::message_type(), &mut event, &mut predicate)?;
        Ok(event)
    }

    /// Create lazy instances with `factory`.
    pub fn set_instance_factory(&mut self, factory: impl InstanceFactory + 'static) -> &mut Self {
        self.dispatcher.set_instance_factory(factory);
        self
    }

    /// Go back to each listener's own constructor.
    pub fn reset_instance_factory(&mut self) -> &mut Self {
        self.dispatcher.reset_instance_factory();
        self
    }

    /// Whether `L` is registered.
    pub fn is_registered<L: Any>(&self) -> bool {
        self.dispatcher.is_registered(&TypeKey::of::<L>())
    }

    /// Every registered listener, in registration order.
    pub fn targets(&self) -> &[TypeKey] {
        self.dispatcher.targets()
    }

    /// Borrow the instance of `L`, if it has one.
    pub fn instance<L: Any>(&self) -> Option<&L> {
        self.dispatcher.instance::<L>()
    }

    /// Mutably borrow the instance of `L`, if it has one.
    pub fn instance_mut<L: Any>(&mut self) -> Option<&mut L> {
        self.dispatcher.instance_mut::<L>()
    }

    /// How many handlers firing an `E` would reach.
    pub fn handler_count<E: Message>(&self) -> usize {
        self.dispatcher.handler_count(&E::message_type())
    }

    /// The registered handlers.
    pub fn registry(&self) -> &HandlerRegistry {
        self.dispatcher.registry()
    }

    /// Unregister every listener.
    pub fn clear(&mut self) {
        self.dispatcher.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Trail;
    use herald_core::{BoxError, ScanError};

    struct Notice {
        text: &'static str,
    }

    impl Message for Notice {}

    struct Urgent {
        base: Notice,
    }

    impl Message for Urgent {
        fn message_type() -> TypeKey {
            TypeKey::with_parents::<Self>(|| vec![Notice::message_type()])
        }

        fn upcast_mut(&mut self, ty: std::any::TypeId) -> Option<&mut dyn Any> {
            if ty == std::any::TypeId::of::<Self>() {
                Some(self)
            } else {
                self.base.upcast_mut(ty)
            }
        }
    }

    struct Board {
        trail: Trail,
    }

    impl Board {
        fn pin(&mut self, notice: &Notice) {
            self.trail.record(format!("pin:{}", notice.text));
        }
    }

    impl Listener for Board {
        fn scan() -> Result<Vec<HandlerDescriptor>, ScanError> {
            Ok(vec![HandlerDescriptor::instance_method::<Self, Notice, _>(
                "pin",
                |board, notice| board.pin(notice),
            )])
        }

        fn construct() -> Result<Self, BoxError> {
            Ok(Self {
                trail: Trail::new(),
            })
        }
    }

    struct Pager {
        trail: Trail,
    }

    impl Listener for Pager {
        fn scan() -> Result<Vec<HandlerDescriptor>, ScanError> {
            Ok(vec![HandlerDescriptor::instance_method::<Self, Urgent, _>(
                "page",
                |pager, urgent| pager.trail.record(format!("page:{}", urgent.base.text)),
            )])
        }

        fn construct() -> Result<Self, BoxError> {
            Ok(Self {
                trail: Trail::new(),
            })
        }
    }

    #[test]
    fn test_base_handler_catches_derived() {
        let trail = Trail::new();
        let mut bus = EventBus::new();
        bus.register_instance(Board {
            trail: trail.clone(),
        })
        .unwrap()
        .register_instance(Pager {
            trail: trail.clone(),
        })
        .unwrap();

        bus.fire(Urgent {
            base: Notice { text: "fire drill" },
        })
        .unwrap();
        assert_eq!(trail.entries(), ["pin:fire drill", "page:fire drill"]);
    }

    #[test]
    fn test_derived_handler_ignores_base() {
        let trail = Trail::new();
        let mut bus = EventBus::new();
        bus.register_instance(Pager {
            trail: trail.clone(),
        })
        .unwrap();

        let notice = bus.fire(Notice { text: "lunch" }).unwrap();
        assert_eq!(notice.text, "lunch");
        assert!(trail.is_empty());
        assert_eq!(bus.handler_count::<Notice>(), 0);
        assert_eq!(bus.handler_count::<Urgent>(), 1);
    }

    #[test]
    fn test_unregister_then_register_again() {
        let mut bus = EventBus::new();
        bus.register::<Board>().unwrap();
        assert!(bus.is_registered::<Board>());

        assert!(bus.unregister::<Board>());
        assert!(!bus.unregister::<Board>());
        assert_eq!(bus.handler_count::<Notice>(), 0);

        bus.register::<Board>().unwrap();
        bus.fire(Notice { text: "again" }).unwrap();
        let board = bus.instance::<Board>().unwrap();
        assert_eq!(board.trail.entries(), ["pin:again"]);
    }

    #[test]
    fn test_fire_without_handlers_creates_nothing() {
        let mut bus = EventBus::new();
        bus.register::<Pager>().unwrap();

        bus.fire(Notice { text: "quiet" }).unwrap();
        assert!(bus.instance::<Pager>().is_none());
    }
}
