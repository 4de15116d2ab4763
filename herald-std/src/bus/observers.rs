//! Action-keyed observers of one observed type.

use crate::dispatch::{Dispatcher, ExactMatch, HandlerRegistry, InstanceFactory};
use herald_core::{
    ActionKey, Constructor, DispatchError, HandlerDescriptor, Listener, Message, RegistrationError,
    Response, TypeKey,
};
use std::{any::Any, fmt, marker::PhantomData};

/// The observers of values of type `S`, keyed by action name.
///
/// Unlike [`EventBus`](crate::EventBus), matching is exact: an observer of
/// `"created"` is only notified of `"created"`. Every handler must take an
/// `S`; registering one that takes anything else is rejected.
///
/// Each `Observers` is an ordinary value owned by whoever needs it.
///
/// # Example
///
/// ```rust,ignore
/// let mut observers = Observers::<User>::new();
/// observers.register::<WelcomeMailer>()?;
///
/// let mut user = User::new("ada");
/// observers.notify(&mut user, "created")?;
/// ```
pub struct Observers<S: Message> {
    dispatcher: Dispatcher<ActionKey, ExactMatch>,
    _subject: PhantomData<fn(&mut S)>,
}

impl<S: Message> Default for Observers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Message> Observers<S> {
    /// Create an empty observer registry.
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::with_resolver(ExactMatch::restricted_to(S::message_type())),
            _subject: PhantomData,
        }
    }

    /// Register every action `L` observes.
    pub fn register<L: Listener<ActionKey>>(&mut self) -> Result<&mut Self, RegistrationError> {
        self.dispatcher.register_listener::<L>()?;
        Ok(self)
    }

    /// Register a ready-made observer instance.
    pub fn register_instance<L: Listener<ActionKey>>(
        &mut self,
        observer: L,
    ) -> Result<&mut Self, RegistrationError> {
        self.dispatcher.register_listener_instance(observer)?;
        Ok(self)
    }

    /// Register descriptors for `target` produced by a custom scanner.
    pub fn register_descriptors(
        &mut self,
        target: TypeKey,
        descriptors: Vec<HandlerDescriptor<ActionKey>>,
        constructor: Option<Constructor>,
    ) -> Result<&mut Self, RegistrationError> {
        self.dispatcher
            .register_descriptors(target, descriptors, constructor)?;
        Ok(self)
    }

    /// Remove `L` and its instance. Returns whether it was registered.
    pub fn unregister<L: Any>(&mut self) -> bool {
        self.dispatcher.unregister_target(&TypeKey::of::<L>())
    }

    /// Remove `target` and its instance. Returns whether it was registered.
    pub fn unregister_target(&mut self, target: &TypeKey) -> bool {
        self.dispatcher.unregister_target(target)
    }

    /// Notify every observer of `action` about `subject`.
    pub fn notify(
        &mut self,
        subject: &mut S,
        action: impl Into<ActionKey>,
    ) -> Result<(), DispatchError> {
        self.notify_with(subject, action, |_| true)
    }

    /// Notify observers of `action`, stopping as soon as `predicate` rejects
    /// a response.
    pub fn notify_with<P>(
        &mut self,
        subject: &mut S,
        action: impl Into<ActionKey>,
        mut predicate: P,
    ) -> Result<(), DispatchError>
    where
        P: FnMut(&Response) -> bool,
    {
        self.dispatcher
            .dispatch(&action.into(), subject, &mut predicate)
    }

    /// Create lazy instances with `factory`.
    pub fn set_instance_factory(&mut self, factory: impl InstanceFactory + 'static) -> &mut Self {
        self.dispatcher.set_instance_factory(factory);
        self
    }

    /// Go back to each observer's own constructor.
    pub fn reset_instance_factory(&mut self) -> &mut Self {
        self.dispatcher.reset_instance_factory();
        self
    }

    /// Whether `L` is registered.
    pub fn is_registered<L: Any>(&self) -> bool {
        self.dispatcher.is_registered(&TypeKey::of::<L>())
    }

    /// Every registered observer, in registration order.
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

    /// How many observers `action` would reach.
    pub fn handler_count(&self, action: impl Into<ActionKey>) -> usize {
        self.dispatcher.handler_count(&action.into())
    }

    /// The registered handlers.
    pub fn registry(&self) -> &HandlerRegistry<ActionKey> {
        self.dispatcher.registry()
    }

    /// Unregister every observer.
    pub fn clear(&mut self) {
        self.dispatcher.clear();
    }
}

impl<S: Message> fmt::Debug for Observers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subject", &std::any::type_name::<S>())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Lets an observed value notify its observers directly.
///
/// Implemented for every [`Message`].
///
/// ```rust,ignore
/// user.notify_observers(&mut observers, "renamed")?;
/// ```
pub trait Observable: Message + Sized {
    /// Notify `observers` of `action` about `self`.
    fn notify_observers(
        &mut self,
        observers: &mut Observers<Self>,
        action: impl Into<ActionKey>,
    ) -> Result<(), DispatchError> {
        observers.notify(self, action)
    }
}

impl<T: Message> Observable for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Trail;
    use herald_core::{BoxError, Cancellable, Cancellation, ScanError};

    #[derive(Default)]
    struct Account {
        name: String,
        trail: Trail,
        cancellation: Cancellation,
    }

    impl Message for Account {
        fn cancellable(&self) -> Option<&dyn Cancellable> {
            Some(&self.cancellation)
        }
    }

    struct Profile;
    impl Message for Profile {}

    #[derive(Default)]
    struct Welcome;

    impl Welcome {
        fn greet(&mut self, account: &Account) {
            account.trail.record(format!("welcome:{}", account.name));
        }

        fn freeze(account: &mut Account) {
            account.trail.record("freeze");
            account.cancellation.cancel("frozen");
        }
    }

    impl Listener<ActionKey> for Welcome {
        fn scan() -> Result<Vec<HandlerDescriptor<ActionKey>>, ScanError> {
            Ok(vec![
                HandlerDescriptor::bind_method::<Self, Account, _>(
                    ActionKey::from("created"),
                    "greet",
                    |this, account| this.greet(account),
                ),
                HandlerDescriptor::bind_method::<Self, Account, _>(
                    ActionKey::from("restored"),
                    "greet",
                    |this, account| this.greet(account),
                ),
                HandlerDescriptor::bind_function::<Self, Account, _>(
                    ActionKey::from("suspended"),
                    "freeze",
                    Self::freeze,
                ),
                HandlerDescriptor::bind_method::<Self, Account, _>(
                    ActionKey::from("suspended"),
                    "greet",
                    |this, account| this.greet(account),
                ),
            ])
        }

        fn construct() -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    struct ProfileWatcher;

    impl Listener<ActionKey> for ProfileWatcher {
        fn scan() -> Result<Vec<HandlerDescriptor<ActionKey>>, ScanError> {
            Ok(vec![HandlerDescriptor::bind_function::<Self, Profile, _>(
                ActionKey::from("created"),
                "on_profile",
                |_| (),
            )])
        }

        fn construct() -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    fn account(name: &str) -> Account {
        Account {
            name: name.to_string(),
            ..Account::default()
        }
    }

    #[test]
    fn test_notify_matches_action_exactly() {
        let mut observers = Observers::<Account>::new();
        observers.register::<Welcome>().unwrap();

        let mut ada = account("ada");
        observers.notify(&mut ada, "created").unwrap();
        observers.notify(&mut ada, "deleted").unwrap();
        ada.notify_observers(&mut observers, "restored").unwrap();

        assert_eq!(ada.trail.entries(), ["welcome:ada", "welcome:ada"]);
        assert_eq!(observers.handler_count("created"), 1);
        assert_eq!(observers.handler_count("deleted"), 0);
    }

    #[test]
    fn test_cancellation_applies_to_observers() {
        let mut observers = Observers::<Account>::new();
        observers.register::<Welcome>().unwrap();

        let mut bob = account("bob");
        observers.notify(&mut bob, "suspended").unwrap();

        assert_eq!(bob.trail.entries(), ["freeze"]);
        assert!(bob.cancellation.is_cancelled());
    }

    #[test]
    fn test_wrong_subject_type_rejected() {
        let mut observers = Observers::<Account>::new();
        let err = observers.register::<ProfileWatcher>().unwrap_err();
        assert!(matches!(err, RegistrationError::ParameterMismatch { .. }));
        assert!(observers.targets().is_empty());
    }

    #[test]
    fn test_separate_registries_stay_apart() {
        let mut accounts = Observers::<Account>::new();
        let mut profiles = Observers::<Profile>::new();
        accounts.register::<Welcome>().unwrap();
        profiles.register::<ProfileWatcher>().unwrap();

        assert!(accounts.is_registered::<Welcome>());
        assert!(!profiles.is_registered::<Welcome>());

        profiles.clear();
        assert!(profiles.targets().is_empty());
        assert_eq!(accounts.targets().len(), 1);
    }
}
