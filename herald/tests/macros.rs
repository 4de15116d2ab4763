//! What `#[listener]`, `#[subscribe]` and `#[derive(Message)]` generate.

use herald::{HandlerDescriptor, Listener, ScanError, prelude::*, testing::Trail};
use lazy_static::lazy_static;
use thiserror::Error;

mod common;
use common::{Logger, OrderPlaced};

lazy_static! {
    static ref PINGS: Trail = Trail::new();
}

#[derive(Message)]
struct Ping {
    tag: &'static str,
}

#[derive(Error, Debug, PartialEq)]
#[error("card declined for order {0}")]
struct Declined(u64);

/// Only has associated functions, so it is never instantiated.
struct Pinger;

#[listener(constructor = Pinger::refuse)]
impl Pinger {
    fn refuse() -> Result<Self, Declined> {
        Err(Declined(0))
    }

    #[subscribe]
    fn on_ping(ping: &Ping) {
        PINGS.record(ping.tag);
    }
}

#[derive(Default)]
struct Payments {
    charged: Vec<u64>,
}

#[listener]
impl Payments {
    #[subscribe]
    fn charge(&mut self, event: &OrderPlaced) -> Result<(), Declined> {
        if event.id % 2 == 1 {
            return Err(Declined(event.id));
        }
        self.charged.push(event.id);
        Ok(())
    }
}

#[derive(Default)]
struct Idle;

#[listener]
impl Idle {
    #[allow(dead_code)]
    fn not_a_handler(&self, _event: &OrderPlaced) {}
}

struct Fragile;

#[listener(constructor = Fragile::build)]
impl Fragile {
    fn build() -> Result<Self, Declined> {
        Err(Declined(99))
    }

    #[subscribe]
    fn on_order_placed(&mut self, _event: &OrderPlaced) {}
}

#[derive(Message, Default)]
struct Checked {
    #[message(cancellation)]
    cancellation: Cancellation,
    trail: Trail,
}

#[derive(Message, Default)]
struct Flagged {
    #[message(cancellation)]
    cancellation: Cancellation,
}

#[derive(Message, Default)]
struct Escalated {
    #[message(parent)]
    base: Checked,
    #[message(cancellation)]
    cancellation: Cancellation,
}

#[derive(Message, Default)]
struct Joined {
    #[message(parent)]
    checked: Checked,
    #[message(parent)]
    flagged: Flagged,
}

#[derive(Default)]
struct Veto;

#[listener]
impl Veto {
    #[subscribe]
    fn on_checked(&mut self, event: &mut Checked) {
        event.trail.record("veto");
        event.cancellation.cancel("vetoed");
    }
}

#[derive(Default)]
struct Flagger;

#[listener]
impl Flagger {
    #[subscribe]
    fn on_flagged(event: &mut Flagged) {
        event.cancellation.cancel("flagged");
    }
}

#[derive(Default)]
struct Escalator;

#[listener]
impl Escalator {
    #[subscribe]
    fn on_escalated(&mut self, event: &Escalated) {
        event.base.trail.record("escalated");
    }

    #[subscribe]
    fn on_joined(&mut self, event: &Joined) {
        event.checked.trail.record("joined");
    }
}

#[test]
fn test_parent_cancellation_stops_message_with_own_state() {
    let trail = Trail::new();
    let mut bus = EventBus::new();
    bus.register::<Veto>().unwrap().register::<Escalator>().unwrap();

    let event = bus
        .fire(Escalated {
            base: Checked {
                trail: trail.clone(),
                ..Checked::default()
            },
            ..Escalated::default()
        })
        .unwrap();

    assert_eq!(trail.entries(), ["veto"]);
    assert!(event.is_cancelled());
    assert!(!event.cancellation.is_cancelled());
    assert_eq!(event.cancellation_message(), Some("vetoed"));
}

#[test]
fn test_any_cancelled_parent_stops_dispatch() {
    let trail = Trail::new();
    let mut bus = EventBus::new();
    bus.register::<Flagger>().unwrap().register::<Escalator>().unwrap();

    let event = bus
        .fire(Joined {
            checked: Checked {
                trail: trail.clone(),
                ..Checked::default()
            },
            ..Joined::default()
        })
        .unwrap();

    assert!(trail.is_empty());
    assert!(event.flagged.cancellation.is_cancelled());
    assert!(!event.checked.cancellation.is_cancelled());
    let state = event.cancellable().unwrap();
    assert_eq!(state.cancellation_message(), Some("flagged"));
}

#[test]
fn test_static_handler_runs_without_instance() {
    let mut bus = EventBus::new();
    bus.register::<Pinger>().unwrap();

    bus.fire(Ping { tag: "static-a" }).unwrap();
    bus.fire(Ping { tag: "static-a" }).unwrap();

    assert_eq!(PINGS.count("static-a"), 2);
    assert!(bus.instance::<Pinger>().is_none());
}

#[test]
fn test_scan_lists_subscribed_methods_only() {
    let descriptors = Payments::scan().unwrap();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].method(), "charge");
    assert_eq!(descriptors[0].subject(), &TypeKey::of::<OrderPlaced>());
    assert!(!descriptors[0].is_static());

    let statics: Vec<HandlerDescriptor> = Pinger::scan().unwrap();
    assert!(statics[0].is_static());
}

#[test]
fn test_handler_error_is_returned_unchanged() {
    let mut bus = EventBus::new();
    bus.register::<Payments>().unwrap();

    bus.fire(OrderPlaced { id: 2 }).unwrap();
    let err = bus.fire(OrderPlaced { id: 3 }).unwrap_err();

    assert_eq!(err.downcast_handler_error::<Declined>(), Some(&Declined(3)));
    assert!(matches!(
        &err,
        DispatchError::Handler { method: "charge", .. }
    ));
    let source = err.into_handler_error().unwrap();
    assert_eq!(source.to_string(), "card declined for order 3");
    assert_eq!(bus.instance::<Payments>().unwrap().charged, [2]);
}

#[test]
fn test_listener_without_handlers_is_rejected() {
    assert!(Idle::scan().unwrap().is_empty());

    let mut bus = EventBus::new();
    let err = bus.register::<Idle>().unwrap_err();
    assert!(matches!(err, RegistrationError::NoHandlers(_)));
    assert!(!bus.is_registered::<Idle>());
}

#[test]
fn test_failed_construction_is_reported() {
    let mut bus = EventBus::new();
    bus.register::<Fragile>().unwrap();

    let err = bus.fire(OrderPlaced { id: 1 }).unwrap_err();
    assert!(matches!(err, DispatchError::Instantiation { .. }));
    assert!(bus.instance::<Fragile>().is_none());
}

#[test]
fn test_rejected_registration_leaves_bus_untouched() {
    let mut bus = EventBus::new();
    bus.register::<Logger>().unwrap();

    let foreign = Logger::scan().unwrap();
    let err = bus
        .register_descriptors(TypeKey::of::<Payments>(), foreign, None)
        .unwrap_err();

    assert!(matches!(err, RegistrationError::ForeignDescriptor { .. }));
    assert_eq!(bus.targets(), [TypeKey::of::<Logger>()]);
    assert_eq!(bus.handler_count::<OrderPlaced>(), 1);
}

#[test]
fn test_closures_cannot_be_listeners() {
    fn key_of<T: 'static>(_: &T) -> TypeKey {
        TypeKey::of::<T>()
    }

    let closure = || ();
    let target = key_of(&closure);
    let descriptors = vec![HandlerDescriptor::bind_function::<(), OrderPlaced, _>(
        OrderPlaced::message_type(),
        "closure",
        |_| (),
    )];

    let mut bus = EventBus::new();
    let err = bus.register_descriptors(target, descriptors, None).unwrap_err();
    assert!(matches!(err, RegistrationError::Closure(_)));
}

#[test]
fn test_scan_error_is_reported() {
    struct Broken;

    impl Listener for Broken {
        fn scan() -> Result<Vec<HandlerDescriptor>, ScanError> {
            Err(ScanError::new("Broken", "handler table unavailable"))
        }

        fn construct() -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    let mut bus = EventBus::new();
    let err = bus.register::<Broken>().unwrap_err();
    assert!(matches!(err, RegistrationError::Scan(_)));
    assert!(bus.targets().is_empty());
}
