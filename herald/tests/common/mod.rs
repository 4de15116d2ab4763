#![allow(dead_code)]

use herald::prelude::*;
use herald::testing::Trail;

// ============================================================================
// Test Message Types
// ============================================================================

#[derive(Message, Debug, Clone, PartialEq)]
pub struct OrderPlaced {
    pub id: u64,
}

#[derive(Message, Default)]
pub struct DomainEvent {
    #[message(cancellation)]
    pub cancellation: Cancellation,
    pub trail: Trail,
}

#[derive(Message, Default)]
pub struct UserEvent {
    #[message(parent)]
    pub base: DomainEvent,
    pub name: String,
}

#[derive(Message, Default)]
pub struct UserRenamed {
    #[message(parent)]
    pub base: UserEvent,
    pub from: String,
}

impl UserEvent {
    pub fn new(name: &str, trail: &Trail) -> Self {
        Self {
            base: DomainEvent {
                trail: trail.clone(),
                ..DomainEvent::default()
            },
            name: name.to_string(),
        }
    }
}

impl UserRenamed {
    pub fn new(from: &str, to: &str, trail: &Trail) -> Self {
        Self {
            base: UserEvent::new(to, trail),
            from: from.to_string(),
        }
    }
}

// ============================================================================
// Test Listeners
// ============================================================================

#[derive(Default)]
pub struct Logger {
    pub seen: Vec<u64>,
}

#[listener]
impl Logger {
    #[subscribe]
    fn on_order_placed(&mut self, event: &OrderPlaced) {
        self.seen.push(event.id);
    }
}

#[derive(Default)]
pub struct Auditor {
    pub seen: Vec<u64>,
}

#[listener]
impl Auditor {
    #[subscribe]
    fn on_order_placed(&mut self, event: &OrderPlaced) -> bool {
        self.seen.push(event.id);
        true
    }
}

/// Catches every domain event, whatever its concrete type.
#[derive(Default)]
pub struct AuditLog;

#[listener]
impl AuditLog {
    #[subscribe]
    fn on_domain_event(&mut self, event: &DomainEvent) {
        event.trail.record("audit");
    }
}

#[derive(Default)]
pub struct UserTracker;

#[listener]
impl UserTracker {
    #[subscribe]
    fn on_user_event(&mut self, event: &UserEvent) {
        event.base.trail.record(format!("user:{}", event.name));
    }

    #[subscribe]
    fn on_renamed(&mut self, event: &UserRenamed) {
        event
            .base
            .base
            .trail
            .record(format!("renamed:{}", event.from));
    }
}

/// Cancels any user event for a blocked name.
#[derive(Default)]
pub struct Gatekeeper;

#[listener]
impl Gatekeeper {
    #[subscribe]
    fn check(&mut self, event: &mut UserEvent) {
        if event.name == "mallory" {
            event.base.trail.record("blocked");
            event.base.cancellation.cancel("blocked user");
        }
    }
}
