//! Testing utilities for Herald.
//!
//! This module provides utilities to make testing listeners and buses easier.
//!
//! # Features
//!
//! - [`Trail`]: A shared log that listeners append to, for asserting call order
//! - [`CountingFactory`]: An instance factory that counts instantiations
//! - [`StopAfter`]: A response predicate that halts dispatch after N handlers

use crate::dispatch::InstanceFactory;
use herald_core::{BoxError, Instance, Response, TypeKey};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Trail
// ============================================================================

/// A shared, append-only record of what happened.
///
/// Clones share the same record, so a test can hand one clone to each
/// listener and inspect the combined order afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let trail = Trail::new();
/// bus.register_instance(Logger { trail: trail.clone() })?;
///
/// bus.fire(OrderPlaced { id: 7 })?;
///
/// assert_eq!(trail.entries(), ["Logger::on_order_placed"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Trail {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trail {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// A copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// How many entries equal `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.lock().iter().filter(|e| e.as_str() == entry).count()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

// ============================================================================
// Counting Factory
// ============================================================================

/// An instance factory that counts how often it is asked for an instance.
///
/// # Example
///
/// ```rust,ignore
/// let factory = CountingFactory::new(ConstructorTable::new().with::<Logger, TypeKey>());
/// let counter = factory.clone();
/// bus.set_instance_factory(factory);
///
/// bus.fire(OrderPlaced { id: 1 })?;
/// bus.fire(OrderPlaced { id: 2 })?;
///
/// assert_eq!(counter.count(), 1);
/// ```
pub struct CountingFactory<F> {
    inner: Arc<F>,
    count: Arc<AtomicUsize>,
}

impl<F: InstanceFactory> CountingFactory<F> {
    /// Count the instantiations performed by `inner`.
    pub fn new(inner: F) -> Self {
        Self {
            inner: Arc::new(inner),
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl<F> Clone for CountingFactory<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            count: self.count.clone(),
        }
    }
}

impl<F: InstanceFactory> InstanceFactory for CountingFactory<F> {
    fn create(&self, target: &TypeKey) -> Result<Instance, BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.create(target)
    }
}

// ============================================================================
// Stop After
// ============================================================================

/// A response predicate allowing a fixed number of handlers to run.
///
/// Every response it sees is kept, so tests can also assert on what the
/// handlers returned.
#[derive(Debug, Default)]
pub struct StopAfter {
    allowed: usize,
    seen: usize,
    responses: Vec<Option<bool>>,
}

impl StopAfter {
    /// Let `allowed` handlers run, then stop.
    pub fn new(allowed: usize) -> Self {
        Self {
            allowed,
            ..Self::default()
        }
    }

    /// Inspect one response. Returns whether dispatch should go on.
    pub fn check(&mut self, response: &Response) -> bool {
        self.seen += 1;
        self.responses.push(response.as_bool());
        self.seen < self.allowed
    }

    /// How many responses were inspected.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// The boolean value of every inspected response.
    pub fn responses(&self) -> &[Option<bool>] {
        &self.responses
    }
}
