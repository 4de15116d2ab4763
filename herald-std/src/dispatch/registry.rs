//! Subject-indexed handler storage.

use herald_core::{HandlerDescriptor, SubjectKey, TypeKey};
use std::collections::HashMap;

/// Multi-valued mapping from subject to an ordered list of descriptors.
///
/// Subjects keep the order in which they were first added, and each
/// subject's descriptors keep insertion order. Together these define
/// dispatch order.
pub struct HandlerRegistry<K: SubjectKey = TypeKey> {
    order: Vec<K>,
    handlers: HashMap<K, Vec<HandlerDescriptor<K>>>,
}

impl<K: SubjectKey> Default for HandlerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SubjectKey> HandlerRegistry<K> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Append a descriptor to its subject's list.
    pub fn add(&mut self, descriptor: HandlerDescriptor<K>) {
        let subject = descriptor.subject().clone();
        match self.handlers.get_mut(&subject) {
            Some(list) => list.push(descriptor),
            None => {
                self.order.push(subject.clone());
                self.handlers.insert(subject, vec![descriptor]);
            }
        }
    }

    /// The descriptors stored for exactly `subject`.
    pub fn handlers_for(&self, subject: &K) -> &[HandlerDescriptor<K>] {
        self.handlers.get(subject).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate every subject with its descriptors, in subject order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[HandlerDescriptor<K>])> {
        self.order
            .iter()
            .filter_map(|subject| Some((subject, self.handlers.get(subject)?.as_slice())))
    }

    /// Remove every descriptor owned by `target`.
    ///
    /// Subjects left without descriptors are forgotten. Returns how many
    /// descriptors were removed.
    pub fn remove_target(&mut self, target: &TypeKey) -> usize {
        let mut removed = 0;
        for list in self.handlers.values_mut() {
            let before = list.len();
            list.retain(|descriptor| descriptor.target() != *target);
            removed += before - list.len();
        }

        if removed > 0 {
            self.handlers.retain(|_, list| !list.is_empty());
            let handlers = &self.handlers;
            self.order.retain(|subject| handlers.contains_key(subject));
        }
        removed
    }

    /// The total number of descriptors.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Whether no descriptors are stored.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every subject with at least one descriptor, in subject order.
    pub fn subjects(&self) -> &[K] {
        &self.order
    }

    /// The number of descriptors owned by `target`.
    pub fn count_for_target(&self, target: &TypeKey) -> usize {
        self.handlers
            .values()
            .flatten()
            .filter(|descriptor| descriptor.target() == *target)
            .count()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.order.clear();
        self.handlers.clear();
    }
}

impl HandlerRegistry<TypeKey> {
    /// The descriptors matching a fired `subject`.
    ///
    /// Exact mode returns the list stored for `subject`. Hierarchy-aware mode
    /// also includes the lists of every ancestor of `subject`, concatenated
    /// in subject order.
    pub fn lookup(&self, subject: &TypeKey, hierarchy_aware: bool) -> Vec<&HandlerDescriptor> {
        use crate::dispatch::resolver::{ExactMatch, Hierarchy, SubjectResolver};

        if hierarchy_aware {
            Hierarchy.resolve(self, subject)
        } else {
            ExactMatch::new().resolve(self, subject)
        }
    }
}

impl<K: SubjectKey> std::fmt::Debug for HandlerRegistry<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(subject, list)| (subject, list.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{ActionKey, Message};

    struct Base;
    impl Message for Base {}

    struct Derived;
    impl Message for Derived {
        fn message_type() -> TypeKey {
            TypeKey::with_parents::<Self>(|| vec![Base::message_type()])
        }
    }

    struct First;
    struct Second;

    fn on<L: Send + 'static, E: Message>(method: &'static str) -> HandlerDescriptor {
        HandlerDescriptor::function::<L, E, _>(method, |_| ())
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut registry = HandlerRegistry::new();
        registry.add(on::<First, Base>("a"));
        registry.add(on::<Second, Base>("b"));
        registry.add(on::<First, Base>("c"));

        let methods: Vec<_> = registry
            .handlers_for(&TypeKey::of::<Base>())
            .iter()
            .map(|d| d.method())
            .collect();
        assert_eq!(methods, ["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_target_preserves_rest() {
        let mut registry = HandlerRegistry::new();
        registry.add(on::<First, Base>("a"));
        registry.add(on::<Second, Base>("b"));
        registry.add(on::<First, Derived>("c"));

        assert_eq!(registry.remove_target(&TypeKey::of::<First>()), 2);
        assert_eq!(registry.subjects(), &[TypeKey::of::<Base>()]);
        assert_eq!(registry.handlers_for(&TypeKey::of::<Base>())[0].method(), "b");
        assert_eq!(registry.count_for_target(&TypeKey::of::<First>()), 0);
        assert_eq!(registry.remove_target(&TypeKey::of::<First>()), 0);
    }

    #[test]
    fn test_lookup_modes() {
        let mut registry = HandlerRegistry::new();
        registry.add(on::<First, Derived>("derived"));
        registry.add(on::<First, Base>("base"));

        let exact: Vec<_> = registry
            .lookup(&Derived::message_type(), false)
            .iter()
            .map(|d| d.method())
            .collect();
        assert_eq!(exact, ["derived"]);

        let aware: Vec<_> = registry
            .lookup(&Derived::message_type(), true)
            .iter()
            .map(|d| d.method())
            .collect();
        assert_eq!(aware, ["derived", "base"]);

        let base: Vec<_> = registry
            .lookup(&Base::message_type(), true)
            .iter()
            .map(|d| d.method())
            .collect();
        assert_eq!(base, ["base"]);
    }

    #[test]
    fn test_action_keyed_registry() {
        let mut registry = HandlerRegistry::<ActionKey>::new();
        registry.add(HandlerDescriptor::bind_function::<First, Base, _>(
            ActionKey::from("saved"),
            "on_saved",
            |_| (),
        ));
        assert_eq!(registry.handlers_for(&ActionKey::from("saved")).len(), 1);
        assert!(registry.handlers_for(&ActionKey::from("deleted")).is_empty());

        registry.clear();
        assert!(registry.is_empty());
    }
}
