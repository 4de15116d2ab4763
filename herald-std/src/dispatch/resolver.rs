//! Matching policies.

use super::registry::HandlerRegistry;
use herald_core::{HandlerDescriptor, RegistrationError, SubjectKey, TypeKey};
use std::collections::HashSet;

/// Decides which registered handlers a fired subject reaches.
///
/// Resolvers are pure: they only read the registry.
pub trait SubjectResolver<K: SubjectKey>: Send + Sync {
    /// The handlers matching `subject`, in dispatch order.
    fn resolve<'r>(
        &self,
        registry: &'r HandlerRegistry<K>,
        subject: &K,
    ) -> Vec<&'r HandlerDescriptor<K>>;

    /// Check a descriptor before it is registered under this policy.
    fn validate(&self, descriptor: &HandlerDescriptor<K>) -> Result<(), RegistrationError> {
        check_subject(descriptor)
    }
}

fn check_subject<K: SubjectKey>(descriptor: &HandlerDescriptor<K>) -> Result<(), RegistrationError> {
    descriptor
        .subject()
        .validate()
        .map_err(|reason| RegistrationError::InvalidSubject {
            target: descriptor.target().name(),
            method: descriptor.method(),
            subject: descriptor.subject().to_string(),
            reason,
        })
}

fn check_parameter<K: SubjectKey>(
    descriptor: &HandlerDescriptor<K>,
    expected: &TypeKey,
) -> Result<(), RegistrationError> {
    if descriptor.parameter() != *expected {
        return Err(RegistrationError::ParameterMismatch {
            target: descriptor.target().name(),
            method: descriptor.method(),
            expected: expected.name(),
            found: descriptor.parameter().name(),
        });
    }
    Ok(())
}

/// Matches only handlers registered for exactly the fired subject.
///
/// Optionally restricted to handlers taking one parameter type, which is
/// how observers of a single observed type are kept apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch {
    parameter: Option<TypeKey>,
}

impl ExactMatch {
    /// Accept handlers of any parameter type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept handlers whose parameter is `parameter`.
    pub fn restricted_to(parameter: TypeKey) -> Self {
        Self {
            parameter: Some(parameter),
        }
    }

    /// The parameter type handlers must take, if restricted.
    pub fn parameter(&self) -> Option<TypeKey> {
        self.parameter
    }
}

impl<K: SubjectKey> SubjectResolver<K> for ExactMatch {
    fn resolve<'r>(
        &self,
        registry: &'r HandlerRegistry<K>,
        subject: &K,
    ) -> Vec<&'r HandlerDescriptor<K>> {
        registry.handlers_for(subject).iter().collect()
    }

    fn validate(&self, descriptor: &HandlerDescriptor<K>) -> Result<(), RegistrationError> {
        check_subject(descriptor)?;
        match &self.parameter {
            Some(expected) => check_parameter(descriptor, expected),
            None => Ok(()),
        }
    }
}

/// Matches handlers registered for the fired type or any of its ancestors.
///
/// Results are grouped by registered subject, in the registry's subject
/// order. A listener registered for both a type and one of its ancestors
/// runs once per registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hierarchy;

impl SubjectResolver<TypeKey> for Hierarchy {
    fn resolve<'r>(
        &self,
        registry: &'r HandlerRegistry<TypeKey>,
        subject: &TypeKey,
    ) -> Vec<&'r HandlerDescriptor<TypeKey>> {
        let lineage: HashSet<TypeKey> = subject.ancestry().into_iter().collect();

        registry
            .iter()
            .filter(|(registered, _)| lineage.contains(*registered))
            .flat_map(|(_, list)| list.iter())
            .collect()
    }

    // Handlers receive the fired value viewed as their subject type.
    fn validate(&self, descriptor: &HandlerDescriptor<TypeKey>) -> Result<(), RegistrationError> {
        check_subject(descriptor)?;
        check_parameter(descriptor, descriptor.subject())
    }
}
