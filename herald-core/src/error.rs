//! Error types for Herald.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`HeraldError`] - Top-level error type for all Herald operations
//! - [`RegistrationError`] - Rejected registrations
//! - [`DispatchError`] - Failures while firing
//! - [`DirectoryError`] - Failures of the bus directory
//! - [`ScanError`] - A listener could not list its handlers
//! - [`InvokeError`] - A single handler call failed

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Herald operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// A registration was rejected.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Firing a message failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The bus directory failed.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// A listener failed to produce its handler descriptors.
#[derive(Error, Debug)]
#[error("failed to scan `{target}` for handlers")]
pub struct ScanError {
    /// The listener that was scanned.
    pub target: &'static str,
    /// What went wrong.
    #[source]
    pub source: BoxError,
}

impl ScanError {
    /// Wrap a scan failure for `target`.
    pub fn new(target: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            target,
            source: source.into(),
        }
    }
}

/// A single handler invocation failed.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// An instance handler was called without a matching instance.
    #[error("handler needs an instance of `{0}`")]
    MissingInstance(&'static str),

    /// The argument was not of the handler's parameter type.
    #[error("handler expects an argument of type `{0}`")]
    ArgumentMismatch(&'static str),

    /// The handler itself returned an error.
    #[error(transparent)]
    Handler(BoxError),
}

/// Errors that reject a registration.
///
/// A rejected registration leaves the bus exactly as it was.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Closures cannot be registered as listeners.
    #[error("`{0}` is a closure and cannot be registered as a listener")]
    Closure(&'static str),

    /// The listener declares no handlers.
    #[error("`{0}` declares no handlers")]
    NoHandlers(&'static str),

    /// A descriptor belongs to a different listener.
    #[error("handler `{method}` belongs to `{owner}`, not `{target}`")]
    ForeignDescriptor {
        /// The listener being registered.
        target: &'static str,
        /// The offending handler.
        method: &'static str,
        /// The listener the handler belongs to.
        owner: &'static str,
    },

    /// A descriptor's subject cannot be registered.
    #[error("handler `{target}::{method}` has invalid subject `{subject}`: {reason}")]
    InvalidSubject {
        /// The listener being registered.
        target: &'static str,
        /// The offending handler.
        method: &'static str,
        /// The rejected subject.
        subject: String,
        /// Why the subject was rejected.
        reason: &'static str,
    },

    /// A handler's parameter is not the type this registry dispatches.
    #[error("handler `{target}::{method}` takes `{found}`, expected `{expected}`")]
    ParameterMismatch {
        /// The listener being registered.
        target: &'static str,
        /// The offending handler.
        method: &'static str,
        /// The type the registry dispatches.
        expected: &'static str,
        /// The type the handler takes.
        found: &'static str,
    },

    /// The listener is already registered.
    #[error("`{0}` is already registered")]
    AlreadyRegistered(&'static str),

    /// The listener could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Errors that abort a dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler returned an error. The source is the handler's own error.
    #[error("handler `{target}::{method}` failed")]
    Handler {
        /// The listener owning the handler.
        target: &'static str,
        /// The handler that failed.
        method: &'static str,
        /// The error the handler returned.
        #[source]
        source: BoxError,
    },

    /// The listener instance could not be created.
    #[error("failed to instantiate `{target}`")]
    Instantiation {
        /// The listener that could not be created.
        target: &'static str,
        /// Why creation failed.
        #[source]
        source: BoxError,
    },

    /// The instance factory produced a value of the wrong type.
    #[error("instance factory returned a value that is not `{0}`")]
    InstanceMismatch(&'static str),

    /// The fired value cannot be viewed as the handler's parameter.
    #[error("handler `{target}::{method}` expects `{expected}`, fired `{subject}`")]
    SubjectMismatch {
        /// The listener owning the handler.
        target: &'static str,
        /// The handler.
        method: &'static str,
        /// The handler's parameter type.
        expected: &'static str,
        /// The fired type.
        subject: &'static str,
    },
}

impl DispatchError {
    /// The error a handler returned, if that is what aborted the dispatch.
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Downcast the handler's error to a concrete type.
    pub fn downcast_handler_error<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.handler_error()?.downcast_ref::<T>()
    }

    /// Take ownership of the handler's error.
    pub fn into_handler_error(self) -> Result<BoxError, Self> {
        match self {
            Self::Handler { source, .. } => Ok(source),
            other => Err(other),
        }
    }
}

/// Errors raised by the bus directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// No bus exists under this name.
    #[error("event bus `{0}` does not exist")]
    UnknownBus(String),

    /// A bus with this name already exists.
    #[error("event bus `{0}` already exists")]
    DuplicateBus(String),

    /// Registering with the selected bus failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Firing on the selected bus failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

// Convenience conversions
impl From<BoxError> for HeraldError {
    fn from(err: BoxError) -> Self {
        HeraldError::Custom(err)
    }
}
