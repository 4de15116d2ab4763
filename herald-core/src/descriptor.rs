//! Handler descriptors.

use crate::{
    error::InvokeError,
    key::{SubjectKey, TypeKey},
    message::Message,
    response::{IntoResponse, Response},
};
use std::{
    any::{Any, type_name},
    fmt,
    sync::Arc,
};

/// A type-erased listener instance, owned by an instance cache.
pub type Instance = Box<dyn Any + Send>;

type Invoker = dyn Fn(Option<&mut (dyn Any + Send)>, &mut dyn Any) -> Result<Response, InvokeError>
    + Send
    + Sync;

/// Immutable record of one handler binding.
///
/// A descriptor binds a subject to one method of a listener type (the
/// *target*). It carries a type-erased invoker that downcasts the listener
/// instance and the argument before calling the method.
///
/// Descriptors are usually generated by `#[listener]` and `#[observer]`.
/// They can also be built by hand:
///
/// ```rust,ignore
/// let descriptor = HandlerDescriptor::instance_method::<Logger, OrderPlaced, _>(
///     "on_order_placed",
///     |logger, event| logger.on_order_placed(event),
/// );
/// ```
pub struct HandlerDescriptor<K = TypeKey> {
    subject: K,
    target: TypeKey,
    method: &'static str,
    is_static: bool,
    parameter: TypeKey,
    invoker: Arc<Invoker>,
}

impl<K: SubjectKey> HandlerDescriptor<K> {
    /// Bind `subject` to an instance method of `L` taking an `E`.
    pub fn bind_method<L, E, R>(
        subject: K,
        method: &'static str,
        handler: fn(&mut L, &mut E) -> R,
    ) -> Self
    where
        L: Any + Send,
        E: Message,
        R: IntoResponse + 'static,
    {
        let invoker = move |instance: Option<&mut (dyn Any + Send)>,
                            argument: &mut dyn Any|
              -> Result<Response, InvokeError> {
            let instance = instance
                .and_then(|instance| instance.downcast_mut::<L>())
                .ok_or(InvokeError::MissingInstance(type_name::<L>()))?;
            let argument = argument
                .downcast_mut::<E>()
                .ok_or(InvokeError::ArgumentMismatch(type_name::<E>()))?;
            handler(instance, argument)
                .into_response()
                .map_err(InvokeError::Handler)
        };

        Self {
            subject,
            target: TypeKey::of::<L>(),
            method,
            is_static: false,
            parameter: E::message_type(),
            invoker: Arc::new(invoker),
        }
    }

    /// Bind `subject` to an associated function of `L` taking an `E`.
    ///
    /// The function runs without an instance, so `L` is never created for it.
    pub fn bind_function<L, E, R>(
        subject: K,
        method: &'static str,
        handler: fn(&mut E) -> R,
    ) -> Self
    where
        L: Any + Send,
        E: Message,
        R: IntoResponse + 'static,
    {
        let invoker = move |_: Option<&mut (dyn Any + Send)>,
                            argument: &mut dyn Any|
              -> Result<Response, InvokeError> {
            let argument = argument
                .downcast_mut::<E>()
                .ok_or(InvokeError::ArgumentMismatch(type_name::<E>()))?;
            handler(argument).into_response().map_err(InvokeError::Handler)
        };

        Self {
            subject,
            target: TypeKey::of::<L>(),
            method,
            is_static: true,
            parameter: E::message_type(),
            invoker: Arc::new(invoker),
        }
    }

    /// The subject this handler responds to.
    pub fn subject(&self) -> &K {
        &self.subject
    }

    /// The listener type owning the handler.
    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// The handler's name.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Whether the handler runs without an instance.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// The type of the handler's single argument.
    pub fn parameter(&self) -> TypeKey {
        self.parameter
    }

    /// Call the handler.
    ///
    /// `argument` must already be viewed as [`parameter`](Self::parameter).
    /// Static handlers ignore `instance`.
    pub fn invoke(
        &self,
        instance: Option<&mut (dyn Any + Send)>,
        argument: &mut dyn Any,
    ) -> Result<Response, InvokeError> {
        (self.invoker)(instance, argument)
    }
}

impl HandlerDescriptor<TypeKey> {
    /// Subscribe an instance method of `L` to messages of type `E`.
    pub fn instance_method<L, E, R>(method: &'static str, handler: fn(&mut L, &mut E) -> R) -> Self
    where
        L: Any + Send,
        E: Message,
        R: IntoResponse + 'static,
    {
        Self::bind_method(E::message_type(), method, handler)
    }

    /// Subscribe an associated function of `L` to messages of type `E`.
    pub fn function<L, E, R>(method: &'static str, handler: fn(&mut E) -> R) -> Self
    where
        L: Any + Send,
        E: Message,
        R: IntoResponse + 'static,
    {
        Self::bind_function::<L, E, R>(E::message_type(), method, handler)
    }
}

impl<K: Clone> Clone for HandlerDescriptor<K> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            target: self.target,
            method: self.method,
            is_static: self.is_static,
            parameter: self.parameter,
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for HandlerDescriptor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("subject", &self.subject)
            .field("target", &self.target)
            .field("method", &self.method)
            .field("is_static", &self.is_static)
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}
