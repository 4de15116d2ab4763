//! Handler return values.

use crate::error::BoxError;
use std::{any::Any, fmt};

/// The type-erased value a handler returned.
///
/// Responses are shown to the caller's response predicate after each
/// handler call. Handlers returning `()` produce an empty response.
pub struct Response(Option<Box<dyn Any + Send>>);

impl Response {
    /// A response carrying no value.
    pub fn empty() -> Self {
        Self(None)
    }

    /// A response carrying `value`.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// Whether the handler returned nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Whether the response holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrow the value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Take the value out as a `T`, or get the response back.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        match self.0 {
            Some(value) => value
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|value| Self(Some(value))),
            None => Err(self),
        }
    }

    /// The value as a `bool`, if the handler returned one.
    pub fn as_bool(&self) -> Option<bool> {
        self.downcast_ref::<bool>().copied()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Response(..)"),
            None => f.write_str("Response(empty)"),
        }
    }
}

/// Trait for converting a handler's return value into a [`Response`].
///
/// # Default Implementations
///
/// - `()` → empty response
/// - primitives, `String`, `&'static str` → response carrying the value
/// - `Option<T>` → `None` is empty, `Some` delegates to `T`
/// - `Result<T, E>` → delegates to `T`, or fails the dispatch with `E`
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a handler",
    label = "missing `IntoResponse` implementation",
    note = "Return a supported type, wrap the value in `Response::new`, or implement `IntoResponse`."
)]
pub trait IntoResponse {
    /// Convert the return value, or surface the handler's error.
    fn into_response(self) -> Result<Response, BoxError>;
}

impl IntoResponse for () {
    fn into_response(self) -> Result<Response, BoxError> {
        Ok(Response::empty())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> Result<Response, BoxError> {
        Ok(self)
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_response(self) -> Result<Response, BoxError> {
        match self {
            Ok(value) => value.into_response(),
            Err(err) => Err(err.into()),
        }
    }
}

impl<T: IntoResponse> IntoResponse for Option<T> {
    fn into_response(self) -> Result<Response, BoxError> {
        match self {
            Some(value) => value.into_response(),
            None => Ok(Response::empty()),
        }
    }
}

macro_rules! impl_value_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoResponse for $ty {
                fn into_response(self) -> Result<Response, BoxError> {
                    Ok(Response::new(self))
                }
            }
        )+
    };
}

impl_value_response!(
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_empty() {
        let response = ().into_response().unwrap();
        assert!(response.is_empty());
        assert_eq!(response.as_bool(), None);
    }

    #[test]
    fn test_value_round_trip() {
        let response = 7_u32.into_response().unwrap();
        assert!(response.is::<u32>());
        assert_eq!(response.downcast_ref::<u32>(), Some(&7));
        assert_eq!(response.into_inner::<u32>().unwrap(), 7);
    }

    #[test]
    fn test_bool_response() {
        assert_eq!(false.into_response().unwrap().as_bool(), Some(false));
    }

    #[test]
    fn test_result_error_surfaces() {
        let failed: Result<bool, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let err = failed.into_response().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_option_none_is_empty() {
        let nothing: Option<bool> = None;
        assert!(nothing.into_response().unwrap().is_empty());
        assert_eq!(Some(true).into_response().unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_into_inner_wrong_type_returns_response() {
        let response = Response::new("hello");
        let response = response.into_inner::<u8>().unwrap_err();
        assert_eq!(response.downcast_ref::<&str>(), Some(&"hello"));
    }
}
