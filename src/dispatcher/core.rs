//! Dispatcher core module - handler contract, typed path arguments and invocation.

use crate::server::{HeaderVec, Request};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Maximum number of path arguments before heap allocation.
/// Most routes capture ≤4 values (e.g., `/users/{int}/posts/{int}`).
pub const MAX_INLINE_ARGS: usize = 8;

/// One value captured by a type token in a path pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathArg {
    /// Produced by the `int` token
    Int(i64),
    /// Produced by the `float` token
    Float(f64),
    /// Produced by the `bool` token
    Bool(bool),
    /// Produced by the `str` token and most custom converters
    Str(String),
}

impl fmt::Display for PathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathArg::Int(v) => write!(f, "{v}"),
            PathArg::Float(v) => write!(f, "{v}"),
            PathArg::Bool(v) => write!(f, "{v}"),
            PathArg::Str(v) => f.write_str(v),
        }
    }
}

/// Conversion from a captured [`PathArg`] into a concrete Rust type.
pub trait FromPathArg: Sized {
    fn from_path_arg(arg: &PathArg) -> Option<Self>;
}

impl FromPathArg for i64 {
    fn from_path_arg(arg: &PathArg) -> Option<Self> {
        match arg {
            PathArg::Int(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromPathArg for $ty {
                fn from_path_arg(arg: &PathArg) -> Option<Self> {
                    i64::from_path_arg(arg).and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )*
    };
}

narrow_int!(i32, u32, u64, usize);

impl FromPathArg for f64 {
    fn from_path_arg(arg: &PathArg) -> Option<Self> {
        match arg {
            PathArg::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromPathArg for bool {
    fn from_path_arg(arg: &PathArg) -> Option<Self> {
        match arg {
            PathArg::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromPathArg for String {
    fn from_path_arg(arg: &PathArg) -> Option<Self> {
        match arg {
            PathArg::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Positional arguments extracted from the matched path, left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PathArgs(SmallVec<[PathArg; MAX_INLINE_ARGS]>);

impl PathArgs {
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn push(&mut self, arg: PathArg) {
        self.0.push(arg);
    }

    /// Typed access to the argument at `index`.
    ///
    /// Returns `None` when the index is out of range or the captured value has
    /// a different type.
    ///
    /// ```
    /// use rulerouter::dispatcher::{PathArg, PathArgs};
    ///
    /// let args: PathArgs = vec![PathArg::Int(3), PathArg::Str("root".into())].into_iter().collect();
    /// assert_eq!(args.get::<i64>(0), Some(3));
    /// assert_eq!(args.get::<String>(1).as_deref(), Some("root"));
    /// assert_eq!(args.get::<f64>(0), None);
    /// ```
    #[must_use]
    pub fn get<T: FromPathArg>(&self, index: usize) -> Option<T> {
        self.0.get(index).and_then(T::from_path_arg)
    }
}

impl Deref for PathArgs {
    type Target = [PathArg];

    fn deref(&self) -> &[PathArg] {
        &self.0
    }
}

impl Extend<PathArg> for PathArgs {
    fn extend<I: IntoIterator<Item = PathArg>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<PathArg> for PathArgs {
    fn from_iter<I: IntoIterator<Item = PathArg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PathArgs {
    type Item = PathArg;
    type IntoIter = smallvec::IntoIter<[PathArg; MAX_INLINE_ARGS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Response returned by a handler: status, headers and body.
///
/// Rendering the body onto the wire is the transport's job; a `Value::String`
/// body is meant as plain text, anything else as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Create a plain-text response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self::new(status, headers, Value::String(body.into()))
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Business logic attached to a route.
///
/// Closures of the shape `Fn(&Request, &PathArgs) -> HandlerResponse` implement
/// this trait automatically.
pub trait Handler: Send + Sync {
    fn call(&self, request: &Request, args: &PathArgs) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(&Request, &PathArgs) -> HandlerResponse + Send + Sync,
{
    fn call(&self, request: &Request, args: &PathArgs) -> HandlerResponse {
        self(request, args)
    }
}

/// Shared handle to a registered handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Run `handler`, converting a panic into a 500 response.
pub(crate) fn invoke(
    handler: &dyn Handler,
    handler_name: &str,
    request: &Request,
    args: &PathArgs,
) -> HandlerResponse {
    // H1: Handler execution start
    info!(
        request_id = %request.request_id,
        handler_name = %handler_name,
        path_args = ?args,
        "Handler execution start"
    );
    let execution_start = Instant::now();

    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        handler.call(request, args)
    })) {
        Ok(response) => {
            // H2: Handler execution complete
            info!(
                request_id = %request.request_id,
                handler_name = %handler_name,
                status = response.status,
                execution_time_us = execution_start.elapsed().as_micros(),
                "Handler execution complete"
            );
            response
        }
        Err(panic) => {
            let panic_message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());

            // H3: Handler panic caught
            error!(
                request_id = %request.request_id,
                handler_name = %handler_name,
                panic_message = %panic_message,
                "Handler panicked - CRITICAL"
            );
            HandlerResponse::error(500, &format!("Handler panicked: {panic_message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn typed_access_narrows_integers() {
        let args: PathArgs = [PathArg::Int(-1), PathArg::Int(7)].into_iter().collect();
        assert_eq!(args.get::<i64>(0), Some(-1));
        assert_eq!(args.get::<u32>(0), None);
        assert_eq!(args.get::<u32>(1), Some(7));
        assert_eq!(args.get::<i64>(2), None);
    }

    #[test]
    fn args_serialize_as_plain_json_values() {
        let args: PathArgs = [
            PathArg::Int(321),
            PathArg::Str("root".into()),
            PathArg::Float(1.5),
            PathArg::Bool(true),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json, serde_json::json!([321, "root", 1.5, true]));
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut res = HandlerResponse::json(200, serde_json::json!({}));
        res.set_header("Content-Type", "application/problem+json".to_string());
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.get_header("content-type"), Some("application/problem+json"));
    }

    #[test]
    fn panicking_handler_becomes_500() {
        let handler = |_: &Request, _: &PathArgs| -> HandlerResponse { panic!("boom") };
        let req = Request::new(Method::GET, "/");
        let res = invoke(&handler, "boom", &req, &PathArgs::new());
        assert_eq!(res.status, 500);
        assert_eq!(res.body["error"], "Handler panicked: boom");
    }
}
