use crate::ids::RequestId;
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for a [`Request`]. Names are kept as `Arc<str>` so the
/// transport can reuse interned names across requests.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The request record a transport hands to the router.
///
/// Only the facets the built-in rules read are first-class fields; everything
/// else a custom rule may need travels in `headers`.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id for logs
    pub request_id: RequestId,
    /// HTTP method, compared case-sensitively
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Raw `Content-Type` header value, `None` when absent or empty
    pub content_type: Option<String>,
    /// Remaining request headers
    pub headers: HeaderVec,
}

impl Request {
    /// Build a request with no headers and no content type.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            content_type: None,
            headers: HeaderVec::new(),
        }
    }

    /// Build a request from transport-level parts.
    ///
    /// The query string is stripped from `target`, the `content-type` header
    /// populates [`Request::content_type`] and `x-request-id` is reused as the
    /// correlation id when it is a valid ULID.
    ///
    /// # Errors
    ///
    /// Returns an error if `method` is not a valid HTTP method token.
    pub fn from_parts<I, K, V>(
        method: &str,
        target: &str,
        headers: I,
    ) -> Result<Self, http::method::InvalidMethod>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let method = Method::from_bytes(method.as_bytes())?;
        let path = target.split('?').next().unwrap_or_default();
        let mut request = Self::new(method, path);
        for (name, value) in headers {
            request = request.with_header(name.as_ref(), value);
        }
        request.request_id = RequestId::from_header_or_new(request.get_header("x-request-id"));

        debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            content_type = ?request.content_type,
            headers_count = request.headers.len(),
            "Request record built"
        );
        Ok(request)
    }

    /// Set the content type; an empty value counts as absent.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let value = content_type.into();
        self.content_type = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
        self
    }

    /// Add a header. `Content-Type` also sets [`Request::content_type`].
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("content-type") {
            self = self.with_content_type(value.clone());
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_strips_query_and_reads_content_type() {
        let req = Request::from_parts(
            "POST",
            "/create?dry_run=1",
            [("Content-Type", "application/json"), ("Accept", "*/*")],
        )
        .unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/create");
        assert_eq!(req.content_type(), Some("application/json"));
        assert_eq!(req.get_header("accept"), Some("*/*"));
    }

    #[test]
    fn empty_content_type_is_absent() {
        let req = Request::new(Method::GET, "/").with_header("content-type", "");
        assert_eq!(req.content_type(), None);
    }

    #[test]
    fn upstream_request_id_is_kept() {
        let id = RequestId::new();
        let req =
            Request::from_parts("GET", "/", [("X-Request-Id", id.to_string())]).unwrap();
        assert_eq!(req.request_id, id);
    }

    #[test]
    fn invalid_method_is_rejected() {
        let empty: [(&str, &str); 0] = [];
        assert!(Request::from_parts("GE T", "/", empty).is_err());
    }
}
