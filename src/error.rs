//! Error types surfaced by the router.
//!
//! Three families, matching when they can happen:
//!
//! - [`ConfigurationError`]: raised while building a [`Router`](crate::router::Router).
//!   Never produced by a dispatch.
//! - [`RoutingError`]: the expected outcome of a request that matches no route.
//!   Exactly one per failed dispatch, owned by the earliest stage that ran out of
//!   candidates.
//! - [`DispatchError`]: what [`Router::route`](crate::router::Router::route) returns;
//!   wraps a [`RoutingError`] or reports an ambiguous table (an internal invariant
//!   violation that must surface as a 500).

use crate::rules::RejectReason;
use crate::server::Request;
use http::{Method, StatusCode};
use std::fmt;

/// Invalid router configuration, detected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A route key has a different number of components than the rule chain.
    ArityMismatch {
        /// Display name of the offending route
        route: String,
        /// Number of configured rules
        expected: usize,
        /// Number of components in the route key
        found: usize,
    },
    /// Two routes were registered under the same composite key.
    DuplicateKey {
        /// The route registered first
        first: String,
        /// The route that collided with it
        second: String,
    },
    /// Two routes accept the same requests at every stage, so some request
    /// would reach both.
    Ambiguous {
        /// The route registered first
        first: String,
        /// The route that overlaps it
        second: String,
    },
    /// A rule refused one component of a route key.
    InvalidSpec {
        /// Name of the rule that rejected the spec
        rule: String,
        /// Display name of the offending route
        route: String,
        /// Why the spec was rejected
        reason: String,
    },
    /// A manifest names a rule that is not registered.
    UnknownRule {
        /// The unresolved rule name
        name: String,
    },
    /// A manifest names a handler that is not registered.
    UnknownHandler {
        /// The unresolved handler name
        name: String,
        /// The route that referenced it
        route: String,
    },
}

impl ConfigurationError {
    pub(crate) fn invalid_spec(rule: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidSpec {
            rule: rule.to_string(),
            route: String::new(),
            reason: reason.into(),
        }
    }

    /// Attach the route name to an [`ConfigurationError::InvalidSpec`] raised by a rule.
    pub(crate) fn for_route(self, name: &str) -> Self {
        match self {
            ConfigurationError::InvalidSpec { rule, route, reason } if route.is_empty() => {
                ConfigurationError::InvalidSpec {
                    rule,
                    route: name.to_string(),
                    reason,
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ArityMismatch {
                route,
                expected,
                found,
            } => write!(
                f,
                "route {route} has {found} key components but the rule chain has {expected} rules"
            ),
            ConfigurationError::DuplicateKey { first, second } => write!(
                f,
                "route {second} repeats the composite key of route {first}"
            ),
            ConfigurationError::Ambiguous { first, second } => write!(
                f,
                "routes {first} and {second} overlap at every rule; some requests would match both"
            ),
            ConfigurationError::InvalidSpec {
                rule,
                route,
                reason,
            } => write!(f, "rule '{rule}' rejected the spec of route {route}: {reason}"),
            ConfigurationError::UnknownRule { name } => write!(f, "unknown rule '{name}'"),
            ConfigurationError::UnknownHandler { name, route } => {
                write!(f, "route {route} references unknown handler '{name}'")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// A request that no route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route path matches (404).
    NotFound {
        /// The unmatched request path
        path: String,
    },
    /// The path matched but no route accepts the method (405).
    MethodNotAllowed {
        /// The request method
        method: Method,
        /// Methods accepted by the routes whose path matched
        allowed: Vec<Method>,
    },
    /// No remaining route accepts the request's content type (415).
    UnsupportedMediaType {
        /// The request content type, `None` when the header was absent
        content_type: Option<String>,
    },
    /// A user-defined rule rejected every remaining route.
    Rejected {
        /// Name of the rejecting rule
        rule: String,
        /// Status chosen by that rule
        status: StatusCode,
        /// Diagnostic text
        message: String,
    },
}

impl RoutingError {
    /// Turn the reason reported by a rule into the error for this request.
    #[must_use]
    pub fn from_reason(reason: RejectReason, rule: &str, request: &Request) -> Self {
        match reason {
            RejectReason::NoPathMatch => RoutingError::NotFound {
                path: request.path.clone(),
            },
            RejectReason::MethodNotAllowed { allowed } => RoutingError::MethodNotAllowed {
                method: request.method.clone(),
                allowed,
            },
            RejectReason::UnsupportedMediaType => RoutingError::UnsupportedMediaType {
                content_type: request.content_type.clone(),
            },
            RejectReason::Other { status, message } => RoutingError::Rejected {
                rule: rule.to_string(),
                status,
                message: message.into_owned(),
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            RoutingError::NotFound { .. } => StatusCode::NOT_FOUND,
            RoutingError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RoutingError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RoutingError::Rejected { status, .. } => *status,
        }
    }

    /// Value for the `Allow` response header of a 405.
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            RoutingError::MethodNotAllowed { allowed, .. } if !allowed.is_empty() => Some(
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NotFound { path } => write!(f, "Path not found: {path}"),
            RoutingError::MethodNotAllowed { method, allowed } => {
                write!(f, "Method {method} not allowed")?;
                if !allowed.is_empty() {
                    let names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                    write!(f, " (allowed: {})", names.join(", "))?;
                }
                Ok(())
            }
            RoutingError::UnsupportedMediaType { content_type } => match content_type {
                Some(ct) => write!(f, "Unsupported Content-Type: {ct}"),
                None => write!(f, "Unsupported Content-Type: request has no content type"),
            },
            RoutingError::Rejected {
                rule,
                status,
                message,
            } => write!(f, "{message} (rule '{rule}', status {})", status.as_u16()),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Failure of [`Router::route`](crate::router::Router::route).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The request matched no route.
    Routing(RoutingError),
    /// More than one route survived every rule.
    ///
    /// The route table is inconsistent. Report as 500; never pick one of the
    /// candidates.
    Ambiguous {
        /// Display names of the surviving routes
        candidates: Vec<String>,
    },
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Routing(err) => err.status(),
            DispatchError::Ambiguous { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The routing error, if this is an ordinary no-match outcome.
    #[must_use]
    pub fn as_routing(&self) -> Option<&RoutingError> {
        match self {
            DispatchError::Routing(err) => Some(err),
            DispatchError::Ambiguous { .. } => None,
        }
    }
}

impl From<RoutingError> for DispatchError {
    fn from(err: RoutingError) -> Self {
        DispatchError::Routing(err)
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Routing(err) => err.fmt(f),
            DispatchError::Ambiguous { candidates } => write!(
                f,
                "ambiguous route table: {} routes accept the request ({})",
                candidates.len(),
                candidates.join(", ")
            ),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Routing(err) => Some(err),
            DispatchError::Ambiguous { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_failing_stage() {
        let not_found = RoutingError::NotFound { path: "/c".into() };
        let wrong_method = RoutingError::MethodNotAllowed {
            method: Method::GET,
            allowed: vec![Method::POST],
        };
        let media = RoutingError::UnsupportedMediaType { content_type: None };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(media.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn allow_header_lists_methods_in_order() {
        let err = RoutingError::MethodNotAllowed {
            method: Method::DELETE,
            allowed: vec![Method::GET, Method::POST],
        };
        assert_eq!(err.allow_header().as_deref(), Some("GET, POST"));
        assert_eq!(err.to_string(), "Method DELETE not allowed (allowed: GET, POST)");
    }

    #[test]
    fn ambiguous_dispatch_is_internal_error() {
        let err = DispatchError::Ambiguous {
            candidates: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.as_routing().is_none());
    }

    #[test]
    fn ambiguous_configuration_names_both_routes() {
        let err = ConfigurationError::Ambiguous {
            first: "get".into(),
            second: "any".into(),
        };
        assert_eq!(
            err.to_string(),
            "routes get and any overlap at every rule; some requests would match both"
        );
    }

    #[test]
    fn invalid_spec_picks_up_route_name() {
        let err = ConfigurationError::invalid_spec("method", "bad token").for_route("#2");
        assert_eq!(
            err.to_string(),
            "rule 'method' rejected the spec of route #2: bad token"
        );
    }
}
