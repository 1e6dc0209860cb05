//! # Router Module
//!
//! The router selects exactly one handler for a request by running an ordered
//! chain of [`Rule`](crate::rules::Rule)s over a table of routes.
//!
//! ## Overview
//!
//! Every route carries a composite key: one [`RuleSpec`](crate::rules::RuleSpec)
//! per rule, in chain order. The router is responsible for:
//! - Validating keys against the chain when the table is built
//! - Narrowing the candidate routes rule by rule for each request
//! - Collecting the typed arguments extracted along the way
//! - Reporting the error owned by the first rule that ran out of candidates
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Compilation**: At construction, each rule compiles its component of every
//!    key into a [`RuleKey`](crate::rules::RuleKey). Arity mismatches, rejected
//!    specs and duplicate keys fail here with a
//!    [`ConfigurationError`](crate::error::ConfigurationError).
//!
//! 2. **Matching**: For each request, a per-dispatch context starts with every
//!    route as a candidate. Each rule keeps the candidates whose key accepts the
//!    request. If none survive, that rule's rejection becomes the
//!    [`RoutingError`](crate::error::RoutingError) (404, 405, 415, ...). Exactly
//!    one survivor is the match; more than one is reported as an ambiguous table.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use rulerouter::dispatcher::{HandlerResponse, PathArgs};
//! use rulerouter::router::Router;
//! use rulerouter::rules::{MethodRule, PathRule};
//! use rulerouter::server::Request;
//!
//! let router = Router::builder()
//!     .rule(PathRule::new())
//!     .rule(MethodRule)
//!     .route(["/a".into(), "POST".into()], |_: &Request, _: &PathArgs| HandlerResponse::text(201, "a"))
//!     .route(["/b".into(), "GET".into()], |_: &Request, _: &PathArgs| HandlerResponse::text(200, "b"))
//!     .build()
//!     .unwrap();
//!
//! let err = router.route(&Request::new(Method::GET, "/a")).unwrap_err();
//! assert_eq!(err.status().as_u16(), 405);
//! let err = router.route(&Request::new(Method::GET, "/c")).unwrap_err();
//! assert_eq!(err.status().as_u16(), 404);
//! ```
//!
//! ## Performance
//!
//! Matching is a linear scan per rule over the surviving candidates. Rules keep
//! no per-request state, so a built router is shared freely across threads.

mod context;
mod core;
mod table;

pub use context::StageView;
pub use core::{RouteMatch, Router, RouterBuilder};
pub use table::{RouteEntry, RouteTable};
