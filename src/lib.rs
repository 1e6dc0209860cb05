//! # rulerouter
//!
//! **rulerouter** selects exactly one handler for a request by running an ordered
//! chain of pluggable rules, each inspecting one facet of the request (path,
//! method, content type, ...).
//!
//! ## Overview
//!
//! Every route is registered under a composite key with one component per rule.
//! At dispatch time the router starts with every route as a candidate and lets
//! each rule eliminate the routes whose key does not accept the request. Path
//! matching extracts typed arguments (`int`, `float`, `bool`, `str` or custom
//! converters) that are handed to the selected handler.
//!
//! The order of the chain is the error policy. With the usual
//! `[path, method, content_type]` chain a request fails with:
//! - **404** when no route path matches
//! - **405** when a path matched but no such route accepts the method
//! - **415** when path and method matched but the content type did not
//!
//! ## Architecture
//!
//! - **[`rules`]** - The [`Rule`](rules::Rule) trait and the built-in rules
//! - **[`router`]** - Route table validation and the dispatch loop
//! - **[`dispatcher`]** - Handler contract, typed path arguments, panic-safe invocation
//! - **[`server`]** - The request record rules inspect
//! - **[`error`]** - Configuration, routing and dispatch errors
//! - **[`manifest`]** - Routers described as YAML/JSON plus a name [`Registry`](manifest::Registry)
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `rulerouter` command
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use rulerouter::dispatcher::{HandlerResponse, PathArgs};
//! use rulerouter::router::Router;
//! use rulerouter::rules::{ContentTypeRule, MethodRule, PathRule, RuleSpec};
//! use rulerouter::server::Request;
//!
//! let router = Router::builder()
//!     .rule(PathRule::new())
//!     .rule(MethodRule)
//!     .rule(ContentTypeRule)
//!     .route(
//!         ["/id/{int}/user/{str}".into(), "GET".into(), RuleSpec::Any],
//!         |_: &Request, args: &PathArgs| {
//!             let id: i64 = args.get(0).unwrap_or_default();
//!             let user: String = args.get(1).unwrap_or_default();
//!             HandlerResponse::text(200, format!("{user}#{id}"))
//!         },
//!     )
//!     .build()?;
//!
//! let response = router.dispatch(&Request::new(Method::GET, "/id/321/user/root"))?;
//! assert_eq!(response.body, "root#321");
//!
//! let err = router.dispatch(&Request::new(Method::POST, "/id/321/user/root")).unwrap_err();
//! assert_eq!(err.status().as_u16(), 405);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! A built [`Router`](router::Router) is immutable and `Send + Sync`. Per-request
//! state lives in a context owned by each dispatch, so one router serves any
//! number of threads.

pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod router;
pub mod rules;
pub mod runtime_config;
pub mod server;

pub use error::{ConfigurationError, DispatchError, RoutingError};
pub use router::{RouteEntry, RouteMatch, Router};
