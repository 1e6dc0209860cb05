//! # Dispatcher Module
//!
//! The handler side of a dispatch: what a handler receives and what it returns.
//!
//! ## Overview
//!
//! Once the [`Router`](crate::router::Router) has narrowed the route table to a
//! single entry, the entry's [`Handler`] is called with:
//!
//! - the [`Request`](crate::server::Request) record the transport built, and
//! - the [`PathArgs`] captured by the path rule, in left-to-right order of the
//!   type tokens in the matched pattern.
//!
//! It answers with a [`HandlerResponse`] (status, headers, body) that the
//! transport renders onto the wire.
//!
//! ## Handler Registration
//!
//! Any `Fn(&Request, &PathArgs) -> HandlerResponse + Send + Sync` is a handler:
//!
//! ```rust
//! use rulerouter::dispatcher::{HandlerResponse, PathArgs};
//! use rulerouter::server::Request;
//!
//! fn get_options(_req: &Request, args: &PathArgs) -> HandlerResponse {
//!     match args.get::<i64>(0) {
//!         Some(0) => HandlerResponse::text(200, "some options"),
//!         _ => HandlerResponse::text(400, "No options"),
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! A panicking handler does not take the caller down: the panic is caught,
//! logged at error level and turned into a 500 response.

mod core;

pub(crate) use core::invoke;
pub use core::{
    FromPathArg, Handler, HandlerRef, HandlerResponse, PathArg, PathArgs, MAX_INLINE_ARGS,
};
