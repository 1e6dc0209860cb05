//! The request record handed over by the transport.

pub mod request;

pub use request::{HeaderVec, Request, MAX_INLINE_HEADERS};
