//! # CLI Module
//!
//! Command-line access to route manifests.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Validate a manifest and print the rule chain and route table:
//!
//! ```bash
//! rulerouter check --routes routes.yaml
//! ```
//!
//! ### `route`
//!
//! Dispatch one request against a manifest. Every handler is an echo handler,
//! so the report shows which route won and what it extracted:
//!
//! ```bash
//! rulerouter route --routes routes.yaml --method POST --path /upload \
//!     --content-type 'application/ld+json'
//! ```
//!
//! A request that matches no route prints its status (404, 405, 415) and
//! error, plus the `allow` list for a 405.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use rulerouter::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{check_report, load_router, route_report, run_cli, Cli, Commands};
