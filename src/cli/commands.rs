use crate::error::DispatchError;
use crate::manifest::{Registry, RouteManifest};
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;
use crate::server::Request;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Command-line interface for rulerouter
///
/// Validates route manifests and dispatches single requests against them.
#[derive(Debug, Parser)]
#[command(name = "rulerouter")]
#[command(about = "Rule-chain request dispatcher", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a route manifest and list its routes
    Check {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Dispatch one request against a manifest using echo handlers
    Route {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,

        /// Request method, e.g. GET
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target; a query string is ignored
        #[arg(short, long)]
        path: String,

        /// Request Content-Type header
        #[arg(short = 't', long)]
        content_type: Option<String>,

        /// Extra request headers as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

/// Load `path` and build a router whose handlers all echo the request.
///
/// # Errors
///
/// Fails when the manifest cannot be read or describes an invalid router.
pub fn load_router(path: &Path) -> anyhow::Result<Router> {
    let manifest = RouteManifest::load(path)?;
    let mut registry = Registry::new();
    registry.register_echo_handlers(&manifest);
    let router = registry
        .build(&manifest)
        .with_context(|| format!("invalid route manifest {}", path.display()))?;
    Ok(router.with_runtime_config(&RuntimeConfig::from_env()))
}

/// The `check` report: rule chain and one line per route.
#[must_use]
pub fn check_report(router: &Router) -> Value {
    json!({
        "rules": router.rule_names(),
        "routes": router.describe_routes(),
    })
}

/// Dispatch `request` and describe the outcome as JSON.
#[must_use]
pub fn route_report(router: &Router, request: &Request) -> Value {
    match router.route(request) {
        Ok(matched) => {
            let response = matched.invoke(request);
            let key: Vec<String> = matched.route().key().iter().map(ToString::to_string).collect();
            json!({
                "status": response.status,
                "handler": matched.handler_name(),
                "key": key,
                "args": matched.args(),
                "body": response.body,
            })
        }
        Err(err) => {
            let mut report = json!({
                "status": err.status().as_u16(),
                "error": err.to_string(),
            });
            if let DispatchError::Routing(routing) = &err {
                if let Some(allow) = routing.allow_header() {
                    report["allow"] = Value::String(allow);
                }
            }
            report
        }
    }
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header {raw:?} is not in `Name: value` form"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Run the parsed command, printing its JSON report to stdout.
///
/// # Errors
///
/// Fails on unreadable or invalid manifests and malformed request arguments.
/// A request that matches no route is a report, not an error.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { routes } => {
            let router = load_router(&routes)?;
            println!("{}", serde_json::to_string_pretty(&check_report(&router))?);
            Ok(())
        }
        Commands::Route {
            routes,
            method,
            path,
            content_type,
            headers,
        } => {
            let router = load_router(&routes)?;
            let mut parsed = headers
                .iter()
                .map(|h| parse_header(h))
                .collect::<anyhow::Result<Vec<_>>>()?;
            if let Some(ct) = content_type {
                parsed.push(("Content-Type".to_string(), ct));
            }
            let request = Request::from_parts(&method, &path, parsed)
                .with_context(|| format!("invalid method {method:?}"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&route_report(&router, &request))?
            );
            Ok(())
        }
    }
}
