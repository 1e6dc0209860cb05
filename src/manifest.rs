//! # Route Manifests
//!
//! A manifest describes a router as data: the rule chain by name and the routes
//! as key arrays bound to handler names. YAML and JSON are both accepted.
//!
//! ```yaml
//! rules: [path, method, content_type]
//! routes:
//!   - key: ["/{int}/options", GET, null]
//!     handler: get_options
//!   - key: ["/upload", POST, json]
//!     handler: upload
//!     name: upload_json
//! ```
//!
//! `null` stands for the wildcard ([`RuleSpec::Any`]); every other entry is
//! handed to the named rule's [`Rule::parse_spec`]. A [`Registry`] resolves the
//! names and builds the [`Router`].

use crate::dispatcher::{Handler, HandlerRef};
use crate::echo::echo_handler;
use crate::error::ConfigurationError;
use crate::router::{RouteEntry, Router};
use crate::rules::{ContentTypeRule, MethodRule, PathRule, Rule, RuleSpec};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One route in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRoute {
    /// One entry per rule; `null` is the wildcard
    pub key: Vec<Option<String>>,
    /// Registered handler name
    pub handler: String,
    /// Display name for logs and errors, defaults to the handler name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ManifestRoute {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.handler)
    }
}

/// A router described as data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    /// Rule names in chain order
    pub rules: Vec<String>,
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
}

impl RouteManifest {
    /// Load a manifest file; `.json` files are read as JSON, anything else as YAML.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read route manifest {}", path.display()))?;
        let manifest = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON route manifest {}", path.display()))?
        } else {
            Self::from_yaml(&content)
                .with_context(|| format!("invalid YAML route manifest {}", path.display()))?
        };
        Ok(manifest)
    }

    /// Parse a YAML manifest.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the text is not a manifest.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Distinct handler names, in first-use order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for route in &self.routes {
            if !names.contains(&route.handler.as_str()) {
                names.push(&route.handler);
            }
        }
        names
    }
}

/// Named rules and handlers that manifests refer to.
///
/// `path`, `method` and `content_type` are registered from the start.
#[derive(Clone)]
pub struct Registry {
    rules: HashMap<String, Arc<dyn Rule>>,
    handlers: HashMap<String, HandlerRef>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self {
            rules: HashMap::new(),
            handlers: HashMap::new(),
        };
        registry.register_rule(PathRule::new());
        registry.register_rule(MethodRule);
        registry.register_rule(ContentTypeRule);
        registry
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under its own [`Rule::name`], replacing any previous one.
    pub fn register_rule(&mut self, rule: impl Rule + 'static) {
        self.register_shared_rule(Arc::new(rule));
    }

    pub fn register_shared_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.insert(rule.name().to_string(), rule);
    }

    pub fn register_handler(&mut self, name: &str, handler: impl Handler + 'static) {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    /// Register an [`echo_handler`] for every handler name in `manifest` that
    /// has no handler yet.
    pub fn register_echo_handlers(&mut self, manifest: &RouteManifest) {
        for name in manifest.handler_names() {
            if !self.has_handler(name) {
                self.register_handler(name, echo_handler(name));
            }
        }
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(name)
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Resolve every name in `manifest` and build the router.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::UnknownRule`] / [`ConfigurationError::UnknownHandler`]
    ///   for unresolved names
    /// - anything [`Router::new`] rejects
    pub fn build(&self, manifest: &RouteManifest) -> Result<Router, ConfigurationError> {
        let rules = manifest
            .rules
            .iter()
            .map(|name| {
                self.rule(name)
                    .map(Arc::clone)
                    .ok_or_else(|| ConfigurationError::UnknownRule { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(manifest.routes.len());
        for route in &manifest.routes {
            let route_name = route.display_name();
            let handler = self.handlers.get(&route.handler).ok_or_else(|| {
                ConfigurationError::UnknownHandler {
                    name: route.handler.clone(),
                    route: route_name.to_string(),
                }
            })?;
            let key = parse_key(&rules, route).map_err(|err| err.for_route(route_name))?;
            entries.push(RouteEntry::from_ref(key, Arc::clone(handler)).named(route_name));
        }

        debug!(
            rules = ?manifest.rules,
            routes_count = entries.len(),
            "Manifest resolved"
        );
        Router::new(rules, entries)
    }
}

/// Pair each key component with its rule. Extra or missing components are
/// left for [`Router::new`] to report as an arity mismatch.
fn parse_key(
    rules: &[Arc<dyn Rule>],
    route: &ManifestRoute,
) -> Result<Vec<RuleSpec>, ConfigurationError> {
    route
        .key
        .iter()
        .enumerate()
        .map(|(stage, component)| match (component, rules.get(stage)) {
            (None, _) => Ok(RuleSpec::Any),
            (Some(text), Some(rule)) => rule.parse_spec(text),
            (Some(text), None) => Ok(RuleSpec::token(text.as_str())),
        })
        .collect()
}
