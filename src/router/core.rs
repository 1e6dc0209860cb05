//! Router core module - the dispatch path.
//!
//! Runs the rule chain over the route table for one request. The chain order
//! is the error-priority policy: the first rule that eliminates every remaining
//! candidate decides which error the request gets. No reordering happens here.

use super::context::{RoutingContext, StageView};
use super::table::{RouteEntry, RouteTable};
use crate::dispatcher::{self, HandlerResponse, PathArgs};
use crate::error::{ConfigurationError, DispatchError, RoutingError};
use crate::rules::Rule;
use crate::runtime_config::RuntimeConfig;
use crate::server::Request;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Result of a successful dispatch: the selected route and its arguments.
#[derive(Debug, Clone)]
pub struct RouteMatch<'r> {
    route: &'r RouteEntry,
    args: PathArgs,
}

impl<'r> RouteMatch<'r> {
    #[must_use]
    pub fn route(&self) -> &'r RouteEntry {
        self.route
    }

    #[must_use]
    pub fn handler_name(&self) -> &'r str {
        self.route.name()
    }

    /// Arguments captured by the path rule, left to right.
    #[must_use]
    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    #[must_use]
    pub fn into_args(self) -> PathArgs {
        self.args
    }

    /// Call the selected handler. A panic becomes a 500 response.
    #[must_use]
    pub fn invoke(&self, request: &Request) -> HandlerResponse {
        dispatcher::invoke(self.route.handler(), self.route.name(), request, &self.args)
    }
}

/// Selects exactly one handler per request by running an ordered rule chain.
///
/// Immutable after construction; share it behind an `Arc` across threads.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<Arc<dyn Rule>>,
    table: RouteTable,
    slow_match_threshold: Duration,
}

impl Router {
    /// Validate `routes` against the rule chain and build the router.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when a route key does not fit the chain,
    /// or when two routes share a composite key or overlap at every rule.
    pub fn new(
        rules: Vec<Arc<dyn Rule>>,
        routes: impl IntoIterator<Item = RouteEntry>,
    ) -> Result<Self, ConfigurationError> {
        let table = RouteTable::compile(&rules, routes)?;

        // RT5: Routing table loaded
        let rule_names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        let routes_summary: Vec<&str> = table.iter().take(10).map(RouteEntry::name).collect();
        info!(
            routes_count = table.len(),
            rules = ?rule_names,
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self {
            rules,
            table,
            slow_match_threshold: RuntimeConfig::default().slow_match_threshold,
        })
    }

    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Apply runtime tuning (slow-match warning threshold).
    #[must_use]
    pub fn with_runtime_config(mut self, config: &RuntimeConfig) -> Self {
        self.slow_match_threshold = config.slow_match_threshold;
        self
    }

    /// Rule names in chain order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// One line per route: its name followed by its composite key.
    #[must_use]
    pub fn describe_routes(&self) -> Vec<String> {
        self.table
            .iter()
            .map(|route| {
                let key: Vec<String> = route.key().iter().map(ToString::to_string).collect();
                format!("{} <- ({})", route.name(), key.join(", "))
            })
            .collect()
    }

    /// Select the route for `request`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Routing`] with the error owned by the first rule that
    ///   eliminated every candidate
    /// - [`DispatchError::Ambiguous`] when several routes survive the whole chain
    pub fn route(&self, request: &Request) -> Result<RouteMatch<'_>, DispatchError> {
        // RT1: Route match attempt
        debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            content_type = ?request.content_type,
            "Route match attempt"
        );
        let match_start = Instant::now();

        let mut ctx = RoutingContext::new(&self.table);
        for (stage, rule) in self.rules.iter().enumerate() {
            if let Err(reason) = ctx.apply(rule.as_ref(), request, StageView::new(&self.table, stage)) {
                let err = RoutingError::from_reason(reason, rule.name(), request);
                // RT4: No route matched
                warn!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    stage = rule.name(),
                    status = err.status().as_u16(),
                    error = %err,
                    duration_us = match_start.elapsed().as_micros(),
                    "No route matched"
                );
                return Err(err.into());
            }
            // RT2: Stage narrowed
            trace!(
                request_id = %request.request_id,
                stage = rule.name(),
                remaining = ctx.len(),
                "Rule stage narrowed candidates"
            );
        }

        let mut candidates = ctx.into_candidates();
        if candidates.len() > 1 {
            let names: Vec<String> = candidates
                .iter()
                .map(|c| self.table.route(c.entry()).name().to_string())
                .collect();
            // RT6: Ambiguous route table
            error!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                candidates = ?names,
                "Ambiguous route table - more than one route accepts the request"
            );
            return Err(DispatchError::Ambiguous { candidates: names });
        }

        let Some(candidate) = candidates.pop() else {
            // Only reachable with an empty rule chain and an empty table.
            return Err(RoutingError::NotFound {
                path: request.path.clone(),
            }
            .into());
        };

        let route = self.table.route(candidate.entry());
        let match_duration = match_start.elapsed();
        // RT3: Route matched
        if match_duration > self.slow_match_threshold {
            warn!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                handler_name = %route.name(),
                path_args = ?candidate.args(),
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            );
        } else {
            info!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                handler_name = %route.name(),
                path_args = ?candidate.args(),
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        Ok(RouteMatch {
            route,
            args: candidate.args,
        })
    }

    /// Select the route for `request` and run its handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::route`]; handler failures are responses, not errors.
    pub fn dispatch(&self, request: &Request) -> Result<HandlerResponse, DispatchError> {
        self.route(request).map(|matched| matched.invoke(request))
    }
}

/// Incremental construction of a [`Router`].
///
/// ```
/// use rulerouter::dispatcher::{HandlerResponse, PathArgs};
/// use rulerouter::router::Router;
/// use rulerouter::rules::{ContentTypeRule, MethodRule, PathRule, RuleSpec};
/// use rulerouter::server::Request;
/// use http::Method;
///
/// let router = Router::builder()
///     .rule(PathRule::new())
///     .rule(MethodRule)
///     .rule(ContentTypeRule)
///     .route(
///         ["/{int}/options".into(), "GET".into(), RuleSpec::Any],
///         |_: &Request, args: &PathArgs| HandlerResponse::text(200, format!("options {}", args[0])),
///     )
///     .build()
///     .unwrap();
///
/// let res = router.dispatch(&Request::new(Method::GET, "/3/options")).unwrap();
/// assert_eq!(res.body, "options 3");
/// ```
#[derive(Default)]
pub struct RouterBuilder {
    rules: Vec<Arc<dyn Rule>>,
    routes: Vec<RouteEntry>,
    runtime: Option<RuntimeConfig>,
}

impl RouterBuilder {
    /// Append a rule to the chain. Order matters: see [`Router`].
    #[must_use]
    pub fn rule(self, rule: impl Rule + 'static) -> Self {
        self.shared_rule(Arc::new(rule))
    }

    #[must_use]
    pub fn shared_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn route<K, H>(self, key: K, handler: H) -> Self
    where
        K: IntoIterator<Item = crate::rules::RuleSpec>,
        H: dispatcher::Handler + 'static,
    {
        self.entry(RouteEntry::new(key, handler))
    }

    #[must_use]
    pub fn entry(mut self, entry: RouteEntry) -> Self {
        self.routes.push(entry);
        self
    }

    #[must_use]
    pub fn runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime = Some(config);
        self
    }

    /// # Errors
    ///
    /// See [`Router::new`].
    pub fn build(self) -> Result<Router, ConfigurationError> {
        let router = Router::new(self.rules, self.routes)?;
        Ok(match self.runtime {
            Some(config) => router.with_runtime_config(&config),
            None => router,
        })
    }
}
