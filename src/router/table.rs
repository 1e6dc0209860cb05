//! Route entries and the validated route table.

use crate::dispatcher::{Handler, HandlerRef};
use crate::error::ConfigurationError;
use crate::rules::{Rule, RuleKey, RuleSpec};
use std::fmt;
use std::sync::Arc;

/// A composite key (one [`RuleSpec`] per rule) bound to a handler.
#[derive(Clone)]
pub struct RouteEntry {
    name: String,
    key: Vec<RuleSpec>,
    handler: HandlerRef,
}

impl RouteEntry {
    /// Create an entry. Its display name defaults to the rendered key, e.g.
    /// `(/{int}/options, GET, *)`.
    pub fn new<K, H>(key: K, handler: H) -> Self
    where
        K: IntoIterator<Item = RuleSpec>,
        H: Handler + 'static,
    {
        Self::from_ref(key, Arc::new(handler))
    }

    /// Create an entry around an already shared handler.
    pub fn from_ref<K>(key: K, handler: HandlerRef) -> Self
    where
        K: IntoIterator<Item = RuleSpec>,
    {
        let key: Vec<RuleSpec> = key.into_iter().collect();
        let name = render_key(&key);
        Self { name, key, handler }
    }

    /// Replace the display name, typically with the handler name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &[RuleSpec] {
        &self.key
    }

    #[must_use]
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn render_key(key: &[RuleSpec]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    route: RouteEntry,
    keys: Vec<RuleKey>,
}

/// Route entries compiled against a rule chain.
///
/// Construction guarantees every entry has exactly one compiled key per rule,
/// that no two entries share a composite key, and that no two entries overlap
/// at every rule as far as [`Rule::overlaps`] can tell.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<CompiledEntry>,
}

impl RouteTable {
    /// Compile `routes` against `rules`.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::ArityMismatch`] when a key has the wrong length
    /// - [`ConfigurationError::InvalidSpec`] when a rule rejects a key component
    /// - [`ConfigurationError::DuplicateKey`] when two keys compile to the same value
    /// - [`ConfigurationError::Ambiguous`] when every rule reports two keys as overlapping
    pub fn compile(
        rules: &[Arc<dyn Rule>],
        routes: impl IntoIterator<Item = RouteEntry>,
    ) -> Result<Self, ConfigurationError> {
        let mut entries: Vec<CompiledEntry> = Vec::new();

        for route in routes {
            if route.key.len() != rules.len() {
                return Err(ConfigurationError::ArityMismatch {
                    route: route.name.clone(),
                    expected: rules.len(),
                    found: route.key.len(),
                });
            }

            let keys = rules
                .iter()
                .zip(&route.key)
                .map(|(rule, spec)| rule.configure(spec))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| err.for_route(&route.name))?;

            if let Some(existing) = entries.iter().find(|e| same_key(&e.keys, &keys)) {
                return Err(ConfigurationError::DuplicateKey {
                    first: existing.route.name.clone(),
                    second: route.name.clone(),
                });
            }

            if let Some(existing) = entries.iter().find(|e| overlapping(rules, &e.keys, &keys)) {
                return Err(ConfigurationError::Ambiguous {
                    first: existing.route.name.clone(),
                    second: route.name.clone(),
                });
            }

            entries.push(CompiledEntry { route, keys });
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The route at `index`, in registration order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RouteEntry> {
        self.entries.get(index).map(|e| &e.route)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter().map(|e| &e.route)
    }

    /// Compiled key of route `entry` for rule `stage`.
    ///
    /// Both indices come from the router, which only produces valid ones.
    pub(crate) fn key(&self, entry: usize, stage: usize) -> &RuleKey {
        &self.entries[entry].keys[stage]
    }

    pub(crate) fn route(&self, entry: usize) -> &RouteEntry {
        &self.entries[entry].route
    }
}

fn same_key(a: &[RuleKey], b: &[RuleKey]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
}

fn overlapping(rules: &[Arc<dyn Rule>], a: &[RuleKey], b: &[RuleKey]) -> bool {
    rules
        .iter()
        .zip(a.iter().zip(b))
        .all(|(rule, (x, y))| rule.overlaps(x, y))
}
