//! # Rules Module
//!
//! A [`Rule`] decides, for one facet of a request, which routes remain eligible.
//! The [`Router`](crate::router::Router) runs its rules in the order they were
//! configured; each rule narrows the candidate set left by the previous one.
//!
//! ## Built-in rules
//!
//! - [`PathRule`]: literal and typed path segments, extracts [`PathArgs`]
//! - [`MethodRule`]: HTTP method equality
//! - [`ContentTypeRule`]: media type token or exact media type
//!
//! ## Writing a rule
//!
//! A rule compiles each route's [`RuleSpec`] once at construction
//! ([`Rule::configure`]), then answers per request and per route key
//! ([`Rule::check`]). When no candidate passes, the router reports the rule's
//! [`RejectReason`], which is how the rule chooses the HTTP status of the failure.
//!
//! ```rust
//! use http::StatusCode;
//! use rulerouter::dispatcher::PathArgs;
//! use rulerouter::error::ConfigurationError;
//! use rulerouter::router::StageView;
//! use rulerouter::rules::{Candidate, RejectReason, Rule, RuleKey, RuleSpec};
//! use rulerouter::server::Request;
//!
//! /// Routes on the `Host` header.
//! #[derive(Debug)]
//! struct HostRule;
//!
//! impl Rule for HostRule {
//!     fn name(&self) -> &str {
//!         "host"
//!     }
//!
//!     fn configure(&self, spec: &RuleSpec) -> Result<RuleKey, ConfigurationError> {
//!         Ok(match spec {
//!             RuleSpec::Token(host) => RuleKey::Token(host.to_ascii_lowercase()),
//!             _ => RuleKey::Any,
//!         })
//!     }
//!
//!     fn check(&self, request: &Request, key: &RuleKey) -> Option<PathArgs> {
//!         match key {
//!             RuleKey::Token(host) => request
//!                 .get_header("host")
//!                 .filter(|h| h.eq_ignore_ascii_case(host))
//!                 .map(|_| PathArgs::new()),
//!             _ => Some(PathArgs::new()),
//!         }
//!     }
//!
//!     fn rejection(&self, _: &Request, _: StageView<'_>, _: &[Candidate]) -> RejectReason {
//!         RejectReason::Other {
//!             status: StatusCode::MISDIRECTED_REQUEST,
//!             message: "Unknown host".into(),
//!         }
//!     }
//! }
//! ```

mod content_type;
mod method;
mod path;

pub use content_type::{ContentTypeRule, MediaType, MediaTypeSpec};
pub use method::MethodRule;
pub use path::{PathPattern, PathRule, Segment, SegmentType, PATH_DELIMITER};

use crate::dispatcher::{PathArg, PathArgs};
use crate::error::ConfigurationError;
use crate::router::StageView;
use crate::server::Request;
use http::{Method, StatusCode};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Configuration value for one rule in one route key.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSpec {
    /// Wildcard: the rule accepts every request for this route.
    Any,
    /// A single textual value, e.g. a method name or media token.
    Token(String),
    /// An ordered sequence of path segments.
    Path(Vec<Segment>),
}

impl RuleSpec {
    /// A path spec from literals and type tokens.
    ///
    /// ```
    /// use rulerouter::rules::{RuleSpec, Segment};
    ///
    /// let spec = RuleSpec::path(["/".into(), Segment::INT, "/options".into()]);
    /// assert_eq!(spec.to_string(), "/{int}/options");
    /// ```
    #[must_use]
    pub fn path(segments: impl IntoIterator<Item = Segment>) -> Self {
        RuleSpec::Path(segments.into_iter().collect())
    }

    #[must_use]
    pub fn token(value: impl Into<String>) -> Self {
        RuleSpec::Token(value.into())
    }
}

impl From<&str> for RuleSpec {
    fn from(value: &str) -> Self {
        RuleSpec::Token(value.to_string())
    }
}

impl From<Option<&str>> for RuleSpec {
    fn from(value: Option<&str>) -> Self {
        value.map_or(RuleSpec::Any, RuleSpec::from)
    }
}

impl From<Vec<Segment>> for RuleSpec {
    fn from(segments: Vec<Segment>) -> Self {
        RuleSpec::Path(segments)
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Any => f.write_str("*"),
            RuleSpec::Token(value) => f.write_str(value),
            RuleSpec::Path(segments) => segments.iter().try_for_each(|s| s.fmt(f)),
        }
    }
}

/// A [`RuleSpec`] after [`Rule::configure`] has validated and compiled it.
#[derive(Debug, Clone)]
pub enum RuleKey {
    /// Accept every request
    Any,
    /// Free-form token for user rules
    Token(String),
    /// Compiled path pattern
    Path(PathPattern),
    /// Parsed HTTP method
    Method(Method),
    /// Normalized media type matcher
    MediaType(MediaTypeSpec),
    /// Arbitrary compiled state for user rules
    Custom(Arc<dyn Any + Send + Sync>),
}

impl RuleKey {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        RuleKey::Custom(Arc::new(value))
    }

    /// Borrow the state of a [`RuleKey::Custom`] key as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            RuleKey::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether two compiled keys select the same requests.
    ///
    /// Custom keys are only equal when they share the same allocation.
    #[must_use]
    pub fn same_as(&self, other: &RuleKey) -> bool {
        match (self, other) {
            (RuleKey::Any, RuleKey::Any) => true,
            (RuleKey::Token(a), RuleKey::Token(b)) => a == b,
            (RuleKey::Path(a), RuleKey::Path(b)) => a == b,
            (RuleKey::Method(a), RuleKey::Method(b)) => a == b,
            (RuleKey::MediaType(a), RuleKey::MediaType(b)) => a == b,
            (RuleKey::Custom(a), RuleKey::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Why a rule eliminated every candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RejectReason {
    /// No route path matches (404)
    NoPathMatch,
    /// The path matched but the method did not (405)
    MethodNotAllowed {
        /// Methods accepted by the candidates that reached the method stage
        allowed: Vec<Method>,
    },
    /// The content type is not accepted (415)
    UnsupportedMediaType,
    /// Reason defined by a user rule
    Other {
        /// Status the failed dispatch should report
        status: StatusCode,
        /// Diagnostic text
        message: Cow<'static, str>,
    },
}

/// A route still eligible during one dispatch, with the arguments extracted so far.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub(crate) entry: usize,
    pub(crate) args: PathArgs,
}

impl Candidate {
    pub(crate) fn new(entry: usize) -> Self {
        Self {
            entry,
            args: PathArgs::new(),
        }
    }

    /// Index of the route in the table.
    #[must_use]
    pub fn entry(&self) -> usize {
        self.entry
    }

    #[must_use]
    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    /// Append arguments extracted by the current rule.
    pub fn push_args(&mut self, args: impl IntoIterator<Item = PathArg>) {
        self.args.extend(args);
    }
}

/// Outcome of one rule stage.
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// At least one candidate survived.
    Matched(Vec<Candidate>),
    /// None did; the router stops and reports this reason.
    NotMatched(RejectReason),
}

/// A pluggable matcher over one facet of a request.
///
/// Rules hold configuration only. Everything that depends on the request lives
/// in the [`Candidate`]s passed through [`Rule::narrow`], so one rule instance
/// serves any number of concurrent dispatches.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Short name for logs, errors and manifests.
    fn name(&self) -> &str;

    /// Read a spec from its manifest text. `null` in a manifest never reaches
    /// this method; it becomes [`RuleSpec::Any`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSpec`] when the text is malformed.
    fn parse_spec(&self, text: &str) -> Result<RuleSpec, ConfigurationError> {
        Ok(RuleSpec::Token(text.to_string()))
    }

    /// Validate and compile one route's spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSpec`] when the rule cannot use the spec.
    fn configure(&self, spec: &RuleSpec) -> Result<RuleKey, ConfigurationError>;

    /// Test one compiled key against the request.
    ///
    /// `Some(args)` keeps the route and appends `args` to its extracted
    /// arguments; `None` eliminates it.
    fn check(&self, request: &Request, key: &RuleKey) -> Option<PathArgs>;

    /// The reason reported when `candidates` (the set entering this stage)
    /// were all eliminated.
    fn rejection(
        &self,
        request: &Request,
        stage: StageView<'_>,
        candidates: &[Candidate],
    ) -> RejectReason;

    /// Whether one of two compiled keys accepts every request the other does.
    ///
    /// [`RouteTable::compile`](crate::router::RouteTable::compile) refuses two
    /// routes whose keys overlap at every stage. Answer `true` only when the
    /// containment is certain; overlaps this misses still surface at dispatch
    /// as [`DispatchError::Ambiguous`](crate::error::DispatchError::Ambiguous).
    fn overlaps(&self, a: &RuleKey, b: &RuleKey) -> bool {
        a.same_as(b) || matches!(a, RuleKey::Any) || matches!(b, RuleKey::Any)
    }

    /// Narrow the candidate set for this stage.
    fn narrow(
        &self,
        request: &Request,
        stage: StageView<'_>,
        candidates: Vec<Candidate>,
    ) -> MatchResult {
        let extracted: Vec<Option<PathArgs>> = candidates
            .iter()
            .map(|c| self.check(request, stage.key(c)))
            .collect();

        if extracted.iter().all(Option::is_none) {
            return MatchResult::NotMatched(self.rejection(request, stage, &candidates));
        }

        MatchResult::Matched(
            candidates
                .into_iter()
                .zip(extracted)
                .filter_map(|(mut candidate, args)| {
                    args.map(|args| {
                        candidate.push_args(args);
                        candidate
                    })
                })
                .collect(),
        )
    }
}
