use super::{Candidate, RejectReason, Rule, RuleKey, RuleSpec};
use crate::dispatcher::PathArgs;
use crate::error::ConfigurationError;
use crate::router::StageView;
use crate::server::Request;
use http::Method;

/// Matches the HTTP method, case-sensitively. `Any` accepts every method.
///
/// Rejects with [`RejectReason::MethodNotAllowed`] (405), listing the methods
/// the candidates entering this stage would have accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodRule;

impl Rule for MethodRule {
    fn name(&self) -> &str {
        "method"
    }

    fn configure(&self, spec: &RuleSpec) -> Result<RuleKey, ConfigurationError> {
        match spec {
            RuleSpec::Any => Ok(RuleKey::Any),
            RuleSpec::Token(name) => Method::from_bytes(name.as_bytes())
                .map(RuleKey::Method)
                .map_err(|_| {
                    ConfigurationError::invalid_spec(
                        self.name(),
                        format!("{name:?} is not an HTTP method token"),
                    )
                }),
            RuleSpec::Path(_) => Err(ConfigurationError::invalid_spec(
                self.name(),
                "expected a method name, got a path pattern",
            )),
        }
    }

    fn check(&self, request: &Request, key: &RuleKey) -> Option<PathArgs> {
        match key {
            RuleKey::Any => Some(PathArgs::new()),
            RuleKey::Method(method) if *method == request.method => Some(PathArgs::new()),
            _ => None,
        }
    }

    fn rejection(
        &self,
        _: &Request,
        stage: StageView<'_>,
        candidates: &[Candidate],
    ) -> RejectReason {
        let mut allowed: Vec<Method> = Vec::new();
        for candidate in candidates {
            if let RuleKey::Method(method) = stage.key(candidate) {
                if !allowed.contains(method) {
                    allowed.push(method.clone());
                }
            }
        }
        RejectReason::MethodNotAllowed { allowed }
    }
}
