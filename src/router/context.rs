use super::table::{RouteEntry, RouteTable};
use crate::rules::{Candidate, MatchResult, RejectReason, Rule, RuleKey, RuleSpec};
use crate::server::Request;

/// Read access to the route table for one rule stage.
#[derive(Debug, Clone, Copy)]
pub struct StageView<'a> {
    table: &'a RouteTable,
    stage: usize,
}

impl<'a> StageView<'a> {
    pub(crate) fn new(table: &'a RouteTable, stage: usize) -> Self {
        Self { table, stage }
    }

    /// Position of the current rule in the chain.
    #[must_use]
    pub fn index(&self) -> usize {
        self.stage
    }

    /// This stage's compiled key for `candidate`.
    #[must_use]
    pub fn key(&self, candidate: &Candidate) -> &'a RuleKey {
        self.table.key(candidate.entry(), self.stage)
    }

    /// This stage's spec for `candidate`, as registered.
    #[must_use]
    pub fn spec(&self, candidate: &Candidate) -> &'a RuleSpec {
        &self.table.route(candidate.entry()).key()[self.stage]
    }

    #[must_use]
    pub fn route(&self, candidate: &Candidate) -> &'a RouteEntry {
        self.table.route(candidate.entry())
    }
}

/// State of a single dispatch: the candidates still eligible and their
/// arguments. Owned by one call to [`Router::route`](super::Router::route).
#[derive(Debug)]
pub(crate) struct RoutingContext {
    candidates: Vec<Candidate>,
}

impl RoutingContext {
    pub(crate) fn new(table: &RouteTable) -> Self {
        Self {
            candidates: (0..table.len()).map(Candidate::new).collect(),
        }
    }

    /// Run one rule stage, keeping the survivors.
    ///
    /// An empty table reaches no rule: whatever the chain, the request is a 404.
    pub(crate) fn apply(
        &mut self,
        rule: &dyn Rule,
        request: &Request,
        stage: StageView<'_>,
    ) -> Result<(), RejectReason> {
        if self.candidates.is_empty() {
            return Err(RejectReason::NoPathMatch);
        }
        let entering = std::mem::take(&mut self.candidates);
        match rule.narrow(request, stage, entering) {
            MatchResult::Matched(survivors) if !survivors.is_empty() => {
                self.candidates = survivors;
                Ok(())
            }
            MatchResult::Matched(_) => Err(RejectReason::Other {
                status: http::StatusCode::NOT_FOUND,
                message: format!("rule '{}' left no candidates", rule.name()).into(),
            }),
            MatchResult::NotMatched(reason) => Err(reason),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }

    pub(crate) fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}
