//! Media type matching for the `Content-Type` header.
//!
//! A header such as `application/ld+json; charset=utf-8` is read as top-level
//! type `application`, subtype `ld` and suffixes `[json]`; parameters after `;`
//! are ignored and comparison is ASCII case-insensitive.
//!
//! A short token `T` matches when the subtype or any suffix equals `T`, which
//! covers `*/T`, `*/*+T`, `*/T+*` and `*/*+T+*`. A spec containing `/` matches
//! only that exact media type.

use super::{Candidate, RejectReason, Rule, RuleKey, RuleSpec};
use crate::dispatcher::PathArgs;
use crate::error::ConfigurationError;
use crate::router::StageView;
use crate::server::Request;

/// A parsed `Content-Type` value, borrowed from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType<'a> {
    top: &'a str,
    tail: &'a str,
}

impl<'a> MediaType<'a> {
    /// Parse a header value. Returns `None` for empty or slash-less values.
    ///
    /// ```
    /// use rulerouter::rules::MediaType;
    ///
    /// let mt = MediaType::parse("application/ld+json; charset=utf-8").unwrap();
    /// assert_eq!(mt.top(), "application");
    /// assert_eq!(mt.subtype(), "ld");
    /// assert_eq!(mt.suffixes().collect::<Vec<_>>(), ["json"]);
    /// ```
    #[must_use]
    pub fn parse(header: &'a str) -> Option<Self> {
        let essence = header.split(';').next().unwrap_or_default().trim();
        let (top, tail) = essence.split_once('/')?;
        let (top, tail) = (top.trim(), tail.trim());
        if top.is_empty() || tail.is_empty() {
            return None;
        }
        Some(Self { top, tail })
    }

    #[must_use]
    pub fn top(&self) -> &'a str {
        self.top
    }

    #[must_use]
    pub fn subtype(&self) -> &'a str {
        self.tail.split('+').next().unwrap_or_default()
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &'a str> {
        self.tail.split('+').skip(1)
    }

    /// Whether the subtype or any suffix equals `token`.
    #[must_use]
    pub fn has_component(&self, token: &str) -> bool {
        self.tail.split('+').any(|c| c.eq_ignore_ascii_case(token))
    }

    /// Whether `type/subtype+suffixes` equals `essence` (lowercase, no parameters).
    #[must_use]
    pub fn is(&self, essence: &str) -> bool {
        match essence.split_once('/') {
            Some((top, tail)) => {
                self.top.eq_ignore_ascii_case(top) && self.tail.eq_ignore_ascii_case(tail)
            }
            None => false,
        }
    }
}

/// Compiled content-type spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeSpec {
    /// Short token matched against subtype and suffixes, stored lowercase
    Token(String),
    /// Exact `type/subtype` essence, stored lowercase
    Exact(String),
}

impl MediaTypeSpec {
    #[must_use]
    pub fn matches(&self, media_type: &MediaType<'_>) -> bool {
        match self {
            MediaTypeSpec::Token(token) => media_type.has_component(token),
            MediaTypeSpec::Exact(essence) => media_type.is(essence),
        }
    }
}

/// Matches the request content type.
///
/// `Any` accepts every request, including one without a content type; a
/// request without a content type reaches nothing else. Rejects with
/// [`RejectReason::UnsupportedMediaType`] (415).
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeRule;

impl Rule for ContentTypeRule {
    fn name(&self) -> &str {
        "content_type"
    }

    fn configure(&self, spec: &RuleSpec) -> Result<RuleKey, ConfigurationError> {
        let text = match spec {
            RuleSpec::Any => return Ok(RuleKey::Any),
            RuleSpec::Token(text) => text,
            RuleSpec::Path(_) => {
                return Err(ConfigurationError::invalid_spec(
                    self.name(),
                    "expected a media type token, got a path pattern",
                ))
            }
        };

        let normalized = text.trim().to_ascii_lowercase();
        if normalized.contains('/') {
            let media_type = MediaType::parse(&normalized).ok_or_else(|| {
                ConfigurationError::invalid_spec(self.name(), format!("malformed media type {text:?}"))
            })?;
            let essence = format!("{}/{}", media_type.top(), media_type.tail);
            return Ok(RuleKey::MediaType(MediaTypeSpec::Exact(essence)));
        }
        if normalized.is_empty() || normalized.contains(['+', ';', ' ']) {
            return Err(ConfigurationError::invalid_spec(
                self.name(),
                format!("{text:?} is not a single media type token"),
            ));
        }
        Ok(RuleKey::MediaType(MediaTypeSpec::Token(normalized)))
    }

    fn check(&self, request: &Request, key: &RuleKey) -> Option<PathArgs> {
        let accepted = match key {
            RuleKey::Any => true,
            RuleKey::MediaType(spec) => request
                .content_type()
                .and_then(MediaType::parse)
                .is_some_and(|mt| spec.matches(&mt)),
            _ => false,
        };
        accepted.then(PathArgs::new)
    }

    fn rejection(&self, _: &Request, _: StageView<'_>, _: &[Candidate]) -> RejectReason {
        RejectReason::UnsupportedMediaType
    }

    /// An exact type overlaps a token it carries (`application/ld+json` and
    /// `json`). Distinct tokens are not reported even though a header such as
    /// `application/json+xml` would reach both.
    fn overlaps(&self, a: &RuleKey, b: &RuleKey) -> bool {
        let exact_has = |essence: &str, token: &str| {
            MediaType::parse(essence).is_some_and(|mt| mt.has_component(token))
        };
        match (a, b) {
            (
                RuleKey::MediaType(MediaTypeSpec::Exact(essence)),
                RuleKey::MediaType(MediaTypeSpec::Token(token)),
            )
            | (
                RuleKey::MediaType(MediaTypeSpec::Token(token)),
                RuleKey::MediaType(MediaTypeSpec::Exact(essence)),
            ) => exact_has(essence.as_str(), token.as_str()),
            _ => a.same_as(b) || matches!(a, RuleKey::Any) || matches!(b, RuleKey::Any),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn accepts(spec: &str, header: Option<&str>) -> bool {
        let rule = ContentTypeRule;
        let key = rule.configure(&RuleSpec::from(Some(spec))).unwrap();
        let mut req = Request::new(Method::POST, "/");
        if let Some(ct) = header {
            req = req.with_content_type(ct);
        }
        rule.check(&req, &key).is_some()
    }

    #[test]
    fn json_token_matches_subtype_and_suffixes() {
        assert!(accepts("json", Some("application/json")));
        assert!(accepts("json", Some("application/ld+json")));
        assert!(accepts("json", Some("application/json+patch")));
        assert!(accepts("json", Some("application/x+json+y")));
        assert!(!accepts("json", Some("text/plain")));
        assert!(!accepts("json", Some("application/jsonl")));
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert!(accepts("json", Some("Application/JSON; charset=utf-8")));
        assert!(accepts("application/json", Some("application/json;charset=utf-8")));
    }

    #[test]
    fn exact_media_type_needs_full_match() {
        assert!(accepts("application/json", Some("application/json")));
        assert!(!accepts("application/json", Some("application/ld+json")));
        assert!(!accepts("application/json", Some("text/json")));
    }

    #[test]
    fn missing_header_only_reaches_wildcard() {
        assert!(!accepts("json", None));
        let rule = ContentTypeRule;
        let any = rule.configure(&RuleSpec::Any).unwrap();
        assert!(rule.check(&Request::new(Method::GET, "/"), &any).is_some());
        let with_body = Request::new(Method::POST, "/").with_content_type("text/plain");
        assert!(rule.check(&with_body, &any).is_some());
    }

    #[test]
    fn malformed_header_matches_no_token() {
        assert!(!accepts("json", Some("json")));
        assert!(MediaType::parse("/json").is_none());
    }

    #[test]
    fn exact_type_overlaps_the_tokens_it_carries() {
        let rule = ContentTypeRule;
        let key = |spec: &str| rule.configure(&RuleSpec::token(spec)).unwrap();
        assert!(rule.overlaps(&key("application/ld+json"), &key("json")));
        assert!(rule.overlaps(&key("ld"), &key("Application/LD+JSON")));
        assert!(rule.overlaps(&key("json"), &RuleKey::Any));
        assert!(!rule.overlaps(&key("text/plain"), &key("json")));
        assert!(!rule.overlaps(&key("json"), &key("xml")));
        assert!(!rule.overlaps(&key("application/json"), &key("text/json")));
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let rule = ContentTypeRule;
        assert!(rule.configure(&RuleSpec::token("")).is_err());
        assert!(rule.configure(&RuleSpec::token("ld+json")).is_err());
        assert!(rule.configure(&RuleSpec::token("application/")).is_err());
    }
}
