//! Typed path matching.
//!
//! A path spec is a sequence of literals and type tokens, e.g.
//! `["/id/", int, "/user/", str, "/create"]` or, as manifest text,
//! `/id/{int}/user/{str}/create`. Matching walks the request path left to
//! right: literals must match exactly, and each type token captures the text
//! up to the next literal (or to the end of the path) and converts it.
//!
//! A capture is rejected when it is empty, when it contains [`PATH_DELIMITER`]
//! (a token never spans more than one path component) or when conversion fails.
//! Rejection only eliminates that route.

use super::{Candidate, RejectReason, Rule, RuleKey, RuleSpec};
use crate::dispatcher::{PathArg, PathArgs};
use crate::error::ConfigurationError;
use crate::router::StageView;
use crate::server::Request;
use std::fmt;
use std::sync::Arc;

/// Separator between path components.
pub const PATH_DELIMITER: char = '/';

type ConvertFn = dyn Fn(&str) -> Option<PathArg> + Send + Sync;

/// Named conversion from raw path text to a [`PathArg`].
#[derive(Clone)]
pub struct Converter {
    name: Arc<str>,
    convert: Arc<ConvertFn>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// What a type token converts its capture into.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentType {
    /// Signed 64-bit integer (`-3`, `+3`, `42`)
    Int,
    /// 64-bit float
    Float,
    /// `true` or `false`
    Bool,
    /// The raw text
    Str,
    /// A user converter, identified by name
    Custom(Converter),
}

impl SegmentType {
    /// A named custom token.
    ///
    /// ```
    /// use rulerouter::dispatcher::PathArg;
    /// use rulerouter::rules::SegmentType;
    ///
    /// let hex = SegmentType::custom("hex", |raw| {
    ///     i64::from_str_radix(raw, 16).ok().map(PathArg::Int)
    /// });
    /// assert_eq!(hex.convert("ff"), Some(PathArg::Int(255)));
    /// assert_eq!(hex.convert("zz"), None);
    /// ```
    pub fn custom<F>(name: &str, convert: F) -> Self
    where
        F: Fn(&str) -> Option<PathArg> + Send + Sync + 'static,
    {
        SegmentType::Custom(Converter {
            name: Arc::from(name),
            convert: Arc::new(convert),
        })
    }

    /// Token name as written in pattern text (`int`, `float`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            SegmentType::Int => "int",
            SegmentType::Float => "float",
            SegmentType::Bool => "bool",
            SegmentType::Str => "str",
            SegmentType::Custom(c) => &c.name,
        }
    }

    #[must_use]
    pub fn convert(&self, raw: &str) -> Option<PathArg> {
        match self {
            SegmentType::Int => raw.parse().ok().map(PathArg::Int),
            SegmentType::Float => raw.parse().ok().map(PathArg::Float),
            SegmentType::Bool => raw.parse().ok().map(PathArg::Bool),
            SegmentType::Str => Some(PathArg::Str(raw.to_string())),
            SegmentType::Custom(c) => (c.convert)(raw),
        }
    }
}

/// One element of a path spec.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Typed(SegmentType),
}

impl Segment {
    pub const INT: Segment = Segment::Typed(SegmentType::Int);
    pub const FLOAT: Segment = Segment::Typed(SegmentType::Float);
    pub const BOOL: Segment = Segment::Typed(SegmentType::Bool);
    pub const STR: Segment = Segment::Typed(SegmentType::Str);
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Literal(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Literal(value)
    }
}

impl From<SegmentType> for Segment {
    fn from(value: SegmentType) -> Self {
        Segment::Typed(value)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Typed(ty) => write!(f, "{{{}}}", ty.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(String),
    Capture(SegmentType),
}

/// A compiled path spec: adjacent literals merged, no two captures adjacent.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    parts: Vec<Part>,
}

impl PathPattern {
    /// Compile a path spec.
    ///
    /// # Errors
    ///
    /// Returns a reason string when the spec is empty or has two type tokens
    /// with no literal between them.
    pub fn compile(segments: &[Segment]) -> Result<Self, String> {
        let mut parts: Vec<Part> = Vec::with_capacity(segments.len());
        for segment in segments {
            match (segment, parts.last_mut()) {
                (Segment::Literal(text), _) if text.is_empty() => {}
                (Segment::Literal(text), Some(Part::Literal(prev))) => prev.push_str(text),
                (Segment::Literal(text), _) => parts.push(Part::Literal(text.clone())),
                (Segment::Typed(ty), Some(Part::Capture(prev))) => {
                    return Err(format!(
                        "type tokens {{{}}} and {{{}}} must be separated by a literal",
                        prev.name(),
                        ty.name()
                    ));
                }
                (Segment::Typed(ty), _) => parts.push(Part::Capture(ty.clone())),
            }
        }
        if parts.is_empty() {
            return Err("path spec is empty".to_string());
        }
        Ok(Self { parts })
    }

    /// Number of type tokens, i.e. the number of arguments a match yields.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::Capture(_)))
            .count()
    }

    /// The full path text when the pattern has no type tokens.
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [Part::Literal(text)] => Some(text.as_str()),
            _ => None,
        }
    }

    /// Match `path` against the pattern, returning the converted captures.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathArgs> {
        let mut rest = path;
        let mut args = PathArgs::new();
        let mut parts = self.parts.iter().peekable();

        while let Some(part) = parts.next() {
            match part {
                Part::Literal(text) => rest = rest.strip_prefix(text.as_str())?,
                Part::Capture(ty) => {
                    let end = match parts.peek() {
                        Some(Part::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let raw = &rest[..end];
                    if raw.is_empty() || raw.contains(PATH_DELIMITER) {
                        return None;
                    }
                    args.push(ty.convert(raw)?);
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(args)
    }
}

/// Matches the request path and extracts typed arguments.
///
/// Rejects with [`RejectReason::NoPathMatch`] (404).
#[derive(Debug, Clone, Default)]
pub struct PathRule {
    converters: Vec<SegmentType>,
}

impl PathRule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a custom token available to [`Rule::parse_spec`] under its name.
    /// A converter named `int`, `float`, `bool` or `str` replaces the built-in.
    #[must_use]
    pub fn with_converter(mut self, converter: SegmentType) -> Self {
        self.converters.retain(|c| c.name() != converter.name());
        self.converters.push(converter);
        self
    }

    fn token(&self, name: &str) -> Option<SegmentType> {
        if let Some(converter) = self.converters.iter().find(|c| c.name() == name) {
            return Some(converter.clone());
        }
        match name {
            "int" => Some(SegmentType::Int),
            "float" => Some(SegmentType::Float),
            "bool" => Some(SegmentType::Bool),
            "str" => Some(SegmentType::Str),
            _ => None,
        }
    }
}

impl Rule for PathRule {
    fn name(&self) -> &str {
        "path"
    }

    /// Parse pattern text such as `/{int}/options`.
    fn parse_spec(&self, text: &str) -> Result<RuleSpec, ConfigurationError> {
        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::from(&rest[..open]));
            }
            let close = rest[open..].find('}').ok_or_else(|| {
                ConfigurationError::invalid_spec(self.name(), format!("unclosed '{{' in {text:?}"))
            })?;
            let name = rest[open + 1..open + close].trim();
            let ty = self.token(name).ok_or_else(|| {
                ConfigurationError::invalid_spec(self.name(), format!("unknown type token {{{name}}}"))
            })?;
            segments.push(Segment::Typed(ty));
            rest = &rest[open + close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::from(rest));
        }
        Ok(RuleSpec::Path(segments))
    }

    fn configure(&self, spec: &RuleSpec) -> Result<RuleKey, ConfigurationError> {
        let segments = match spec {
            RuleSpec::Path(segments) => segments.clone(),
            RuleSpec::Token(text) => match self.parse_spec(text)? {
                RuleSpec::Path(segments) => segments,
                _ => Vec::new(),
            },
            RuleSpec::Any => {
                return Err(ConfigurationError::invalid_spec(
                    self.name(),
                    "a path pattern is required",
                ))
            }
        };
        PathPattern::compile(&segments)
            .map(RuleKey::Path)
            .map_err(|reason| ConfigurationError::invalid_spec(self.name(), reason))
    }

    fn check(&self, request: &Request, key: &RuleKey) -> Option<PathArgs> {
        match key {
            RuleKey::Path(pattern) => pattern.matches(&request.path),
            _ => None,
        }
    }

    fn rejection(&self, _: &Request, _: StageView<'_>, _: &[Candidate]) -> RejectReason {
        RejectReason::NoPathMatch
    }

    /// Equal patterns overlap, and so does a capture-free path with any
    /// pattern that matches its text. Two distinct patterns with captures
    /// (`/{int}` and `/{str}`) are left to dispatch.
    fn overlaps(&self, a: &RuleKey, b: &RuleKey) -> bool {
        let (RuleKey::Path(a), RuleKey::Path(b)) = (a, b) else {
            return a.same_as(b);
        };
        a == b
            || a.literal().is_some_and(|path| b.matches(path).is_some())
            || b.literal().is_some_and(|path| a.matches(path).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(segments: Vec<Segment>) -> PathPattern {
        PathPattern::compile(&segments).unwrap()
    }

    #[test]
    fn options_pattern_extracts_int() {
        let p = pattern(vec!["/".into(), Segment::INT, "/options".into()]);
        assert_eq!(p.matches("/3/options").unwrap().get::<i64>(0), Some(3));
        assert!(p.matches("/x/options").is_none());
        assert!(p.matches("/3/options/").is_none());
        assert_eq!(p.arity(), 1);
    }

    #[test]
    fn multiple_tokens_keep_left_to_right_order() {
        let p = pattern(vec![
            "/id/".into(),
            Segment::INT,
            "/user/".into(),
            Segment::STR,
            "/create".into(),
        ]);
        let args = p.matches("/id/321/user/root/create").unwrap();
        assert_eq!(args.get::<i64>(0), Some(321));
        assert_eq!(args.get::<String>(1).as_deref(), Some("root"));
    }

    #[test]
    fn capture_never_spans_a_delimiter() {
        let p = pattern(vec!["/".into(), Segment::STR, "/foo".into()]);
        assert!(p.matches("/bar/foo").is_some());
        assert!(p.matches("/a/b/foo").is_none());

        let tail = pattern(vec!["/files/".into(), Segment::STR]);
        assert!(tail.matches("/files/readme").is_some());
        assert!(tail.matches("/files/docs/readme").is_none());
    }

    #[test]
    fn empty_segments_do_not_satisfy_tokens() {
        let p = pattern(vec!["/".into(), Segment::STR, "/foo".into()]);
        assert!(p.matches("//foo").is_none());
        let tail = pattern(vec!["/files/".into(), Segment::STR]);
        assert!(tail.matches("/files/").is_none());
    }

    #[test]
    fn trailing_slash_is_literal() {
        let p = pattern(vec!["/a".into()]);
        assert!(p.matches("/a").is_some());
        assert!(p.matches("/a/").is_none());
        let slash = pattern(vec!["/a/".into()]);
        assert!(slash.matches("/a/").is_some());
        assert!(slash.matches("/a").is_none());
    }

    #[test]
    fn token_may_end_inside_a_component() {
        let p = pattern(vec!["/user-".into(), Segment::INT, "-x".into()]);
        assert_eq!(p.matches("/user-3-x").unwrap().get::<i64>(0), Some(3));
    }

    #[test]
    fn adjacent_literals_merge() {
        assert_eq!(
            pattern(vec!["/a".into(), "/b".into()]),
            pattern(vec!["/a/b".into()])
        );
    }

    #[test]
    fn adjacent_tokens_and_empty_specs_are_rejected() {
        assert!(PathPattern::compile(&[Segment::INT, Segment::STR]).is_err());
        assert!(PathPattern::compile(&[]).is_err());
        assert!(PathPattern::compile(&["".into()]).is_err());
    }

    #[test]
    fn float_and_bool_tokens() {
        let p = pattern(vec!["/scale/".into(), Segment::FLOAT, "/".into(), Segment::BOOL]);
        let args = p.matches("/scale/0.5/true").unwrap();
        assert_eq!(args.get::<f64>(0), Some(0.5));
        assert_eq!(args.get::<bool>(1), Some(true));
        assert!(p.matches("/scale/0.5/yes").is_none());
    }

    #[test]
    fn parse_spec_reads_pattern_text() {
        let rule = PathRule::new();
        let spec = rule.parse_spec("/{int}/options").unwrap();
        assert_eq!(
            spec,
            RuleSpec::path(["/".into(), Segment::INT, "/options".into()])
        );
        assert_eq!(spec.to_string(), "/{int}/options");
    }

    #[test]
    fn parse_spec_rejects_unknown_and_unclosed_tokens() {
        let rule = PathRule::new();
        assert!(rule.parse_spec("/{uuid}").is_err());
        assert!(rule.parse_spec("/{int").is_err());
    }

    #[test]
    fn custom_converters_resolve_by_name() {
        let rule = PathRule::new().with_converter(SegmentType::custom("slug", |raw| {
            raw.chars()
                .all(|c| c.is_ascii_lowercase() || c == '-')
                .then(|| PathArg::Str(raw.to_string()))
        }));
        let key = rule.configure(&rule.parse_spec("/posts/{slug}").unwrap()).unwrap();
        let ok = Request::new(http::Method::GET, "/posts/hello-world");
        let bad = Request::new(http::Method::GET, "/posts/Hello");
        assert!(rule.check(&ok, &key).is_some());
        assert!(rule.check(&bad, &key).is_none());
    }

    #[test]
    fn custom_converter_shadows_builtin_token() {
        let rule = PathRule::new().with_converter(SegmentType::custom("int", |raw| {
            raw.strip_prefix('#')
                .and_then(|digits| digits.parse().ok())
                .map(PathArg::Int)
        }));
        let key = rule.configure(&RuleSpec::token("/n/{int}")).unwrap();
        let tagged = rule.check(&Request::new(http::Method::GET, "/n/#12"), &key);
        assert_eq!(tagged.unwrap().get::<i64>(0), Some(12));
        assert!(rule.check(&Request::new(http::Method::GET, "/n/12"), &key).is_none());

        let plain = PathRule::new().configure(&RuleSpec::token("/n/{int}")).unwrap();
        assert!(!key.same_as(&plain));
    }

    #[test]
    fn literal_paths_overlap_patterns_that_match_them() {
        let rule = PathRule::new();
        let key = |text: &str| rule.configure(&RuleSpec::token(text)).unwrap();
        assert_eq!(pattern(vec!["/a/b".into()]).literal(), Some("/a/b"));
        assert_eq!(pattern(vec!["/a/".into(), Segment::INT]).literal(), None);

        assert!(rule.overlaps(&key("/a"), &key("/a")));
        assert!(rule.overlaps(&key("/users/7"), &key("/users/{int}")));
        assert!(rule.overlaps(&key("/users/{str}"), &key("/users/me")));
        assert!(!rule.overlaps(&key("/users/me"), &key("/users/{int}")));
        assert!(!rule.overlaps(&key("/a"), &key("/b")));
        assert!(!rule.overlaps(&key("/{int}"), &key("/{str}")));
    }

    #[test]
    fn configure_accepts_pattern_tokens_and_rejects_any() {
        let rule = PathRule::new();
        let from_text = rule.configure(&RuleSpec::token("/{int}/options")).unwrap();
        let from_segments = rule
            .configure(&RuleSpec::path(["/".into(), Segment::INT, "/options".into()]))
            .unwrap();
        assert!(from_text.same_as(&from_segments));
        assert!(rule.configure(&RuleSpec::Any).is_err());
    }
}
