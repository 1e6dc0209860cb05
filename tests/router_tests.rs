//! Integration tests for rule-chain dispatch
//!
//! Exercises the public router surface with the built-in
//! `[path, method, content_type]` chain:
//! - typed argument extraction
//! - 404 / 405 / 415 selection by failing stage
//! - wildcard components
//! - construction-time validation

use http::{Method, StatusCode};
use rulerouter::dispatcher::{HandlerResponse, PathArgs};
use rulerouter::error::{ConfigurationError, DispatchError, RoutingError};
use rulerouter::router::{RouteEntry, Router};
use rulerouter::rules::{
    ContentTypeRule, MethodRule, PathRule, RuleSpec, Segment, SegmentType,
};
use rulerouter::server::Request;

fn ok(_: &Request, _: &PathArgs) -> HandlerResponse {
    HandlerResponse::text(200, "ok")
}

fn zoo_router() -> Router {
    Router::builder()
        .rule(PathRule::new())
        .rule(MethodRule)
        .rule(ContentTypeRule)
        .entry(RouteEntry::new(["/zoo/animals".into(), "GET".into(), RuleSpec::Any], ok).named("get_animals"))
        .entry(RouteEntry::new(["/zoo/animals".into(), "POST".into(), "json".into()], ok).named("create_animal"))
        .entry(RouteEntry::new(["/zoo/animals/{int}".into(), "GET".into(), RuleSpec::Any], ok).named("get_animal"))
        .entry(RouteEntry::new(["/zoo/animals/{int}".into(), "DELETE".into(), RuleSpec::Any], ok).named("delete_animal"))
        .entry(
            RouteEntry::new(["/zoo/animals/{int}/toys/{str}".into(), "GET".into(), RuleSpec::Any], ok)
                .named("animal_toy"),
        )
        .entry(RouteEntry::new(["/zoo/health".into(), RuleSpec::Any, RuleSpec::Any], ok).named("health"))
        .build()
        .unwrap()
}

fn assert_route(router: &Router, request: &Request, expected: &str) -> PathArgs {
    let matched = router
        .route(request)
        .unwrap_or_else(|e| panic!("{} {} failed: {e}", request.method, request.path));
    assert_eq!(matched.handler_name(), expected);
    matched.into_args()
}

fn status_of(router: &Router, request: &Request) -> StatusCode {
    router.route(request).unwrap_err().status()
}

#[test]
fn test_routes_and_args() {
    let router = zoo_router();
    assert_route(&router, &Request::new(Method::GET, "/zoo/animals"), "get_animals");

    let args = assert_route(&router, &Request::new(Method::GET, "/zoo/animals/42"), "get_animal");
    assert_eq!(args.get::<i64>(0), Some(42));

    let args = assert_route(
        &router,
        &Request::new(Method::GET, "/zoo/animals/-7/toys/ball"),
        "animal_toy",
    );
    assert_eq!(args.get::<i64>(0), Some(-7));
    assert_eq!(args.get::<String>(1).as_deref(), Some("ball"));
}

#[test]
fn test_query_string_is_not_part_of_the_path() {
    let router = zoo_router();
    let request = Request::from_parts("GET", "/zoo/animals/1?verbose=true", Vec::<(String, String)>::new())
        .unwrap();
    assert_route(&router, &request, "get_animal");
}

#[test]
fn test_failing_stage_picks_status() {
    let router = zoo_router();
    assert_eq!(
        status_of(&router, &Request::new(Method::GET, "/zoo/animals/abc")),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(&router, &Request::new(Method::PUT, "/zoo/animals/1")),
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
        status_of(
            &router,
            &Request::new(Method::POST, "/zoo/animals").with_content_type("text/csv")
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
}

#[test]
fn test_405_reports_allowed_methods() {
    let router = zoo_router();
    let err = router.route(&Request::new(Method::PATCH, "/zoo/animals/1")).unwrap_err();
    match err {
        DispatchError::Routing(RoutingError::MethodNotAllowed { method, allowed }) => {
            assert_eq!(method, Method::PATCH);
            assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_json_family_content_types() {
    let router = zoo_router();
    for ct in [
        "application/json",
        "application/ld+json",
        "application/json+patch",
        "application/x+json+y",
        "Application/JSON; charset=utf-8",
    ] {
        let request = Request::new(Method::POST, "/zoo/animals").with_content_type(ct);
        assert_route(&router, &request, "create_animal");
    }
    let no_ct = Request::new(Method::POST, "/zoo/animals");
    assert_eq!(status_of(&router, &no_ct), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn test_wildcard_route_accepts_any_method_and_content_type() {
    let router = zoo_router();
    for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::DELETE] {
        assert_route(&router, &Request::new(method, "/zoo/health"), "health");
    }
    let with_body = Request::new(Method::POST, "/zoo/health").with_content_type("text/plain");
    assert_route(&router, &with_body, "health");
}

#[test]
fn test_trailing_slash_is_a_different_path() {
    let router = zoo_router();
    assert_eq!(
        status_of(&router, &Request::new(Method::GET, "/zoo/animals/")),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_segment_specs_match_text_specs() {
    let router = Router::builder()
        .rule(PathRule::new())
        .rule(MethodRule)
        .route(
            [
                RuleSpec::path(["/id/".into(), Segment::INT, "/user/".into(), Segment::STR, "/create".into()]),
                "POST".into(),
            ],
            ok,
        )
        .build()
        .unwrap();
    let args = router
        .route(&Request::new(Method::POST, "/id/321/user/root/create"))
        .unwrap()
        .into_args();
    assert_eq!(args.get::<i64>(0), Some(321));
    assert_eq!(args.get::<String>(1).as_deref(), Some("root"));
}

#[test]
fn test_custom_converter() {
    let hex = SegmentType::custom("hex", |raw| {
        i64::from_str_radix(raw, 16).ok().map(rulerouter::dispatcher::PathArg::Int)
    });
    let router = Router::builder()
        .rule(PathRule::new().with_converter(hex))
        .route(["/color/{hex}".into()], ok)
        .build()
        .unwrap();

    let args = router
        .route(&Request::new(Method::GET, "/color/ff"))
        .unwrap()
        .into_args();
    assert_eq!(args.get::<i64>(0), Some(255));
    assert!(router.route(&Request::new(Method::GET, "/color/zz")).is_err());
}

#[test]
fn test_unknown_type_token_fails_construction() {
    let err = Router::builder()
        .rule(PathRule::new())
        .route(["/color/{hex}".into()], ok)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidSpec { ref rule, .. } if rule == "path"));
}

#[test]
fn test_adjacent_tokens_fail_construction() {
    let err = Router::builder()
        .rule(PathRule::new())
        .route([RuleSpec::path(["/".into(), Segment::INT, Segment::STR])], ok)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidSpec { .. }));
}

#[test]
fn test_wildcard_path_is_rejected() {
    let err = Router::builder()
        .rule(PathRule::new())
        .route([RuleSpec::Any], ok)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidSpec { .. }));
}
