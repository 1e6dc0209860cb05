//! Tests for handler invocation through the router
//!
//! Covers:
//! - handlers receive the request and the extracted arguments
//! - a panicking handler becomes a 500 response and the router keeps working
//! - routing failures never reach a handler
//! - one router shared across threads

use http::Method;
use rulerouter::dispatcher::{HandlerResponse, PathArgs};
use rulerouter::router::Router;
use rulerouter::rules::{MethodRule, PathRule};
use rulerouter::server::Request;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_handler_sees_request_and_args() {
    let router = Router::builder()
        .rule(PathRule::new())
        .rule(MethodRule)
        .route(
            ["/pets/{int}/tag/{bool}".into(), "GET".into()],
            |req: &Request, args: &PathArgs| {
                HandlerResponse::json(
                    200,
                    json!({
                        "id": args.get::<i64>(0),
                        "tagged": args.get::<bool>(1),
                        "trace": req.get_header("x-trace"),
                    }),
                )
            },
        )
        .build()
        .unwrap();

    let request = Request::new(Method::GET, "/pets/9/tag/true").with_header("X-Trace", "abc");
    let res = router.dispatch(&request).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("content-type"), Some("application/json"));
    assert_eq!(res.body, json!({"id": 9, "tagged": true, "trace": "abc"}));
}

#[test]
fn test_panic_handler_returns_500() {
    let router = Router::builder()
        .rule(PathRule::new())
        .route(["/panic".into()], |_: &Request, _: &PathArgs| -> HandlerResponse {
            panic!("handler exploded")
        })
        .route(["/fine".into()], |_: &Request, _: &PathArgs| HandlerResponse::text(200, "fine"))
        .build()
        .unwrap();

    let res = router.dispatch(&Request::new(Method::GET, "/panic")).unwrap();
    assert_eq!(res.status, 500);
    assert_eq!(res.body["error"], "Handler panicked: handler exploded");

    let res = router.dispatch(&Request::new(Method::GET, "/fine")).unwrap();
    assert_eq!(res.status, 200);
}

#[test]
fn test_routing_failure_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let router = Router::builder()
        .rule(PathRule::new())
        .rule(MethodRule)
        .route(["/a".into(), "POST".into()], move |_: &Request, _: &PathArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            HandlerResponse::text(201, "created")
        })
        .build()
        .unwrap();

    assert!(router.dispatch(&Request::new(Method::GET, "/a")).is_err());
    assert!(router.dispatch(&Request::new(Method::POST, "/b")).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let res = router.dispatch(&Request::new(Method::POST, "/a")).unwrap();
    assert_eq!(res.status, 201);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_router_across_threads() {
    let router = Arc::new(
        Router::builder()
            .rule(PathRule::new())
            .route(["/echo/{str}".into()], |_: &Request, args: &PathArgs| {
                HandlerResponse::text(200, args.get::<String>(0).unwrap_or_default())
            })
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for i in 0..250 {
                    let word = format!("t{t}-{i}");
                    let res = router
                        .dispatch(&Request::new(Method::GET, format!("/echo/{word}")))
                        .unwrap();
                    assert_eq!(res.body, word.as_str());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
