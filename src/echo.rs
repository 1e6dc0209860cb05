use crate::dispatcher::{HandlerResponse, PathArgs};
use crate::server::Request;
use serde_json::json;

/// Example handler: echoes the dispatch back as JSON.
///
/// Used by the CLI for manifests whose handlers have no implementation.
pub fn echo_handler(
    name: &str,
) -> impl Fn(&Request, &PathArgs) -> HandlerResponse + Send + Sync + 'static {
    let name = name.to_string();
    move |req: &Request, args: &PathArgs| {
        HandlerResponse::json(
            200,
            json!({
                "handler": name,
                "method": req.method.as_str(),
                "path": req.path,
                "content_type": req.content_type,
                "args": args,
                "request_id": req.request_id,
            }),
        )
    }
}
