//! Request correlation. Each request runs in a `request` span tagged with its
//! `x-request-id` and with the saved route or user the path refers to, so
//! planner and store logs can be traced back to a trip. The id is echoed on
//! the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{field, Instrument};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Route and user a request is about, when the URL names them.
#[derive(Debug, Default, PartialEq, Eq)]
struct Subjects<'a> {
    route_id: Option<&'a str>,
    user_id: Option<&'a str>,
}

/// `/v1/routes/{route_id}/..`, `/v1/users/{user_id}/..` and `?user_id=`.
fn subjects<'a>(path: &'a str, query: Option<&'a str>) -> Subjects<'a> {
    let mut found = Subjects::default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        match segment {
            "routes" => found.route_id = segments.next(),
            "users" => found.user_id = segments.next(),
            _ => {}
        }
    }
    if found.user_id.is_none() {
        found.user_id = query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .find_map(|pair| pair.strip_prefix("user_id="))
            .filter(|id| !id.is_empty());
    }
    found
}

fn incoming_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub async fn ensure_request_id(mut request: Request, next: Next) -> Response {
    let request_id =
        incoming_id(request.headers()).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!(
        "request",
        id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        route_id = field::Empty,
        user_id = field::Empty,
    );
    let found = subjects(request.uri().path(), request.uri().query());
    if let Some(route_id) = found.route_id {
        span.record("route_id", route_id);
    }
    if let Some(user_id) = found.user_id {
        span.record("user_id", user_id);
    }

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
