use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlates log lines and responses for one request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Reuses the caller's `x-request-id` when it is a UUID, otherwise mints one
    fn from_request(request: &Request) -> Self {
        request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId)
            .unwrap_or_else(|| RequestId(Uuid::new_v4()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Stores a [`RequestId`] in the request extensions and echoes it in the response headers
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}

/// Span for `TraceLayer` carrying the request id and the route template that matched.
/// Requests that fell through to the fallback report `route = "unmatched"`.
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request.extensions().get::<RequestId>().copied();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");

    tracing::info_span!(
        "recommendation_request",
        method = %request.method(),
        route,
        path = request.uri().path(),
        request_id = ?request_id.map(|id| id.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_reuses_valid_header() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header(REQUEST_ID_HEADER.clone(), id.to_string())
            .body(Body::empty())
            .unwrap();

        assert_eq!(RequestId::from_request(&request), RequestId(id));
    }

    #[test]
    fn test_request_id_replaces_malformed_header() {
        let request = Request::builder()
            .header(REQUEST_ID_HEADER.clone(), "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        assert_ne!(RequestId::from_request(&request).to_string(), "not-a-uuid");
    }
}
