use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Incoming IDs above this length are replaced rather than propagated
const MAX_REQUEST_ID_LEN: usize = 64;

/// A caller-supplied ID is reused only when it is short printable ASCII
fn usable_incoming_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

/// Tags every request with an ID, reusing a well-formed caller-supplied one.
///
/// The ID is placed in the request extensions, the task-local scope and the
/// response headers, and every span under the request carries it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| usable_incoming_id(v))
        .map(RequestId::new)
        .unwrap_or_default();

    // usable_incoming_id and the UUID fallback both guarantee a valid value
    let header_value = HeaderValue::from_str(request_id.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id"));
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    request
        .headers_mut()
        .insert(header_name.clone(), header_value.clone());
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response =
        crate::tracing::scope_request_id(request_id, async move { next.run(request).await })
            .instrument(span)
            .await;

    response.headers_mut().insert(header_name, header_value);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn extension_handler(Extension(request_id): Extension<RequestId>) -> (StatusCode, String) {
        (StatusCode::OK, request_id.as_str().to_string())
    }

    fn test_router() -> Router {
        Router::new()
            .route("/", get(extension_handler))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn response_id(request: HttpRequest<Body>) -> String {
        let response = test_router().oneshot(request).await.unwrap();
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("request id header")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn generates_an_id_when_none_is_supplied() {
        let id = response_id(
            HttpRequest::builder()
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn echoes_a_well_formed_caller_id() {
        let id = response_id(
            HttpRequest::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(id, "req-abc-123");
    }

    #[tokio::test]
    async fn replaces_an_oversized_caller_id() {
        let oversized = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let id = response_id(
            HttpRequest::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, oversized.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_ne!(id, oversized);
    }
}
