//! Routes and response mapping.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::header::{CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::limiter::{RateLimitConfig, client_identity};
use crate::types::ResourceKind;
use crate::{FetchPath, HuginnError};

const JSON: &str = "application/json";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Body returned when the upstream answers with a non-success status.
const UPSTREAM_REJECTED_MESSAGE: &str = "Cannot fetch the upstream API";

/// Build the router for `path`.
///
/// Every response, errors included, carries `Access-Control-Allow-Origin: *`.
pub fn router(path: Arc<FetchPath>) -> Router {
    Router::new()
        .route("/user/{id}", get(user))
        .route("/invite/{code}", get(invite))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(path)
}

async fn user(
    State(path): State<Arc<FetchPath>>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    let client = identify(&path, &request);
    respond(&path, ResourceKind::User, &id, client).await
}

async fn invite(
    State(path): State<Arc<FetchPath>>,
    Path(code): Path<String>,
    request: Request,
) -> Response {
    let client = identify(&path, &request);
    respond(&path, ResourceKind::Invite, &code, client).await
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
}

fn identify(path: &FetchPath, request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_identity(
        request.headers(),
        &path.limiter().config().identity_headers,
        peer,
    )
}

async fn respond(path: &FetchPath, kind: ResourceKind, key: &str, client: String) -> Response {
    // A key of the wrong shape means the route did not match; it is not
    // counted against the client.
    if kind.validate_key(key).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match path.handle(&client, kind, key).await {
        Ok(payload) => payload_response(payload),
        Err(e) => {
            debug!(%kind, key, client = %client, error = %e, "request failed");
            error_response(&e, path.limiter().config())
        }
    }
}

fn payload_response(payload: Bytes) -> Response {
    ([(CONTENT_TYPE, HeaderValue::from_static(JSON))], payload).into_response()
}

/// Map an error to the response sent to the client.
///
/// Rate-limit rejections use the configured status and message; upstream
/// rejections become 500, unreachable upstreams 502 and timeouts 504.
pub fn error_response(err: &HuginnError, rate_limit: &RateLimitConfig) -> Response {
    let (status, body) = match err {
        HuginnError::RateLimited { .. } => (rate_limit.status, rate_limit.message.clone()),
        HuginnError::UpstreamRejected { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            UPSTREAM_REJECTED_MESSAGE.to_string(),
        ),
        HuginnError::Unreachable(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        HuginnError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, err.to_string()),
        HuginnError::InvalidKey { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        HuginnError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };

    let mut response = (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT))],
        body,
    )
        .into_response();

    if let Some(retry_after) = err.retry_after() {
        // Round up so clients never retry inside the closed window.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(secs.max(1)));
    }
    response
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::to_bytes;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn rate_limited_uses_configured_status_and_message() {
        let config = RateLimitConfig::new()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .message("slow down");
        let response = error_response(
            &HuginnError::RateLimited {
                retry_after: Duration::from_millis(2500),
            },
            &config,
        );

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), PLAIN_TEXT);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "3");
        assert_eq!(body_text(response).await, "slow down");
    }

    #[tokio::test]
    async fn upstream_rejection_is_500_plain_text() {
        let response = error_response(
            &HuginnError::UpstreamRejected { status: 404 },
            &RateLimitConfig::default(),
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), PLAIN_TEXT);
        assert!(response.headers().get(RETRY_AFTER).is_none());
        assert_eq!(body_text(response).await, UPSTREAM_REJECTED_MESSAGE);
    }

    #[test]
    fn transport_failures_map_to_gateway_statuses() {
        let config = RateLimitConfig::default();
        assert_eq!(
            error_response(&HuginnError::Unreachable("refused".into()), &config).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_response(&HuginnError::Timeout(Duration::from_secs(1)), &config).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn payload_response_is_json() {
        let response = payload_response(Bytes::from_static(b"{}"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), JSON);
    }
}
