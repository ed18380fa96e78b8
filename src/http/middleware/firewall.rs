//! Firewall middleware.
//! Runs every request through the admission pipeline before any handler.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use std::net::SocketAddr;

use crate::http::response::blocked_response;
use crate::http::server::AppState;
use crate::pipeline::{BlockReason, Decision, RequestDescriptor};

const FORWARDED_FOR: &str = "x-forwarded-for";

pub async fn firewall_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(request.headers(), peer, state.trust_forwarded_for);

    let (parts, body) = request.into_parts();
    let mut descriptor = RequestDescriptor::builder(client, parts.method.clone(), parts.uri.path())
        .query(parts.uri.query().unwrap_or_default());
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            descriptor = descriptor.header(name.as_str(), value);
        }
    }

    // Oversized bodies are never buffered, but still pass the access and
    // rate-limit gates before the size gate rejects them.
    let limit = state.pipeline.max_body_bytes();
    let declared_len = parts
        .headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(len) = declared_len.filter(|len| *len > limit) {
        return evaluate_unbuffered(&state, descriptor.declared_len(len).build());
    }

    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) if exceeds_length_limit(&e) => {
            let descriptor = descriptor.declared_len(limit.saturating_add(1)).build();
            return evaluate_unbuffered(&state, descriptor);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request body could not be read");
            state
                .pipeline
                .reject(&descriptor.build(), BlockReason::BodyUnreadable);
            return blocked_response(&BlockReason::BodyUnreadable);
        }
    };

    let descriptor = descriptor.body(&bytes).build();
    let (decision, _) = state.pipeline.evaluate(&descriptor);
    match decision {
        Decision::Allow => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Decision::Block(reason) => blocked_response(&reason),
    }
}

/// Run the gates for a request whose body exceeds the limit.
fn evaluate_unbuffered(state: &AppState, descriptor: RequestDescriptor) -> Response {
    let (decision, _) = state.pipeline.evaluate(&descriptor);
    match decision.reason() {
        Some(reason) => blocked_response(reason),
        None => blocked_response(&BlockReason::RequestTooLarge),
    }
}

/// Whether buffering stopped because the body hit the size limit.
fn exceeds_length_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Identity used for allowlisting and rate limiting.
///
/// The peer IP, or the first `X-Forwarded-For` entry when `trust_forwarded`.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_identity_prefers_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();

        assert_eq!(client_identity(&headers, Some(peer), false), "192.0.2.1");
        assert_eq!(client_identity(&headers, Some(peer), true), "203.0.113.7");
        assert_eq!(client_identity(&HeaderMap::new(), Some(peer), true), "192.0.2.1");
        assert_eq!(client_identity(&HeaderMap::new(), None, false), "unknown");
    }

    #[tokio::test]
    async fn test_length_limit_is_told_apart_from_io_errors() {
        let err = axum::body::to_bytes(Body::from(vec![0u8; 32]), 16)
            .await
            .unwrap_err();
        assert!(exceeds_length_limit(&err));

        let reset = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "peer went away",
        ));
        assert!(!exceeds_length_limit(&reset));
    }
}
