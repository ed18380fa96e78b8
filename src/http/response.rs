//! Block responses.
//!
//! Every blocked request gets the same JSON envelope:
//! `{"error": "Blocked: <reason>"}` with the decision's status code.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::BlockReason;

#[derive(Debug, Serialize)]
pub struct BlockedBody {
    pub error: String,
}

impl BlockedBody {
    pub fn new(reason: &BlockReason) -> Self {
        Self {
            error: format!("Blocked: {reason}"),
        }
    }
}

/// Render a block decision.
pub fn blocked_response(reason: &BlockReason) -> Response {
    (reason.status(), Json(BlockedBody::new(reason))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_blocked_response_shape() {
        let response = blocked_response(&BlockReason::RateLimited);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Blocked: Rate Limit Exceeded"}));
    }
}
