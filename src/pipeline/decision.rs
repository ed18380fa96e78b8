//! Admission decisions and reason codes.

use axum::http::StatusCode;
use std::fmt;

use crate::inspection::GraphqlViolation;
use crate::security::AccessDenial;
use crate::signatures::ThreatCategory;

/// Why a request was blocked. `Display` yields the reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Access(AccessDenial),
    RateLimited,
    RequestTooLarge,
    Threat(ThreatCategory),
    PayloadTooLarge,
    Graphql(GraphqlViolation),
    /// The body stream failed before it could be read in full.
    BodyUnreadable,
    /// A gate faulted while evaluating; the request is blocked.
    Internal,
}

impl BlockReason {
    pub fn status(&self) -> StatusCode {
        match self {
            BlockReason::Access(AccessDenial::InvalidApiKey) => StatusCode::UNAUTHORIZED,
            BlockReason::Access(_) => StatusCode::FORBIDDEN,
            BlockReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            BlockReason::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            BlockReason::Threat(_)
            | BlockReason::PayloadTooLarge
            | BlockReason::Graphql(_)
            | BlockReason::BodyUnreadable => StatusCode::BAD_REQUEST,
            BlockReason::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Low-cardinality label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            BlockReason::Access(AccessDenial::IpNotAllowed) => "ip_not_allowed",
            BlockReason::Access(AccessDenial::InvalidApiKey) => "invalid_api_key",
            BlockReason::Access(AccessDenial::SuspiciousUserAgent) => "suspicious_user_agent",
            BlockReason::RateLimited => "rate_limited",
            BlockReason::RequestTooLarge => "request_too_large",
            BlockReason::Threat(category) => category.label(),
            BlockReason::PayloadTooLarge => "payload_too_large",
            BlockReason::Graphql(violation) => violation.label(),
            BlockReason::BodyUnreadable => "body_unreadable",
            BlockReason::Internal => "internal",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Access(AccessDenial::IpNotAllowed) => f.write_str("IP Not Allowed"),
            BlockReason::Access(AccessDenial::InvalidApiKey) => {
                f.write_str("Invalid or Missing API Key")
            }
            BlockReason::Access(AccessDenial::SuspiciousUserAgent) => {
                f.write_str("Suspicious User Agent")
            }
            BlockReason::RateLimited => f.write_str("Rate Limit Exceeded"),
            BlockReason::RequestTooLarge => f.write_str("Request Too Large"),
            BlockReason::Threat(category) => f.write_str(category.reason()),
            BlockReason::PayloadTooLarge => f.write_str("Payload Too Large"),
            BlockReason::Graphql(violation) => violation.fmt(f),
            BlockReason::BodyUnreadable => f.write_str("Invalid Request Body"),
            BlockReason::Internal => f.write_str("Internal Inspection Error"),
        }
    }
}

/// Final verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block(BlockReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&BlockReason> {
        match self {
            Decision::Allow => None,
            Decision::Block(reason) => Some(reason),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Decision::Allow => StatusCode::OK,
            Decision::Block(reason) => reason.status(),
        }
    }

    /// Reason code as logged; "None" when admitted.
    pub fn reason_code(&self) -> String {
        match self {
            Decision::Allow => "None".to_string(),
            Decision::Block(reason) => reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (BlockReason::Access(AccessDenial::IpNotAllowed), 403),
            (BlockReason::Access(AccessDenial::InvalidApiKey), 401),
            (BlockReason::Access(AccessDenial::SuspiciousUserAgent), 403),
            (BlockReason::RateLimited, 429),
            (BlockReason::RequestTooLarge, 413),
            (BlockReason::Threat(ThreatCategory::SqlInjection), 400),
            (BlockReason::PayloadTooLarge, 400),
            (BlockReason::Graphql(GraphqlViolation::Introspection), 400),
            (BlockReason::BodyUnreadable, 400),
            (BlockReason::Internal, 500),
        ];
        for (reason, status) in cases {
            assert_eq!(reason.status().as_u16(), status, "{reason}");
        }
        assert_eq!(Decision::Allow.status(), StatusCode::OK);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(Decision::Allow.reason_code(), "None");
        assert_eq!(
            Decision::Block(BlockReason::RateLimited).reason_code(),
            "Rate Limit Exceeded"
        );
        assert_eq!(
            Decision::Block(BlockReason::Threat(ThreatCategory::CrossSiteScripting)).reason_code(),
            "XSS Attack"
        );
        assert_eq!(
            BlockReason::Graphql(GraphqlViolation::DepthExceeded { depth: 7, limit: 5 }).to_string(),
            "Query depth 7 exceeds limit 5"
        );
    }
}
