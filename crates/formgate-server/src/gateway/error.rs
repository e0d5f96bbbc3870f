//! Gateway-specific error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use formgate_auth::AuthError;
use serde_json::json;

/// Errors raised while forwarding a form request.
///
/// Only [`GatewayError::Rejected`] is a policy outcome; every other variant is
/// a fault and renders as an opaque body so no CMS detail reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request filter refused the request.
    #[error("Request rejected by filter")]
    Rejected,

    /// A server-side token could not be obtained.
    #[error("Token acquisition failed: {0}")]
    Auth(#[from] AuthError),

    /// The CMS could not be reached.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// Invalid gateway configuration.
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status returned to the caller.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(_) | Self::InvalidConfig(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::BAD_REQUEST => "Bad request",
            StatusCode::BAD_GATEWAY => "Bad gateway",
            _ => "Internal server error",
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Form request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: GatewayError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_rejected_is_bad_request() {
        let (status, body) = body_of(GatewayError::Rejected).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Bad request"}));
    }

    #[tokio::test]
    async fn test_faults_are_opaque() {
        let (status, body) =
            body_of(GatewayError::Auth(AuthError::authentication("invalid_client"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));

        let (status, body) =
            body_of(GatewayError::Upstream("connection refused to cms.internal".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "Bad gateway"}));
    }
}
