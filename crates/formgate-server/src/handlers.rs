use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::gateway::GatewayError;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

/// Forwards a form request under the mount path to the CMS.
pub async fn forward_form(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let path = path_segments(&state.mount_path, request.uri().path());
    state.gateway.handle(request, &path).await
}

/// Splits the part of `path` below `mount_path` into raw segments.
fn path_segments(mount_path: &str, path: &str) -> Vec<String> {
    let rest = path.strip_prefix(mount_path).unwrap_or_default();
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Vec::new();
    }
    rest.split('/').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments() {
        let mount = "/_forms/v1/forms";
        assert!(path_segments(mount, "/_forms/v1/forms").is_empty());
        assert!(path_segments(mount, "/_forms/v1/forms/").is_empty());
        assert_eq!(path_segments(mount, "/_forms/v1/forms/abc"), vec!["abc"]);
        assert_eq!(
            path_segments(mount, "/_forms/v1/forms/abc/de%20f/"),
            vec!["abc", "de%20f", ""]
        );
    }
}
