//! Content-index query errors.

/// Errors that can occur while listing site definitions.
#[derive(Debug, thiserror::Error)]
pub enum SiteQueryError {
    /// The content graph could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The content graph answered with a non-success status.
    #[error("Content graph returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body was not a valid GraphQL response.
    #[error("Failed to parse content graph response: {0}")]
    Parse(String),

    /// The GraphQL response carried errors.
    #[error("Content graph query failed: {}", .0.join("; "))]
    GraphQl(Vec<String>),
}
