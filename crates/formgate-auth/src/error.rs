//! Error types for discovery and token acquisition.
//!
//! Both enums are `Clone`: a single failed upstream fetch is handed to every
//! caller that was waiting on it.

/// Errors that can occur while fetching an OpenID Connect discovery document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The identity provider URL could not be parsed.
    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(String),

    /// A network error occurred while fetching the discovery document.
    #[error("Network error: {0}")]
    Network(String),

    /// The discovery endpoint returned a non-success status code.
    #[error("Unable to fetch OpenID Configuration: HTTP {status} - {reason}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase, if any.
        reason: String,
    },

    /// The discovery document could not be parsed as JSON.
    #[error("Failed to parse discovery document: {0}")]
    Parse(String),
}

/// Errors that can occur while acquiring an access token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The discovery document for the identity provider could not be obtained.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A network error occurred while calling the token endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint returned a non-success status without an OAuth error.
    #[error("Token endpoint returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The token endpoint reported an OAuth error, or the response was unusable.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// No identity provider is configured and none was supplied.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Creates an `Authentication` error from an OAuth error description.
    #[must_use]
    pub fn authentication(description: impl Into<String>) -> Self {
        Self::Authentication(description.into())
    }

    /// Returns `true` if the failure came from an external service rather
    /// than from local configuration.
    #[must_use]
    pub fn is_external_error(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}
