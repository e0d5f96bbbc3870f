//! OpenID Connect discovery document.

use serde::{Deserialize, Serialize};

/// Provider metadata returned from `/.well-known/openid-configuration`.
///
/// Only the endpoints the proxy can make use of are modelled; unknown fields
/// are ignored. Providers that omit an optional endpoint still parse.
///
/// # Example
///
/// ```ignore
/// use formgate_auth::OidcConfiguration;
///
/// let json = r#"{
///     "issuer": "https://cms.example.com",
///     "token_endpoint": "https://cms.example.com/api/episerver/connect/token"
/// }"#;
///
/// let doc: OidcConfiguration = serde_json::from_str(json)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfiguration {
    /// URL that the provider asserts as its Issuer Identifier.
    pub issuer: String,

    /// URL of the provider's Token Endpoint.
    pub token_endpoint: String,

    /// URL of the provider's Authorization Endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// URL at the provider for RP-initiated logout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,

    /// URL of the provider's UserInfo Endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// URL of the provider's JSON Web Key Set document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
}
