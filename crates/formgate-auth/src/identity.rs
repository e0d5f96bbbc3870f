//! Anonymous identity handed to server-rendered form clients.

use serde::Serialize;

use crate::error::AuthError;
use crate::token::TokenProvider;

/// Username reported for visitors authenticated server-to-server.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// Identity payload understood by the forms client.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousIdentity {
    /// Bearer token obtained with the default credentials.
    pub access_token: String,
    /// Always [`ANONYMOUS_USERNAME`].
    pub username: String,
}

impl std::fmt::Debug for AnonymousIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymousIdentity")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Builds an anonymous identity from the provider's default credentials.
///
/// # Errors
///
/// Propagates any token acquisition failure.
pub async fn anonymous_identity(provider: &TokenProvider) -> Result<AnonymousIdentity, AuthError> {
    let token = provider.default_access_token().await?;
    Ok(AnonymousIdentity {
        access_token: token.secret().to_string(),
        username: ANONYMOUS_USERNAME.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientCredentialsConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_anonymous_identity() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": base,
                "token_endpoint": format!("{base}/connect/token"),
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "anon"})),
            )
            .mount(&server)
            .await;

        let provider = TokenProvider::new(ClientCredentialsConfig {
            backend_url: Some(base),
            ..Default::default()
        });

        let identity = anonymous_identity(&provider).await.unwrap();
        assert_eq!(identity.username, "Anonymous");
        assert_eq!(identity.access_token, "anon");

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["accessToken"], "anon");
    }
}
