//! Default identity provider and client credentials.

use serde::{Deserialize, Serialize};

/// Environment variable holding the CMS origin (also the default IdP URL).
pub const ENV_CMS_URL: &str = "OPTIMIZELY_CMS_URL";
/// Environment variable holding the default client ID.
pub const ENV_CLIENT_ID: &str = "OPTIMIZELY_CMS_CLIENT_ID";
/// Environment variable holding the default client secret.
pub const ENV_CLIENT_SECRET: &str = "OPTIMIZELY_CMS_CLIENT_SECRET";

/// Defaults used when a token request omits the IdP URL or credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientCredentialsConfig {
    /// Identity provider URL. Falls back to `backend_url` when unset.
    #[serde(default)]
    pub idp_url: Option<String>,

    /// CMS origin.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// OAuth client ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsConfig")
            .field("idp_url", &self.idp_url)
            .field("backend_url", &self.backend_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ClientCredentialsConfig {
    /// Reads the defaults from the well-known CMS environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            idp_url: None,
            backend_url: non_empty_var(ENV_CMS_URL),
            client_id: non_empty_var(ENV_CLIENT_ID),
            client_secret: non_empty_var(ENV_CLIENT_SECRET),
        }
    }

    /// Returns the IdP URL to use when the caller supplies none.
    #[must_use]
    pub fn default_idp_url(&self) -> Option<&str> {
        self.idp_url.as_deref().or(self.backend_url.as_deref())
    }

    /// Returns the client ID, or an empty string when unset.
    #[must_use]
    pub fn default_client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or("")
    }

    /// Returns the client secret, or an empty string when unset.
    #[must_use]
    pub fn default_client_secret(&self) -> &str {
        self.client_secret.as_deref().unwrap_or("")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
