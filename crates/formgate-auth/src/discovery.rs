//! OpenID Connect Discovery client and caching.
//!
//! The discovery document is fetched from `/.well-known/openid-configuration`,
//! resolved as an absolute path against the identity provider URL. Each
//! distinct provider URL is fetched once for the lifetime of the cache;
//! documents are never refreshed.
//!
//! - [`OidcDiscoveryClient`] - Fetches discovery documents from providers
//! - [`DiscoveryCache`] - Memoizes documents per provider URL, coalescing
//!   concurrent first requests

use url::Url;

use crate::cache::CoalescingCache;
use crate::error::DiscoveryError;
use crate::oidc::OidcConfiguration;

/// Well-known path of the discovery document.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Client for fetching OIDC discovery documents.
#[derive(Clone)]
pub struct OidcDiscoveryClient {
    http_client: reqwest::Client,
}

impl OidcDiscoveryClient {
    /// Creates a discovery client using the given HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Fetches the discovery document for `idp_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the request fails, the
    /// endpoint answers with a non-success status, or the body is not a
    /// discovery document.
    pub async fn discover(&self, idp_url: &str) -> Result<OidcConfiguration, DiscoveryError> {
        let discovery_url = build_discovery_url(idp_url)?;

        let response = self
            .http_client
            .get(discovery_url.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(idp_url = %idp_url, error = %e, "Failed to fetch OIDC discovery");
                DiscoveryError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let document: OidcConfiguration = response.json().await.map_err(|e| {
            tracing::warn!(idp_url = %idp_url, error = %e, "Failed to parse OIDC discovery document");
            DiscoveryError::Parse(e.to_string())
        })?;

        tracing::debug!(
            issuer = %document.issuer,
            "Discovered OIDC configuration"
        );

        Ok(document)
    }
}

/// Builds the discovery URL from a provider URL.
///
/// The well-known path is absolute, so any path on `idp_url` is replaced.
fn build_discovery_url(idp_url: &str) -> Result<Url, DiscoveryError> {
    let base = Url::parse(idp_url).map_err(|e| DiscoveryError::InvalidUrl(format!("{idp_url}: {e}")))?;
    base.join(DISCOVERY_PATH)
        .map_err(|e| DiscoveryError::InvalidUrl(format!("{idp_url}: {e}")))
}

/// Process-lifetime cache of discovery documents keyed by provider URL.
///
/// # Example
///
/// ```ignore
/// use formgate_auth::DiscoveryCache;
///
/// let cache = DiscoveryCache::new(reqwest::Client::new());
///
/// // First call fetches from the network, later calls are served from memory
/// let doc = cache.get("https://cms.example.com").await?;
/// println!("Token endpoint: {}", doc.token_endpoint);
/// ```
pub struct DiscoveryCache {
    client: OidcDiscoveryClient,
    documents: CoalescingCache<String, OidcConfiguration, DiscoveryError>,
}

impl DiscoveryCache {
    /// Creates an empty cache that fetches with the given HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            client: OidcDiscoveryClient::new(http_client),
            documents: CoalescingCache::new(),
        }
    }

    /// Gets the discovery document for `idp_url`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns the discovery error of the fetch this call joined.
    pub async fn get(&self, idp_url: &str) -> Result<OidcConfiguration, DiscoveryError> {
        let key = idp_url.to_string();
        let client = self.client.clone();
        let url = key.clone();

        self.documents
            .get_or_fetch(key, move || async move {
                tracing::debug!(idp_url = %url, "Fetching OIDC discovery document");
                client.discover(&url).await
            })
            .await
    }

    /// Forgets the cached document for `idp_url`.
    pub fn invalidate(&self, idp_url: &str) {
        self.documents.invalidate(&idp_url.to_string());
    }

    /// Returns the number of cached or in-flight documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if nothing has been fetched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
