//! Content graph client.
//!
//! Lists site definitions through the content graph's GraphQL endpoint,
//! authenticating with a single (read-only) key.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::SiteQueryError;
use crate::source::SiteSource;
use crate::types::{SiteDefinition, SiteDefinitionPage};

/// Default content graph endpoint.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://cg.optimizely.com/content/v2?cache=true&stored=false";

/// Query listing every site with its languages and hosts.
pub const GET_WEBSITES_QUERY: &str = r#"query getWebsites {
  SiteDefinition (where: {Id: { exist: true }}) {
    total
    items {
      Id
      Name
      Languages {
        IsMasterLanguage
        UrlSegment
        DisplayName
        Name
      }
      Hosts {
        Name
        Type
        Language {
          Link
          DisplayName
          Name
        }
      }
    }
  }
}"#;

/// Content graph connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// GraphQL endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Single key sent as `Authorization: epi-single <key>`.
    #[serde(default)]
    pub single_key: String,
}

fn default_endpoint() -> String {
    DEFAULT_GRAPH_ENDPOINT.to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            single_key: String::new(),
        }
    }
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("endpoint", &self.endpoint)
            .field("single_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct GraphRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphResponse {
    #[serde(default)]
    data: Option<WebsitesData>,
    #[serde(default)]
    errors: Option<Vec<GraphErrorMessage>>,
}

#[derive(Deserialize)]
struct WebsitesData {
    #[serde(rename = "SiteDefinition", default)]
    site_definition: Option<SiteDefinitionPage>,
}

#[derive(Deserialize)]
struct GraphErrorMessage {
    message: String,
}

/// GraphQL client for the content graph.
#[derive(Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    /// Creates a client with its own HTTP client.
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a client that issues requests through `http_client`.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, config: GraphConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Runs the `getWebsites` query.
    ///
    /// A response without a `SiteDefinition` field yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, an
    /// unparsable body, or GraphQL errors.
    pub async fn get_websites(&self) -> Result<SiteDefinitionPage, SiteQueryError> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, format!("epi-single {}", self.config.single_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&GraphRequest {
                query: GET_WEBSITES_QUERY,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Content graph request failed");
                SiteQueryError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteQueryError::HttpStatus(status.as_u16()));
        }

        let body: GraphResponse = response
            .json()
            .await
            .map_err(|e| SiteQueryError::Parse(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            return Err(SiteQueryError::GraphQl(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let page = body
            .data
            .and_then(|d| d.site_definition)
            .unwrap_or_default();

        tracing::debug!(total = page.total, sites = page.items.len(), "Loaded site definitions");

        Ok(page)
    }
}

#[async_trait]
impl SiteSource for GraphClient {
    async fn list_sites(&self) -> Result<Vec<SiteDefinition>, SiteQueryError> {
        Ok(self.get_websites().await?.items)
    }
}
