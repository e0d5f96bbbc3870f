//! Sources of site definitions.

use async_trait::async_trait;

use crate::error::SiteQueryError;
use crate::types::SiteDefinition;

/// Read-only access to the full list of site definitions.
///
/// Implementations must return the current list on every call; the resolver
/// relies on this to pick up site changes without restarts.
///
/// # Example
///
/// ```ignore
/// use formgate_sites::{SiteSource, SiteQueryError, SiteDefinition};
///
/// async fn site_names(source: &dyn SiteSource) -> Result<Vec<String>, SiteQueryError> {
///     Ok(source.list_sites().await?.into_iter().map(|s| s.name).collect())
/// }
/// ```
#[async_trait]
pub trait SiteSource: Send + Sync {
    /// Lists all site definitions, in index order.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried.
    async fn list_sites(&self) -> Result<Vec<SiteDefinition>, SiteQueryError>;
}

/// A fixed list of sites, for deployments without a content index and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteSource {
    sites: Vec<SiteDefinition>,
}

impl StaticSiteSource {
    /// Creates a source that always returns `sites`.
    #[must_use]
    pub fn new(sites: Vec<SiteDefinition>) -> Self {
        Self { sites }
    }
}

#[async_trait]
impl SiteSource for StaticSiteSource {
    async fn list_sites(&self) -> Result<Vec<SiteDefinition>, SiteQueryError> {
        Ok(self.sites.clone())
    }
}
