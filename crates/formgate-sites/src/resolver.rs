//! Host and path to tenant site resolution.
//!
//! Selection rules:
//!
//! 1. The first site with a host entry equal to the request host wins;
//!    otherwise the first site with a `*` host entry; otherwise no site.
//! 2. The master language is the language flagged as master, else the first.
//! 3. The request language is the one linked from the matching host entry
//!    (exact host first, then wildcard).
//! 4. The default locale is the request language, else the master language.
//! 5. Without a request language, the current locale comes from the first
//!    language whose URL segment prefixes the path (`/<segment>/`), else the
//!    master language. With a request language it equals the default locale.
//!
//! Every locale may end up absent; resolution never fails on data alone.

use std::sync::Arc;

use crate::error::SiteQueryError;
use crate::source::SiteSource;
use crate::types::{HostLanguage, SiteDefinition, SiteLanguage};

/// Outcome of a successful site match. Recomputed on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSite {
    /// The matched site.
    pub site: SiteDefinition,
    /// Locale implied by the host, or the site's master locale.
    pub default_locale: Option<String>,
    /// Locale of the current request.
    pub current_locale: Option<String>,
}

/// Resolves a site against an already loaded list of definitions.
#[must_use]
pub fn resolve(sites: &[SiteDefinition], host: &str, path: &str) -> Option<ResolvedSite> {
    let website = sites
        .iter()
        .find(|s| s.host(host).is_some())
        .or_else(|| sites.iter().find(|s| s.wildcard_host().is_some()))?;

    let master_locale = website.master_language().and_then(language_name);
    let request_locale = website
        .host(host)
        .or_else(|| website.wildcard_host())
        .and_then(|h| h.language.as_ref())
        .and_then(HostLanguage::locale);

    let default_locale = request_locale.or(master_locale);
    let current_locale = match request_locale {
        Some(_) => default_locale,
        None => website
            .languages
            .iter()
            .find(|l| matches_path_segment(l, path))
            .and_then(language_name)
            .or(master_locale),
    };

    Some(ResolvedSite {
        site: website.clone(),
        default_locale: default_locale.map(str::to_string),
        current_locale: current_locale.map(str::to_string),
    })
}

fn language_name(language: &SiteLanguage) -> Option<&str> {
    Some(language.name.as_str()).filter(|n| !n.is_empty())
}

fn matches_path_segment(language: &SiteLanguage, path: &str) -> bool {
    match language.url_segment.as_deref() {
        Some(segment) if !segment.is_empty() => path
            .strip_prefix('/')
            .and_then(|rest| rest.strip_prefix(segment))
            .is_some_and(|rest| rest.starts_with('/')),
        _ => false,
    }
}

/// Resolves tenant sites from a live [`SiteSource`].
#[derive(Clone)]
pub struct SiteResolver {
    source: Arc<dyn SiteSource>,
}

impl SiteResolver {
    /// Creates a resolver reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn SiteSource>) -> Self {
        Self { source }
    }

    /// Resolves the site and locales for an inbound host and path.
    ///
    /// Site definitions are re-queried on every call. `Ok(None)` means no site
    /// answers to `host`, not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error only if the site source cannot be queried.
    pub async fn resolve_by_host_and_path(
        &self,
        host: &str,
        path: &str,
    ) -> Result<Option<ResolvedSite>, SiteQueryError> {
        let sites = self.source.list_sites().await?;
        let resolved = resolve(&sites, host, path);

        match &resolved {
            Some(r) => tracing::trace!(
                host = %host,
                site_id = %r.site.id,
                current_locale = ?r.current_locale,
                "Resolved site"
            ),
            None => tracing::trace!(host = %host, "No site for host"),
        }

        Ok(resolved)
    }
}
