use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header::HOST},
    middleware::Next,
    response::Response,
};
use formgate_sites::{ResolvedSite, SiteResolver};

// =============================================================================
// Site Context Middleware
// =============================================================================

pub const SITE_ID_HEADER: HeaderName = HeaderName::from_static("x-siteid");
pub const SITE_NAME_HEADER: HeaderName = HeaderName::from_static("x-sitename");
pub const DEFAULT_LOCALE_HEADER: HeaderName = HeaderName::from_static("x-defaultlocale");
pub const CURRENT_LOCALE_HEADER: HeaderName = HeaderName::from_static("x-currentlocale");

const SITE_HEADERS: [HeaderName; 4] = [
    SITE_ID_HEADER,
    SITE_NAME_HEADER,
    DEFAULT_LOCALE_HEADER,
    CURRENT_LOCALE_HEADER,
];

/// Resolves the tenant site for every request and exposes it downstream.
///
/// This middleware:
/// 1. Removes any inbound copies of the site headers
/// 2. Resolves the site from the request host and path
/// 3. Sets `x-siteId`, `x-siteName`, `x-defaultLocale` and `x-currentLocale`
///    for each value that is known, and stores the `ResolvedSite` in request
///    extensions
///
/// The request always proceeds, including when no site matches or the site
/// index cannot be queried.
pub async fn site_context(
    State(resolver): State<SiteResolver>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    for name in &SITE_HEADERS {
        req.headers_mut().remove(name);
    }

    let Some(host) = request_host(&req) else {
        tracing::debug!("No host on request, skipping site resolution");
        return next.run(req).await;
    };
    let path = req.uri().path().to_string();

    match resolver.resolve_by_host_and_path(&host, &path).await {
        Ok(Some(site)) => {
            apply_site_headers(req.headers_mut(), &site);
            req.extensions_mut().insert(site);
        }
        Ok(None) => {
            tracing::debug!(host = %host, "No site matches host");
        }
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "Site resolution failed");
        }
    }

    next.run(req).await
}

/// Host of the request, lowercased to match registered site host names.
fn request_host(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .map(|h| h.to_ascii_lowercase())
}

fn apply_site_headers(headers: &mut HeaderMap, site: &ResolvedSite) {
    let values = [
        (SITE_ID_HEADER, Some(site.site.id.as_str())),
        (SITE_NAME_HEADER, Some(site.site.name.as_str())),
        (DEFAULT_LOCALE_HEADER, site.default_locale.as_deref()),
        (CURRENT_LOCALE_HEADER, site.current_locale.as_deref()),
    ];

    for (name, value) in values {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(name, v);
            }
            Err(_) => tracing::debug!(header = %name, "Site value is not a valid header value"),
        }
    }
}
