//! Form proxy: forwards browser form traffic to the CMS.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{
        HeaderMap, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_LENGTH, COOKIE},
    },
    response::Response,
};
use formgate_auth::TokenProvider;
use tracing::{debug, info, instrument, warn};
use url::{Url, form_urlencoded};

use super::error::GatewayError;
use super::filter::{DefaultHeaderSelector, HeaderSelector, RequestFilter};

/// Default CMS path prefix for form endpoints.
pub const DEFAULT_BASE_PATH: &str = "/_forms/v1/forms/";

/// Default `Authorization` values that request a server-side token.
pub const DEFAULT_ANONYMOUS_TOKENS: &[&str] = &["bearer undefined", "bearer "];

/// Forwards form requests to the CMS backend.
///
/// Browsers never hold CMS credentials: an anonymous sentinel in the
/// `Authorization` header is swapped for a client-credentials token before
/// the request leaves the proxy.
pub struct ProxyGateway {
    http_client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    backend_url: Url,
    base_path: String,
    anonymous_tokens: Vec<String>,
    hide_cookies: bool,
    request_filter: Option<Arc<dyn RequestFilter>>,
    header_selector: Arc<dyn HeaderSelector>,
    body_limit: usize,
}

impl ProxyGateway {
    #[must_use]
    pub fn builder() -> ProxyGatewayBuilder {
        ProxyGatewayBuilder::default()
    }

    /// Forwards `request` to `<backend><base_path><path joined by '/'>`.
    ///
    /// The upstream status, headers and body are returned unmodified, apart
    /// from hop-by-hop headers.
    ///
    /// # Errors
    ///
    /// - `Rejected` when the request filter refuses the request
    /// - `Auth` when a sentinel is present and no token can be obtained
    /// - `Upstream` when the CMS cannot be reached
    #[instrument(skip_all, fields(method = %request.method(), path = %path.join("/")))]
    pub async fn handle(
        &self,
        request: Request<Body>,
        path: &[String],
    ) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();

        if path.iter().any(|s| is_dot_segment(s)) {
            debug!("Rejecting dot segment in form path");
            return Err(GatewayError::Rejected);
        }

        let body = if parts.method == Method::GET {
            None
        } else {
            self.read_body(body).await
        };

        if let Some(filter) = &self.request_filter {
            if !filter.allow(&parts, path, body.as_deref()).await {
                info!("Request rejected by filter");
                return Err(GatewayError::Rejected);
            }
        }

        let headers = self.outbound_headers(&parts.headers).await?;
        let target_url = self.upstream_url(path, parts.uri.query());

        debug!(target_url = %target_url, "Proxying form request");

        let mut upstream = self
            .http_client
            .request(parts.method.clone(), target_url)
            .headers(headers);
        if let Some(body) = body {
            upstream = upstream.body(body);
        }

        let proxy_response = upstream.send().await.map_err(|e| {
            if e.is_connect() {
                GatewayError::Upstream(format!("Failed to connect to CMS: {e}"))
            } else {
                GatewayError::Upstream(format!("CMS request failed: {e}"))
            }
        })?;

        let status = proxy_response.status();
        info!(status = %status, "Form request forwarded");

        let mut response_builder = Response::builder().status(status);
        for (name, value) in proxy_response.headers() {
            if !is_hop_by_hop_header(name.as_str()) {
                response_builder = response_builder.header(name, value);
            }
        }

        response_builder
            .body(Body::from_stream(proxy_response.bytes_stream()))
            .map_err(|e| GatewayError::Internal(format!("Failed to build response: {e}")))
    }

    /// Buffers the request body once. A read failure forwards no body.
    async fn read_body(&self, body: Body) -> Option<Bytes> {
        match axum::body::to_bytes(body, self.body_limit).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to read request body, forwarding without body");
                None
            }
        }
    }

    /// Builds the header set sent to the CMS.
    pub(crate) async fn outbound_headers(
        &self,
        inbound: &HeaderMap,
    ) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();

        for (name, value) in inbound {
            if *name == AUTHORIZATION && self.is_anonymous(value) {
                let token = self.tokens.default_access_token().await?;
                let bearer = HeaderValue::from_str(&token.bearer()).map_err(|_| {
                    GatewayError::Internal("access token is not a valid header value".into())
                })?;
                headers.insert(AUTHORIZATION, bearer);
                continue;
            }

            if self.hide_cookies && *name == COOKIE {
                continue;
            }

            // The body is re-framed by the client
            if is_hop_by_hop_header(name.as_str()) || *name == CONTENT_LENGTH {
                continue;
            }

            if self.header_selector.select(name.as_str()) {
                headers.append(name.clone(), value.clone());
            } else {
                debug!(header = %name, "Skipping excluded header");
            }
        }

        Ok(headers)
    }

    /// Builds the CMS URL for `path`, keeping only non-empty query values.
    pub(crate) fn upstream_url(&self, path: &[String], query: Option<&str>) -> Url {
        let mut url = self.backend_url.clone();
        url.set_path(&format!("{}{}", self.base_path, path.join("/")));
        url.set_query(None);
        url.set_fragment(None);

        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in query
            .map(|q| form_urlencoded::parse(q.as_bytes()))
            .into_iter()
            .flatten()
        {
            if value.is_empty() {
                continue;
            }
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(pair) => pair.1 = value.into_owned(),
                None => pairs.push((key.into_owned(), value.into_owned())),
            }
        }

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        url
    }

    fn is_anonymous(&self, value: &HeaderValue) -> bool {
        let Ok(value) = value.to_str() else {
            return false;
        };
        // Trailing whitespace does not survive HTTP parsing, so "Bearer " arrives as "Bearer"
        let value = value.trim().to_ascii_lowercase();
        self.anonymous_tokens.iter().any(|t| *t == value)
    }
}

/// Builder for [`ProxyGateway`].
pub struct ProxyGatewayBuilder {
    http_client: Option<reqwest::Client>,
    tokens: Option<Arc<TokenProvider>>,
    backend_url: Option<Url>,
    base_path: String,
    anonymous_tokens: Vec<String>,
    hide_cookies: bool,
    request_filter: Option<Arc<dyn RequestFilter>>,
    header_selector: Arc<dyn HeaderSelector>,
    body_limit: usize,
}

impl Default for ProxyGatewayBuilder {
    fn default() -> Self {
        Self {
            http_client: None,
            tokens: None,
            backend_url: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            anonymous_tokens: DEFAULT_ANONYMOUS_TOKENS.iter().map(|t| t.to_string()).collect(),
            hide_cookies: false,
            request_filter: None,
            header_selector: Arc::new(DefaultHeaderSelector::new()),
            body_limit: 1024 * 1024,
        }
    }
}

impl ProxyGatewayBuilder {
    /// HTTP client used for upstream calls.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Token provider consulted when a sentinel is seen.
    #[must_use]
    pub fn token_provider(mut self, tokens: Arc<TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// CMS origin. Only scheme, host and port are used.
    #[must_use]
    pub fn backend_url(mut self, url: Url) -> Self {
        self.backend_url = Some(url);
        self
    }

    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Replaces the recognized anonymous sentinels. Matching ignores case.
    #[must_use]
    pub fn anonymous_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anonymous_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn hide_cookies(mut self, hide: bool) -> Self {
        self.hide_cookies = hide;
        self
    }

    #[must_use]
    pub fn request_filter(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.request_filter = Some(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn header_selector(mut self, selector: impl HeaderSelector + 'static) -> Self {
        self.header_selector = Arc::new(selector);
        self
    }

    /// Largest request body buffered before forwarding.
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` when the backend URL or token provider is
    /// missing, or the base path does not start with `/`.
    pub fn build(self) -> Result<ProxyGateway, GatewayError> {
        let backend_url = self
            .backend_url
            .ok_or_else(|| GatewayError::InvalidConfig("backend URL is required".into()))?;
        let tokens = self
            .tokens
            .ok_or_else(|| GatewayError::InvalidConfig("token provider is required".into()))?;
        if !self.base_path.starts_with('/') {
            return Err(GatewayError::InvalidConfig(format!(
                "base path must start with '/': {}",
                self.base_path
            )));
        }

        Ok(ProxyGateway {
            http_client: self.http_client.unwrap_or_default(),
            tokens,
            backend_url,
            base_path: self.base_path,
            anonymous_tokens: self
                .anonymous_tokens
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
            hide_cookies: self.hide_cookies,
            request_filter: self.request_filter,
            header_selector: self.header_selector,
            body_limit: self.body_limit,
        })
    }
}

/// Checks if a header is a hop-by-hop header that should not be forwarded.
///
/// Hop-by-hop headers are defined in RFC 2616 Section 13.5.1.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// `.` and `..` (plain or percent-encoded) would climb out of the base path.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_auth::ClientCredentialsConfig;

    fn gateway(builder: ProxyGatewayBuilder) -> ProxyGateway {
        builder
            .backend_url(Url::parse("https://cms.example.com/ignored/path?token=1").unwrap())
            .token_provider(Arc::new(TokenProvider::new(ClientCredentialsConfig::default())))
            .build()
            .unwrap()
    }

    fn segments(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_upstream_url() {
        let gw = gateway(ProxyGateway::builder());

        let url = gw.upstream_url(&segments(&["abc", "submit"]), None);
        assert_eq!(url.as_str(), "https://cms.example.com/_forms/v1/forms/abc/submit");

        let url = gw.upstream_url(&[], None);
        assert_eq!(url.as_str(), "https://cms.example.com/_forms/v1/forms/");
    }

    #[test]
    fn test_upstream_url_query_filtering() {
        let gw = gateway(ProxyGateway::builder());

        let url = gw.upstream_url(&segments(&["f"]), Some("language=en&empty=&step=2"));
        assert_eq!(url.query(), Some("language=en&step=2"));

        let url = gw.upstream_url(&segments(&["f"]), Some("empty=&other="));
        assert_eq!(url.query(), None);

        let url = gw.upstream_url(&segments(&["f"]), Some("a=1&a=&a=3"));
        assert_eq!(url.query(), Some("a=3"));
    }

    #[test]
    fn test_upstream_url_custom_base_path() {
        let gw = gateway(ProxyGateway::builder().base_path("/api/forms/"));
        let url = gw.upstream_url(&segments(&["x"]), Some("q=1"));
        assert_eq!(url.as_str(), "https://cms.example.com/api/forms/x?q=1");
    }

    #[test]
    fn test_anonymous_sentinels() {
        let gw = gateway(ProxyGateway::builder());
        for value in ["bearer undefined", "Bearer Undefined", "BEARER UNDEFINED", "Bearer ", "bearer"] {
            assert!(gw.is_anonymous(&HeaderValue::from_static(value)), "{value}");
        }
        for value in ["Bearer eyJhbGciOi", "Basic Zm9vOmJhcg==", "undefined"] {
            assert!(!gw.is_anonymous(&HeaderValue::from_static(value)), "{value}");
        }

        let gw = gateway(ProxyGateway::builder().anonymous_tokens(["Bearer anonymous"]));
        assert!(gw.is_anonymous(&HeaderValue::from_static("bearer ANONYMOUS")));
        assert!(!gw.is_anonymous(&HeaderValue::from_static("bearer undefined")));
    }

    #[tokio::test]
    async fn test_outbound_headers_default_policy() {
        let gw = gateway(ProxyGateway::builder());
        let mut inbound = HeaderMap::new();
        inbound.insert("accept", HeaderValue::from_static("application/json"));
        inbound.insert("authorization", HeaderValue::from_static("Bearer real"));
        inbound.insert("cookie", HeaderValue::from_static("a=b"));
        inbound.insert("host", HeaderValue::from_static("www.example.com"));
        inbound.insert("connection", HeaderValue::from_static("keep-alive"));
        inbound.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
        inbound.insert("x-siteid", HeaderValue::from_static("spoofed"));
        inbound.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        inbound.insert("content-length", HeaderValue::from_static("12"));

        let headers = gw.outbound_headers(&inbound).await.unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["authorization"], "Bearer real");
        assert_eq!(headers["cookie"], "a=b");
    }

    #[tokio::test]
    async fn test_outbound_headers_hide_cookies_and_custom_selector() {
        let gw = gateway(
            ProxyGateway::builder()
                .hide_cookies(true)
                .header_selector(|name: &str| name != "accept-language"),
        );
        let mut inbound = HeaderMap::new();
        inbound.insert("cookie", HeaderValue::from_static("session=1"));
        inbound.insert("accept-language", HeaderValue::from_static("fr"));
        inbound.insert("x-custom", HeaderValue::from_static("kept"));

        let headers = gw.outbound_headers(&inbound).await.unwrap();

        assert!(headers.get("cookie").is_none());
        assert!(headers.get("accept-language").is_none());
        assert_eq!(headers["x-custom"], "kept");
    }

    #[tokio::test]
    async fn test_sentinel_without_identity_provider_fails() {
        let gw = gateway(ProxyGateway::builder());
        let mut inbound = HeaderMap::new();
        inbound.insert("authorization", HeaderValue::from_static("Bearer undefined"));

        let result = gw.outbound_headers(&inbound).await;
        assert!(matches!(result, Err(GatewayError::Auth(_))));
    }

    #[tokio::test]
    async fn test_dot_segments_rejected() {
        let gw = gateway(ProxyGateway::builder());
        let request = Request::get("/").body(Body::empty()).unwrap();
        let result = gw.handle(request, &segments(&["..", "admin"])).await;
        assert!(matches!(result, Err(GatewayError::Rejected)));
    }

    #[test]
    fn test_is_hop_by_hop_header() {
        assert!(is_hop_by_hop_header("Connection"));
        assert!(is_hop_by_hop_header("Transfer-Encoding"));
        assert!(!is_hop_by_hop_header("Content-Type"));
        assert!(!is_hop_by_hop_header("Authorization"));
    }

    #[test]
    fn test_build_requires_backend_and_tokens() {
        assert!(matches!(
            ProxyGateway::builder().build(),
            Err(GatewayError::InvalidConfig(_))
        ));
        let result = ProxyGateway::builder()
            .backend_url(Url::parse("https://cms.example.com").unwrap())
            .token_provider(Arc::new(TokenProvider::new(ClientCredentialsConfig::default())))
            .base_path("forms")
            .build();
        assert!(matches!(result, Err(GatewayError::InvalidConfig(_))));
    }
}
