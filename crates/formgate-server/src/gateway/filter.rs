//! Pluggable request and header policies for the form proxy.

use async_trait::async_trait;
use axum::http::request::Parts;

/// Decides whether a form request may be forwarded.
///
/// Closures of the form `Fn(&Parts, &[String], Option<&[u8]>) -> bool` are
/// filters; implement the trait directly when the decision needs to await.
///
/// # Example
///
/// ```ignore
/// let gateway = ProxyGateway::builder()
///     .request_filter(|_: &Parts, path: &[String], _: Option<&[u8]>| {
///         path.first().map(String::as_str) != Some("internal")
///     })
///     .build()?;
/// ```
#[async_trait]
pub trait RequestFilter: Send + Sync {
    /// Returns `false` to reject the request with `400 Bad Request`.
    ///
    /// `body` is the buffered request body; it is `None` for `GET` requests
    /// and when the body could not be read.
    async fn allow(&self, request: &Parts, path: &[String], body: Option<&[u8]>) -> bool;
}

#[async_trait]
impl<F> RequestFilter for F
where
    F: Fn(&Parts, &[String], Option<&[u8]>) -> bool + Send + Sync,
{
    async fn allow(&self, request: &Parts, path: &[String], body: Option<&[u8]>) -> bool {
        self(request, path, body)
    }
}

/// Decides which inbound headers are forwarded to the CMS.
///
/// Called with the lowercase header name. `Fn(&str) -> bool` closures are
/// selectors.
pub trait HeaderSelector: Send + Sync {
    fn select(&self, name: &str) -> bool;
}

impl<F> HeaderSelector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn select(&self, name: &str) -> bool {
        self(name)
    }
}

/// The default header policy: a fixed deny-list plus the `x-` and `sec-`
/// prefixes.
///
/// Excluding every `x-` header keeps browsers from passing the edge
/// middleware's tenant headers through to the CMS.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaderSelector {
    extra: Vec<String>,
}

impl DefaultHeaderSelector {
    /// Header names never forwarded.
    pub const EXCLUDED: &'static [&'static str] =
        &["connection", "host", "upgrade-insecure-requests"];

    /// Header name prefixes never forwarded.
    pub const EXCLUDED_PREFIXES: &'static [&'static str] = &["x-", "sec-"];

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also excludes `names`, compared case-insensitively.
    #[must_use]
    pub fn with_excluded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl HeaderSelector for DefaultHeaderSelector {
    fn select(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        !(Self::EXCLUDED.contains(&name.as_str())
            || Self::EXCLUDED_PREFIXES.iter().any(|p| name.starts_with(p))
            || self.extra.iter().any(|e| *e == name))
    }
}
