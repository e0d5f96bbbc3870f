use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use formgate_auth::TokenProvider;
use formgate_sites::{GraphClient, SiteResolver};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::gateway::{DefaultHeaderSelector, GatewayError, ProxyGateway, ProxyGatewayBuilder};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Programmatic gateway options applied on top of the configuration, such as
/// a request filter or header selector.
pub type GatewayCustomizer = Box<dyn FnOnce(ProxyGatewayBuilder) -> ProxyGatewayBuilder + Send>;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ProxyGateway>,
    pub resolver: SiteResolver,
    /// Inbound path the form proxy answers under
    pub mount_path: Arc<str>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, GatewayError> {
        Self::from_config_with(cfg, |builder| builder)
    }

    /// Builds state from configuration, letting `customize` adjust the gateway.
    pub fn from_config_with(
        cfg: &AppConfig,
        customize: impl FnOnce(ProxyGatewayBuilder) -> ProxyGatewayBuilder,
    ) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::new();

        let backend = cfg
            .cms
            .backend_url
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidConfig("cms.backend_url is required".into()))?;
        let backend_url = Url::parse(backend)
            .map_err(|e| GatewayError::InvalidConfig(format!("cms.backend_url: {e}")))?;

        let tokens = Arc::new(TokenProvider::with_client(
            http_client.clone(),
            cfg.cms.clone(),
        ));

        let builder = ProxyGateway::builder()
            .http_client(http_client.clone())
            .token_provider(tokens)
            .backend_url(backend_url)
            .base_path(cfg.forms.base_path.clone())
            .anonymous_tokens(cfg.forms.anonymous_tokens.clone())
            .hide_cookies(cfg.forms.hide_cookies)
            .header_selector(DefaultHeaderSelector::with_excluded(
                &cfg.forms.excluded_headers,
            ))
            .body_limit(cfg.server.body_limit_bytes);
        let gateway = customize(builder).build()?;

        let graph = GraphClient::with_client(http_client, cfg.graph.clone());

        Ok(Self {
            gateway: Arc::new(gateway),
            resolver: SiteResolver::new(Arc::new(graph)),
            mount_path: Arc::from(cfg.forms.mount_path.trim_end_matches('/')),
        })
    }
}

pub struct FormgateServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig) -> Result<Router, GatewayError> {
    Ok(router(AppState::from_config(cfg)?, cfg))
}

pub fn router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let mount = state.mount_path.to_string();

    Router::new()
        // Health endpoints
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Form proxy
        .route(
            &mount,
            get(handlers::forward_form).put(handlers::forward_form),
        )
        .route(
            &format!("{mount}/"),
            get(handlers::forward_form).put(handlers::forward_form),
        )
        .route(
            &format!("{mount}/{{*path}}"),
            get(handlers::forward_form).put(handlers::forward_form),
        )
        // Middleware stack (order: site context -> trace -> body limit)
        .layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            app_middleware::site_context,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    customize: Option<GatewayCustomizer>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            customize: None,
        }
    }

    #[must_use]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    #[must_use]
    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Adjusts the gateway beyond what configuration expresses.
    #[must_use]
    pub fn with_gateway<F>(mut self, customize: F) -> Self
    where
        F: FnOnce(ProxyGatewayBuilder) -> ProxyGatewayBuilder + Send + 'static,
    {
        self.customize = Some(Box::new(customize));
        self
    }

    pub fn build(self) -> Result<FormgateServer, GatewayError> {
        let state = match self.customize {
            Some(customize) => AppState::from_config_with(&self.config, customize)?,
            None => AppState::from_config(&self.config)?,
        };
        let app = router(state, &self.config);

        Ok(FormgateServer {
            addr: self.addr,
            app,
        })
    }
}

impl FormgateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.cms.backend_url = Some("http://127.0.0.1:9".into());
        cfg.graph.endpoint = "http://127.0.0.1:9/graph".into();
        cfg
    }

    #[tokio::test]
    async fn test_health_routes() {
        let app = build_app(&config()).unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_filter_from_builder_rejects() {
        let server = ServerBuilder::new()
            .with_config(config())
            .with_gateway(|b| {
                b.request_filter(|_: &axum::http::request::Parts, _: &[String], _: Option<&[u8]>| false)
            })
            .build()
            .unwrap();

        let response = server
            .app
            .oneshot(Request::get("/_forms/v1/forms/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_backend_is_config_error() {
        let cfg = AppConfig::default();
        assert!(matches!(
            AppState::from_config(&cfg),
            Err(GatewayError::InvalidConfig(_))
        ));
    }
}
