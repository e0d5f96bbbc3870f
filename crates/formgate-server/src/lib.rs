pub mod config;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, FormsConfig, LoggingConfig, ServerConfig};
pub use gateway::{
    DefaultHeaderSelector, GatewayError, HeaderSelector, ProxyGateway, ProxyGatewayBuilder,
    RequestFilter,
};
pub use observability::init_tracing;
pub use server::{AppState, FormgateServer, GatewayCustomizer, ServerBuilder, build_app, router};
