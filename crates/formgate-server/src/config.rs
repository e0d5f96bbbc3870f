use formgate_auth::ClientCredentialsConfig;
use formgate_sites::GraphConfig;
use formgate_sites::graph::DEFAULT_GRAPH_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Environment variable holding the content graph single key.
pub const ENV_GRAPH_SINGLE_KEY: &str = "OPTIMIZELY_GRAPH_SINGLE_KEY";
/// Environment variable overriding the content graph endpoint.
pub const ENV_GRAPH_GATEWAY: &str = "OPTIMIZELY_GRAPH_GATEWAY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CMS origin, identity provider and client credentials
    #[serde(default)]
    pub cms: ClientCredentialsConfig,
    /// Form proxy options
    #[serde(default)]
    pub forms: FormsConfig,
    /// Content graph used for site resolution
    #[serde(default)]
    pub graph: GraphConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // CMS validation
        match self.cms.backend_url.as_deref() {
            None | Some("") => {
                return Err(format!(
                    "cms.backend_url is required (or set {})",
                    formgate_auth::config::ENV_CMS_URL
                ));
            }
            Some(url) => {
                url::Url::parse(url).map_err(|e| format!("cms.backend_url is invalid: {e}"))?;
            }
        }
        // Forms validation
        if !self.forms.base_path.starts_with('/') {
            return Err("forms.base_path must start with '/'".into());
        }
        let mount = &self.forms.mount_path;
        if !mount.starts_with('/') || mount.len() < 2 || mount.ends_with('/') {
            return Err("forms.mount_path must start with '/' and not end with '/'".into());
        }
        Ok(())
    }

    /// Fills settings left unset by the file and `FORMGATE__*` layers from the
    /// well-known CMS environment variables.
    pub fn apply_env_defaults(&mut self) {
        let env = ClientCredentialsConfig::from_env();
        self.cms.backend_url = non_empty(self.cms.backend_url.take()).or(env.backend_url);
        self.cms.client_id = non_empty(self.cms.client_id.take()).or(env.client_id);
        self.cms.client_secret = non_empty(self.cms.client_secret.take()).or(env.client_secret);

        if self.graph.single_key.is_empty() {
            if let Some(key) = env_var(ENV_GRAPH_SINGLE_KEY) {
                self.graph.single_key = key;
            }
        }
        if self.graph.endpoint == DEFAULT_GRAPH_ENDPOINT {
            if let Some(endpoint) = env_var(ENV_GRAPH_GATEWAY) {
                self.graph.endpoint = endpoint;
            }
        }
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest request body buffered for forwarding
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Options for the form proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Path prefix on the CMS that forwarded paths are appended to.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Inbound path the proxy answers under.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    /// `Authorization` values that ask for a server-side token.
    #[serde(default = "default_anonymous_tokens")]
    pub anonymous_tokens: Vec<String>,
    /// Drop the `cookie` header before forwarding.
    #[serde(default)]
    pub hide_cookies: bool,
    /// Header names never forwarded, on top of the built-in exclusions.
    #[serde(default)]
    pub excluded_headers: Vec<String>,
}

fn default_base_path() -> String {
    "/_forms/v1/forms/".to_string()
}
fn default_mount_path() -> String {
    "/_forms/v1/forms".to_string()
}
fn default_anonymous_tokens() -> Vec<String> {
    vec!["bearer undefined".to_string(), "bearer ".to_string()]
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            mount_path: default_mount_path(),
            anonymous_tokens: default_anonymous_tokens(),
            hide_cookies: false,
            excluded_headers: Vec::new(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, relative to the working directory.
    pub const DEFAULT_CONFIG_PATH: &str = "formgate.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., FORMGATE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("FORMGATE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let mut merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.apply_env_defaults();
        merged.validate()?;
        Ok(merged)
    }
}
