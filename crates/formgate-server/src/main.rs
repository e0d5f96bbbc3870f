use std::env;
use std::process::ExitCode;

use formgate_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use formgate_server::{GatewayError, ServerBuilder, observability};

/// Where the config file path came from.
#[derive(Debug, Clone, Copy)]
enum ConfigOrigin {
    Flag,
    Env,
    Default,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flag => "--config",
            Self::Env => "FORMGATE_CONFIG",
            Self::Default => "default",
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("gateway setup failed: {0}")]
    Setup(#[from] GatewayError),
    #[error("server error: {0:#}")]
    Serve(anyhow::Error),
}

impl StartupError {
    /// 2 for anything that fails before the listener is up.
    fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Setup(_) => 2,
            Self::Serve(_) => 1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    observability::init_tracing();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "formgate stopped");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn start() -> Result<(), StartupError> {
    let (path, origin) = config_path();
    let cfg = load_config(Some(&path)).map_err(StartupError::Config)?;
    tracing::info!(path = %path, origin = %origin, "Configuration loaded");

    observability::apply_logging_level(&cfg.logging.level);

    tracing::info!(
        backend = cfg.cms.backend_url.as_deref().unwrap_or_default(),
        mount_path = %cfg.forms.mount_path,
        base_path = %cfg.forms.base_path,
        hide_cookies = cfg.forms.hide_cookies,
        "Form proxy configured"
    );

    let server = ServerBuilder::new().with_config(cfg).build()?;
    server.run().await.map_err(StartupError::Serve)
}

/// Reads `.env` when present. Its absence is normal.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => eprintln!("ignoring .env: {e}"),
    }
}

/// `--config <path>`, then `FORMGATE_CONFIG`, then `formgate.toml`.
fn config_path() -> (String, ConfigOrigin) {
    let args: Vec<String> = env::args().skip(1).collect();
    if let Some(path) = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone())
    {
        return (path, ConfigOrigin::Flag);
    }

    match env::var("FORMGATE_CONFIG") {
        Ok(path) if !path.is_empty() => (path, ConfigOrigin::Env),
        _ => (DEFAULT_CONFIG_PATH.to_string(), ConfigOrigin::Default),
    }
}
