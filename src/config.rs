use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Port used when `SERVER_PORT` is not provided.
pub const DEFAULT_SERVER_PORT: u16 = 8081;
/// Generator base URL used when `OLLAMA_URL` is not provided.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Model requested from the generator when `SUMMARY_MODEL` is not provided.
pub const DEFAULT_SUMMARY_MODEL: &str = "llama3.2";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the student registry server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Base URL of the text-generation service consulted for summaries.
    pub ollama_url: String,
    /// Model identifier sent with every generation request.
    pub summary_model: String,
    /// Optional upper bound on a single generation request.
    pub summary_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            summary_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_port: load_env_parsed("SERVER_PORT")?.unwrap_or(defaults.server_port),
            ollama_url: load_env_optional("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            summary_model: load_env_optional("SUMMARY_MODEL").unwrap_or(defaults.summary_model),
            summary_timeout_secs: load_env_parsed("SUMMARY_TIMEOUT_SECS")?,
        })
    }

    /// Timeout applied to generator requests, if one is configured.
    pub fn summary_timeout(&self) -> Option<Duration> {
        self.summary_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Fill the process environment from a `.env` file in the working directory or its parents.
///
/// Variables already set in the environment take precedence. Call this before
/// [`crate::logging::init_tracing`] so `RUST_LOG` and `STUDENT_REGISTRY_LOG_FILE` from the file
/// are honoured.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Fill the process environment from the dotenv file at `path`, if it can be read.
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    dotenvy::from_path(path).ok().map(|()| path.to_path_buf())
}

/// Load configuration from the environment, apply `overrides`, and install it in the global cache.
///
/// Expects [`load_dotenv`] to have run already.
///
/// The first successful call wins; later calls return the already installed configuration.
pub fn init_config<F>(overrides: F) -> Result<&'static Config, ConfigError>
where
    F: FnOnce(&mut Config),
{
    let mut config = Config::from_env()?;
    overrides(&mut config);
    tracing::debug!(
        server_port = config.server_port,
        ollama_url = %config.ollama_url,
        model = %config.summary_model,
        timeout_secs = ?config.summary_timeout_secs,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
