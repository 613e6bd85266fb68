//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (server)
//! - `COMANDA_HOST` - Bind address (default: 127.0.0.1)
//! - `COMANDA_PORT` - Listen port (default: 3000)
//! - `COMANDA_DATA_DIR` - Directory for the local key-value store (default: ./data)
//! - `COMANDA_POLL_INTERVAL_MS` - Remote order query interval (default: 2000)
//! - `COMANDA_LOG_JSON` - Emit JSON logs when set
//!
//! ## Optional (remote backend - both or neither)
//! - `FIREBASE_PROJECT_ID` - Firestore / Identity Toolkit project
//! - `FIREBASE_API_KEY` - Web API key
//!
//! Without them the service runs in local mode. A credentials override can
//! also be persisted through `PUT /api/backend`; see [`crate::backend`].
//!
//! ## Optional (menu extraction)
//! - `GEMINI_API_KEY` - Enables photo-to-menu extraction
//! - `GEMINI_MODEL` - Model ID (default: gemini-2.5-flash)
//!
//! ## Optional (error tracking)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory backing the local key-value store
    pub data_dir: PathBuf,
    /// How often remote order subscriptions re-run their query
    pub poll_interval: Duration,
    /// Remote backend credentials (local mode when `None`)
    pub firebase: Option<FirebaseConfig>,
    /// Menu extraction model (extraction disabled when `None`)
    pub gemini: Option<GeminiConfig>,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Remote backend (Firestore + Identity Toolkit) credentials.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Project ID
    pub project_id: String,
    /// Web API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Menu extraction model configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: SecretString,
    /// Model ID (e.g., gemini-2.5-flash)
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if only
    /// one of the two Firebase variables is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("COMANDA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("COMANDA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("COMANDA_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("COMANDA_PORT".to_string(), e.to_string()))?;
        let data_dir = PathBuf::from(get_env_or_default("COMANDA_DATA_DIR", "./data"));
        let poll_ms = get_optional_env("COMANDA_POLL_INTERVAL_MS")
            .map(|v| {
                v.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("COMANDA_POLL_INTERVAL_MS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let firebase = FirebaseConfig::from_env()?;
        let gemini = GeminiConfig::from_env();

        Ok(Self {
            host,
            port,
            data_dir,
            poll_interval: Duration::from_millis(poll_ms.max(100)),
            firebase,
            gemini,
            log_json: get_optional_env("COMANDA_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Local-mode configuration rooted at `data_dir`, with no remote
    /// backend, no extraction model and no error tracking.
    #[must_use]
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            data_dir: data_dir.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            firebase: None,
            gemini: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let project_id = get_optional_env("FIREBASE_PROJECT_ID");
        let api_key = get_optional_env("FIREBASE_API_KEY");

        match (project_id, api_key) {
            (Some(project_id), Some(api_key)) => {
                warn_if_weak(&api_key, "FIREBASE_API_KEY");
                Ok(Some(Self {
                    project_id,
                    api_key: SecretString::from(api_key),
                }))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("FIREBASE_API_KEY".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string())),
        }
    }
}

impl GeminiConfig {
    /// Returns `None` if `GEMINI_API_KEY` is not set (extraction disabled).
    fn from_env() -> Option<Self> {
        get_optional_env("GEMINI_API_KEY").map(|key| {
            warn_if_weak(&key, "GEMINI_API_KEY");
            Self {
                api_key: SecretString::from(key),
                model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            }
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn warn_if_weak(secret: &str, var_name: &str) {
    if let Err(reason) = check_secret_strength(secret) {
        tracing::warn!("{var_name} validation warning: {reason}");
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Check that an API key is not a placeholder and looks random enough.
fn check_secret_strength(secret: &str) -> Result<(), String> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < f64::EPSILON);
        assert!(shannon_entropy("AIzaSyD3x9Qk2LmN7pR4tV8wY1zB6cF0hJ5") > 3.3);
    }

    #[test]
    fn test_check_secret_strength() {
        assert!(check_secret_strength("your-api-key").is_err());
        assert!(check_secret_strength("aaaaaaaaaaaaaaaaaaaa").is_err());
        assert!(check_secret_strength("AIzaSyD3x9Qk2LmN7pR4tV8wY1zB6cF0hJ5").is_ok());
    }

    #[test]
    fn test_local_config() {
        let config = ServerConfig::local("/tmp/comanda");
        assert!(config.firebase.is_none());
        assert!(config.gemini.is_none());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/comanda"));

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_default_gemini_model() {
        assert_eq!(DEFAULT_GEMINI_MODEL, "gemini-2.5-flash");
    }

    #[test]
    fn test_firebase_config_debug_redacts_key() {
        let config = FirebaseConfig {
            project_id: "comanda-prod".to_string(),
            api_key: SecretString::from("AIza-super-secret"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("comanda-prod"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIza-super-secret"));
    }

    #[test]
    fn test_gemini_config_debug_redacts_key() {
        let config = GeminiConfig {
            api_key: SecretString::from("gem-secret-key"),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gemini-2.5-flash"));
        assert!(!debug_output.contains("gem-secret-key"));
    }
}
