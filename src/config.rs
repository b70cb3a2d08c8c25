use std::{env, path::PathBuf, time::Duration};

/// Hosted backend used when no `API_URL` is provided in a local environment.
pub const DEFAULT_API_URL: &str = "https://college-events-backend-j4bg.onrender.com/api/v1";

/// Default location of the durable session file, relative to the working directory.
pub const DEFAULT_SESSION_FILE: &str = ".campus-session.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// AppConfig
///
/// Holds the client's entire configuration state. Loaded once at startup and
/// handed to the API client and the storage backend; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the campus events REST API, without a trailing slash.
    pub api_url: String,
    // File backing the durable client storage (identity, credential, user id).
    pub session_file: PathBuf,
    // Upper bound on a single backend round trip.
    pub request_timeout: Duration,
    // Runtime environment marker. Controls the log format and fail-fast rules.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context: human-readable logs and lenient defaults locally,
/// JSON logs and mandatory settings in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests and scaffolding.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (`APP_ENV`, `API_URL`,
    /// `SESSION_FILE`, `API_TIMEOUT_SECS`).
    ///
    /// # Panics
    /// Panics in `Env::Production` when `API_URL` is not set, so a misconfigured
    /// deployment never silently talks to the wrong backend.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_url = match env {
            Env::Production => {
                env::var("API_URL").expect("FATAL: API_URL must be set in production.")
            }
            Env::Local => env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };

        let session_file = env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));

        // A garbled timeout falls back to the default rather than aborting startup.
        let request_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            session_file,
            request_timeout,
            env,
        }
    }
}
