use campus_session::{
    AppConfig,
    config::{DEFAULT_API_URL, DEFAULT_SESSION_FILE, Env},
};
use serial_test::serial;
use std::{env, panic, path::PathBuf, time::Duration};

const VARS: [&str; 4] = ["APP_ENV", "API_URL", "SESSION_FILE", "API_TIMEOUT_SECS"];

/// Runs `test` with the given variables set (and every other config variable
/// cleared), restoring the original environment afterwards.
fn with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    unsafe {
        for (key, original) in originals {
            match original {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

#[test]
#[serial]
fn test_production_requires_api_url() {
    let result = panic::catch_unwind(|| with_env(&[("APP_ENV", "production")], AppConfig::load));

    assert!(
        result.is_err(),
        "Production config loading should panic without API_URL"
    );
}

#[test]
#[serial]
fn test_local_defaults() {
    let config = with_env(&[], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn test_production_reads_explicit_settings() {
    let config = with_env(
        &[
            ("APP_ENV", "production"),
            ("API_URL", "https://events.example.edu/api/v1/"),
            ("SESSION_FILE", "/var/lib/campus/session.json"),
            ("API_TIMEOUT_SECS", "5"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    // Trailing slash is dropped so paths can be appended directly.
    assert_eq!(config.api_url, "https://events.example.edu/api/v1");
    assert_eq!(
        config.session_file,
        PathBuf::from("/var/lib/campus/session.json")
    );
    assert_eq!(config.request_timeout, Duration::from_secs(5));
}

#[test]
#[serial]
fn test_garbled_timeout_falls_back_to_default() {
    let config = with_env(&[("API_TIMEOUT_SECS", "soon")], AppConfig::load);

    assert_eq!(config.request_timeout, Duration::from_secs(30));
}
