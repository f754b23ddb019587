//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when the required ones are present
//! 2. Otherwise a config file, probed from several locations
//! 3. JSON and TOML are detected by extension
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `CONSENTFLOW_SUBSCRIPTION_ID`
//! - `CONSENTFLOW_RESOURCE_GROUP`
//!
//! Optional (defaults in parentheses):
//! - `CONSENTFLOW_API_VERSION` (`2018-07-01-preview`)
//! - `CONSENTFLOW_BASE_URL` (`https://management.azure.com`)
//! - `CONSENTFLOW_LOCATION`
//! - `CONSENTFLOW_REDIRECT_ORIGIN` (`https://localhost:4200`)
//! - `CONSENTFLOW_POPUP_WIDTH`, `CONSENTFLOW_POPUP_HEIGHT` (600)
//! - `CONSENTFLOW_POPUP_POLL_INTERVAL_MS` (1000)
//! - `CONSENTFLOW_POPUP_MAX_TICKS` (300)
//! - `CONSENTFLOW_HTTP_TIMEOUT_SECS` (30)
//! - `CONSENTFLOW_LOG_LEVEL` (`info`), `CONSENTFLOW_LOG_JSON` (false)
//!
//! ## File Locations
//! `consentflow.{toml,json}` then `config.{toml,json}`, looked up in the
//! working directory, its two parents, and the executable's directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use consentflow_domain::{ConsentConfig, ConsentError, Result};

const REQUIRED_ENV_VARS: [&str; 2] = ["CONSENTFLOW_SUBSCRIPTION_ID", "CONSENTFLOW_RESOURCE_GROUP"];

const CONFIG_FILE_NAMES: [&str; 4] =
    ["consentflow.toml", "consentflow.json", "config.toml", "config.json"];

/// Load configuration, preferring the environment over files.
///
/// Files are only consulted when a required variable is unset; an invalid
/// environment value is reported as is.
///
/// # Errors
/// Returns `ConsentError::Config` if the chosen source does not yield a
/// valid configuration.
pub fn load() -> Result<ConsentConfig> {
    let missing: Vec<&str> =
        REQUIRED_ENV_VARS.iter().copied().filter(|key| env_opt(key).is_none()).collect();

    if missing.is_empty() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!(?missing, "Required environment variables unset, trying file");
    load_from_file(None)
}

/// Load configuration from `CONSENTFLOW_*` environment variables.
///
/// # Errors
/// Returns `ConsentError::Config` if a required variable is missing or a
/// value does not parse.
pub fn load_from_env() -> Result<ConsentConfig> {
    let mut config = ConsentConfig::default();

    config.service.subscription_id = env_var("CONSENTFLOW_SUBSCRIPTION_ID")?;
    config.service.resource_group = env_var("CONSENTFLOW_RESOURCE_GROUP")?;
    if let Some(api_version) = env_opt("CONSENTFLOW_API_VERSION") {
        config.service.api_version = api_version;
    }
    if let Some(base_url) = env_opt("CONSENTFLOW_BASE_URL") {
        config.service.base_url = base_url;
    }
    if let Some(location) = env_opt("CONSENTFLOW_LOCATION") {
        config.service.location = location;
    }
    if let Some(origin) = env_opt("CONSENTFLOW_REDIRECT_ORIGIN") {
        config.redirect.origin = origin;
    }

    config.popup.width = env_parse("CONSENTFLOW_POPUP_WIDTH", config.popup.width)?;
    config.popup.height = env_parse("CONSENTFLOW_POPUP_HEIGHT", config.popup.height)?;
    config.popup.poll_interval_ms =
        env_parse("CONSENTFLOW_POPUP_POLL_INTERVAL_MS", config.popup.poll_interval_ms)?;
    config.popup.max_ticks = env_parse("CONSENTFLOW_POPUP_MAX_TICKS", config.popup.max_ticks)?;
    config.http.timeout_secs =
        env_parse("CONSENTFLOW_HTTP_TIMEOUT_SECS", config.http.timeout_secs)?;

    if let Some(level) = env_opt("CONSENTFLOW_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("CONSENTFLOW_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file.
///
/// With `None`, the first file found by [`probe_config_paths`] is used.
///
/// # Errors
/// Returns `ConsentError::Config` if the file is missing, unreadable,
/// malformed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ConsentConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConsentError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConsentError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConsentError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<ConsentConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConsentError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConsentError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ConsentError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        ConsentError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConsentError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
