use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.appannie.com/v1.2";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    // An empty value is as useless as a missing one for the key and URL.
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{raw}'"),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_key = require("ANNIE_API_KEY")?;

    let base_url = or_default("ANNIE_BASE_URL", DEFAULT_BASE_URL);
    if base_url.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "ANNIE_BASE_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let skip_apps = parse_id_list(&or_default("ANNIE_SKIP_APPS", ""));
    let run_report = parse_bool("ANNIE_RUN_REPORT", "true")?;
    let add_delay = parse_bool("ANNIE_ADD_DELAY", "false")?;
    let corrections_path = PathBuf::from(or_default(
        "ANNIE_CORRECTIONS_PATH",
        "./config/corrections.yaml",
    ));
    let output_dir = PathBuf::from(or_default("ANNIE_OUTPUT_DIR", "."));
    let request_timeout_secs = parse_u64("ANNIE_REQUEST_TIMEOUT_SECS", "30")?;
    let log_level = or_default("ANNIE_LOG_LEVEL", "info");

    Ok(AppConfig {
        api_key,
        base_url: base_url.trim().to_string(),
        skip_apps,
        run_report,
        add_delay,
        corrections_path,
        output_dir,
        request_timeout_secs,
        log_level,
    })
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated id list, dropping blanks.
fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
