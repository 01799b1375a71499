use crate::app_config::{AppConfig, VehicleKind};
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://parallelum.com.br/fipe/api/v1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let api_base_url = or_default("INFOCARS_API_BASE_URL", DEFAULT_API_BASE_URL);
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "INFOCARS_API_BASE_URL",
            format!("'{api_base_url}' is not an http(s) URL"),
        ));
    }

    let vehicle_kind = or_default("INFOCARS_VEHICLE_KIND", "carros")
        .parse::<VehicleKind>()
        .map_err(|reason| invalid("INFOCARS_VEHICLE_KIND", reason))?;

    let bind_addr = or_default("INFOCARS_BIND_ADDR", "127.0.0.1:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("INFOCARS_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("INFOCARS_LOG_LEVEL", "info");

    let request_timeout_secs = match lookup("INFOCARS_REQUEST_TIMEOUT_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("INFOCARS_REQUEST_TIMEOUT_SECS", e.to_string()))?,
        ),
        Err(_) => None,
    };

    let user_agent = or_default("INFOCARS_USER_AGENT", "infocars/0.1 (vehicle-lookup)");

    Ok(AppConfig {
        api_base_url,
        vehicle_kind,
        bind_addr,
        log_level,
        request_timeout_secs,
        user_agent,
    })
}
