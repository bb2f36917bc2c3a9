use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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
/// Parsing and validation are decoupled from the process environment so they
/// can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let tei_url = require("NEWSRAG_TEI_URL")?;
    let llm_api_key = require("GROQ_API_KEY")?;

    let env = parse_environment(&or_default("NEWSRAG_ENV", "development"));
    let log_level = or_default("NEWSRAG_LOG_LEVEL", "info");

    let dump_dir = PathBuf::from(or_default("NEWSRAG_DUMP_DIR", "./dump"));
    let index_dir = PathBuf::from(or_default("NEWSRAG_INDEX_DIR", "./vector_store"));
    let dump_max_age_hours = parse_u64("NEWSRAG_DUMP_MAX_AGE_HOURS", "24")?;

    let embed_batch_size = parse_positive_usize("NEWSRAG_EMBED_BATCH_SIZE", "32")?;
    let max_chunk_words = parse_positive_usize("NEWSRAG_MAX_CHUNK_WORDS", "150")?;
    let top_k = parse_positive_usize("NEWSRAG_TOP_K", "5")?;

    let llm_base_url = or_default("NEWSRAG_LLM_BASE_URL", "https://api.groq.com/openai/v1");
    let llm_model = or_default("NEWSRAG_LLM_MODEL", "llama-3.1-8b-instant");
    let request_timeout_secs = parse_u64("NEWSRAG_REQUEST_TIMEOUT_SECS", "60")?;

    Ok(AppConfig {
        env,
        log_level,
        dump_dir,
        index_dir,
        dump_max_age_hours,
        tei_url,
        embed_batch_size,
        max_chunk_words,
        top_k,
        llm_api_key,
        llm_base_url,
        llm_model,
        request_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
