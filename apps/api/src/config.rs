use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::planner::normalizer::NormalizeMode;

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub llm: LlmConfig,
    pub normalize_mode: NormalizeMode,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the generation client needs. Built once at startup and handed
/// to `LlmClient::new`.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    /// No timeout unless `LLM_TIMEOUT_SECS` is set.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let token_ttl_hours = optional_env("TOKEN_TTL_HOURS")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("TOKEN_TTL_HOURS must be an integer")?
            .unwrap_or(24);
        if token_ttl_hours <= 0 {
            bail!("TOKEN_TTL_HOURS must be positive");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            token_ttl_hours,
            llm: LlmConfig::from_env()?,
            normalize_mode: optional_env("PLAN_NORMALIZE_MODE")
                .map(|v| v.parse::<NormalizeMode>())
                .transpose()?
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl LlmConfig {
    fn from_env() -> Result<Self> {
        let temperature = optional_env("LLM_TEMPERATURE")
            .map(|v| v.parse::<f32>())
            .transpose()
            .context("LLM_TEMPERATURE must be a number")?;

        let timeout = optional_env("LLM_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?
            .map(Duration::from_secs);

        Ok(LlmConfig {
            api_url: optional_env("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            api_key: require_env("OPENAI_API_KEY")?,
            model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature,
            timeout,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and empty are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
