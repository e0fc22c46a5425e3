use anyhow::{Context, Result};

use crate::llm_client::{gemini, openai};

const DEFAULT_MAX_SESSIONS: usize = 256;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub openai_api_key: String,
    pub gemini_model: String,
    pub openai_model: String,
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub max_sessions: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", gemini::DEFAULT_MODEL),
            openai_model: env_or("OPENAI_MODEL", openai::DEFAULT_MODEL),
            gemini_base_url: env_or("GEMINI_BASE_URL", gemini::DEFAULT_BASE_URL),
            openai_base_url: env_or("OPENAI_BASE_URL", openai::DEFAULT_BASE_URL),
            max_sessions: std::env::var("MAX_SESSIONS")
                .unwrap_or_else(|_| DEFAULT_MAX_SESSIONS.to_string())
                .parse::<usize>()
                .context("MAX_SESSIONS must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
