use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// Application configuration loaded from environment variables.
/// Nothing is required: without `OPENAI_API_KEY` the fallback generator is used.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Default language hint for generated questions and replies.
    pub language: String,
    /// Directory holding `candidates.json` and `sessions.json`.
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            language: env_or("SCREENER_LANGUAGE", "English"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            port: parse_port(optional_env("PORT"))?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

/// Blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_port(raw: Option<String>) -> Result<u16> {
    match raw {
        Some(value) => value
            .parse::<u16>()
            .with_context(|| format!("PORT must be a valid port number, got '{value}'")),
        None => Ok(8080),
    }
}
