use anyhow::{Context, Result};
use dotenvy::dotenv;
use listing_eval::ProviderConfig;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./house_finder.db".to_string())
                .into(),
        })
    }

    /// Vision provider settings (`LLM_PROVIDER`, API keys, `OPENROUTER_MODEL`).
    ///
    /// Only the scoring command needs these.
    pub fn provider(&self) -> Result<ProviderConfig> {
        ProviderConfig::from_env().context("Invalid LLM provider configuration")
    }
}
