use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::corpus::CorpusPaths;

/// Application configuration loaded from environment variables.
/// Everything has a default; the API key is resolved lazily by `llm_client`.
#[derive(Debug, Clone)]
pub struct Config {
    pub processed_posts_path: PathBuf,
    pub raw_posts_path: PathBuf,
    pub secrets_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            processed_posts_path: env_path("PROCESSED_POSTS_PATH", "data/processed_posts.json"),
            raw_posts_path: env_path("RAW_POSTS_PATH", "data/raw_posts.json"),
            secrets_path: env_path("SECRETS_PATH", "secrets.json"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn corpus_paths(&self) -> CorpusPaths {
        CorpusPaths {
            processed: self.processed_posts_path.clone(),
            raw: self.raw_posts_path.clone(),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
