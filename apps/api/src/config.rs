use anyhow::{Context, Result};

use crate::forms::secret::DEFAULT_ITERATIONS;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: String,
    pub port: u16,
    pub rust_log: String,
    /// Work factor for the secret field transform.
    pub hash_iterations: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            hash_iterations: std::env::var("HASH_ITERATIONS")
                .unwrap_or_else(|_| DEFAULT_ITERATIONS.to_string())
                .parse::<u32>()
                .context("HASH_ITERATIONS must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
