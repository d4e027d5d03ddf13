use std::path::PathBuf;

use anyhow::Context;
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1/";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:dishes.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Root every dish resource and image path is resolved against.
    pub base_url: Url,
    pub database_url: String,
    pub bind_addr: String,
    /// JSON array of dishes loaded into an empty database.
    pub seed_file: Option<PathBuf>,
    pub allowed_origin: String,
    pub log_level: tracing::Level,
}

impl Config {
    /// Read the configuration from the process environment, after loading `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let base_url = lookup("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => level
                .parse()
                .with_context(|| format!("invalid LOG_LEVEL {level}"))?,
            None => tracing::Level::INFO,
        };

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            seed_file: lookup("SEED_FILE").map(PathBuf::from),
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            log_level,
        })
    }

    pub fn setup_logging(&self) -> anyhow::Result<()> {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(self.log_level)
            .with_ansi(true)
            .with_file(false)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;
        Ok(())
    }
}

/// Parse a base url, making sure relative joins land below it.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).with_context(|| format!("invalid base url {raw}"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("base url {raw} cannot hold resource paths");
    }
    Ok(url)
}
