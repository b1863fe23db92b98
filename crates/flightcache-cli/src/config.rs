use anyhow::{Context, Result};
use flightcache_analyzer::AnalyzerConfig;
use flightcache_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flight data file
    pub csv_path: PathBuf,
    /// Cache entry lifetime in seconds
    pub cache_ttl: u64,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    /// Per-command store timeout in milliseconds
    pub redis_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("flights.csv"),
            cache_ttl: 60,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            redis_timeout_ms: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load `.env`, then apply process environment overrides
    pub fn with_env(self) -> Result<Self> {
        // A missing .env file is normal
        dotenvy::dotenv().ok();
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("CSV_PATH") {
            self.csv_path = PathBuf::from(path);
        }
        if let Some(ttl) = parse_var(&lookup, "CACHE_TTL")? {
            self.cache_ttl = ttl;
        }
        if let Some(host) = lookup("REDIS_HOST") {
            self.redis_host = host;
        }
        if let Some(port) = parse_var(&lookup, "REDIS_PORT")? {
            self.redis_port = port;
        }
        if let Some(db) = parse_var(&lookup, "REDIS_DB")? {
            self.redis_db = db;
        }
        if let Some(timeout) = parse_var(&lookup, "REDIS_TIMEOUT_MS")? {
            self.redis_timeout_ms = Some(timeout);
        }
        Ok(self)
    }

    pub fn store_config(&self) -> StoreConfig {
        let config =
            StoreConfig::new(self.redis_host.clone(), self.redis_port).with_db(self.redis_db);
        match self.redis_timeout_ms {
            Some(ms) => config.with_command_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::new(self.cache_ttl)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", name, raw))
        })
        .transpose()
}
