use std::time::Duration;

use anyhow::{Context, Result};
use bookscape_api::BreakerConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite path, or `:memory:`.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub breaker: BreakerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = BreakerConfig::default();

        let port = match lookup("BOOKSCAPE_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("BOOKSCAPE_PORT is not a valid port: {raw:?}"))?,
            None => 5000,
        };

        let failure_threshold = lookup("BOOKSCAPE_BREAKER_THRESHOLD")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.failure_threshold);
        let reset_timeout = lookup("BOOKSCAPE_BREAKER_RESET_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.reset_timeout);

        Ok(Self {
            database_url: lookup("BOOKSCAPE_DATABASE_URL").unwrap_or_else(|| "bookscape.db".into()),
            host: lookup("BOOKSCAPE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            breaker: BreakerConfig {
                failure_threshold,
                reset_timeout,
            },
        })
    }
}
