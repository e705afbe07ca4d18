//! Environment configuration for the scrape service

use crate::error::{Result, ScrapeError};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scraper settings loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub proxy_enabled: bool,
    pub proxy_rotation_enabled: bool,
    pub proxy_max_failures: u32,
    /// Raw `PROXY_LIST` entries, `scheme://host:port[:user:pass]`
    pub proxy_list: Vec<String>,
    pub headless: bool,
    pub timeout: Duration,
    pub user_agent: String,
    /// Wait used for `wait_for` selectors when a request sets none
    pub default_wait_time: Duration,
    pub max_retries: u32,
    pub drop_empty_records: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            proxy_enabled: true,
            proxy_rotation_enabled: true,
            proxy_max_failures: 3,
            proxy_list: Vec::new(),
            headless: false,
            timeout: Duration::from_millis(30_000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_wait_time: Duration::from_millis(5_000),
            max_retries: 3,
            drop_empty_records: false,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from the process environment, after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            proxy_enabled: flag(&lookup, "PROXY_ENABLED", defaults.proxy_enabled)?,
            proxy_rotation_enabled: flag(&lookup, "PROXY_ROTATION_ENABLED", defaults.proxy_rotation_enabled)?,
            proxy_max_failures: number(&lookup, "PROXY_MAX_FAILURES", defaults.proxy_max_failures)?,
            proxy_list: lookup("PROXY_LIST")
                .map(|list| list.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            headless: flag(&lookup, "HEADLESS", defaults.headless)?,
            timeout: Duration::from_millis(number(&lookup, "TIMEOUT", 30_000)?),
            user_agent: lookup("USER_AGENT").filter(|ua| !ua.trim().is_empty()).unwrap_or(defaults.user_agent),
            default_wait_time: Duration::from_millis(number(&lookup, "DEFAULT_WAIT_TIME", 5_000)?),
            max_retries: number(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            drop_empty_records: flag(&lookup, "DROP_EMPTY_RECORDS", defaults.drop_empty_records)?,
        })
    }
}

fn flag<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: bool) -> Result<bool> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(ScrapeError::Config(format!("{} must be a boolean, got '{}'", key, other))),
        },
    }
}

fn number<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ScrapeError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))),
    }
}
