//! Proxy list and rotation

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use std::fmt;

/// One proxy endpoint with optional credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    /// `scheme://host:port`
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyEntry {
    /// Parse `scheme://host:port` or `scheme://host:port:user:pass`.
    ///
    /// More than two colons means the last two fields are credentials.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ScrapeError::Config("empty proxy entry".to_string()));
        }

        if raw.matches(':').count() <= 2 {
            return Ok(Self { server: raw.to_string(), username: None, password: None });
        }

        let mut parts = raw.rsplitn(3, ':');
        let password = parts.next().unwrap_or_default();
        let username = parts.next().unwrap_or_default();
        let server = parts.next().unwrap_or_default();
        if server.is_empty() || server.starts_with(':') {
            return Err(ScrapeError::Config(format!("malformed proxy entry '{}'", raw)));
        }

        Ok(Self {
            server: server.to_string(),
            username: Some(username.to_string()).filter(|u| !u.is_empty()),
            password: Some(password.to_string()).filter(|p| !p.is_empty()),
        })
    }

    /// Whether the proxy needs authentication
    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

// Credentials stay out of logs
impl fmt::Debug for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEntry")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Display for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.server)
    }
}

/// Round-robin proxy pool with a per-entry failure counter.
///
/// Entries that reached `max_failures` are skipped; once every entry is
/// excluded the pool yields nothing.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    entries: Vec<ProxyEntry>,
    failures: Vec<u32>,
    cursor: usize,
    max_failures: u32,
    rotation: bool,
}

impl ProxyPool {
    pub fn new(entries: Vec<ProxyEntry>, max_failures: u32) -> Self {
        let failures = vec![0; entries.len()];
        Self { entries, failures, cursor: 0, max_failures, rotation: true }
    }

    /// Build the pool described by the configuration; disabled proxies give an empty pool
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        if !config.proxy_enabled {
            log::info!("Proxy is disabled");
            return Ok(Self::default());
        }

        let entries = config.proxy_list.iter().map(|raw| ProxyEntry::parse(raw)).collect::<Result<Vec<_>>>()?;
        log::info!("Loaded {} proxies from configuration", entries.len());
        Ok(Self::new(entries, config.proxy_max_failures).rotation(config.proxy_rotation_enabled))
    }

    /// Builder method: rotate through entries, or keep using the first usable one
    pub fn rotation(mut self, rotation: bool) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failures recorded against `server`
    pub fn failures(&self, server: &str) -> u32 {
        self.position(server).map(|i| self.failures[i]).unwrap_or(0)
    }

    fn usable(&self, index: usize) -> bool {
        self.failures[index] < self.max_failures
    }

    fn position(&self, server: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.server == server)
    }

    /// The next usable proxy
    pub fn next_proxy(&mut self) -> Option<ProxyEntry> {
        if self.entries.is_empty() {
            return None;
        }

        if !self.rotation {
            return (0..self.entries.len()).find(|&i| self.usable(i)).map(|i| self.entries[i].clone());
        }

        for _ in 0..self.entries.len() {
            let index = self.cursor;
            self.cursor = (self.cursor + 1) % self.entries.len();
            if self.usable(index) {
                return Some(self.entries[index].clone());
            }
        }

        log::warn!("All {} proxies exceeded {} failures", self.entries.len(), self.max_failures);
        None
    }

    /// Count a failure against `server`
    pub fn mark_failed(&mut self, server: &str) {
        let Some(index) = self.position(server) else {
            return;
        };

        self.failures[index] += 1;
        log::warn!("Proxy {} marked as failed (failures: {})", server, self.failures[index]);
        if !self.usable(index) {
            log::warn!("Proxy {} excluded from rotation", server);
        }
    }
}
