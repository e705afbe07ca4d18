use crate::browser::{config::LaunchOptions, proxy::{ProxyEntry, ProxyPool}, session::BrowserSession};
use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::scrape::{ScrapeRequest, ScrapeResponse};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Runs scrape requests, one fresh browser session per attempt.
///
/// Session failures (launch, navigation, timeouts) are retried up to
/// `max_retries` times, each time counting a failure against the pool
/// proxy that was used.
pub struct ScrapeService {
    config: ScraperConfig,
    launch: LaunchOptions,
    pool: Mutex<ProxyPool>,
}

impl ScrapeService {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let pool = ProxyPool::from_config(&config)?;
        Ok(Self { launch: LaunchOptions::from_config(&config), config, pool: Mutex::new(pool) })
    }

    /// Service configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ScraperConfig::from_env()?)
    }

    /// Builder method: override the browser launch options (the proxy is still chosen per attempt)
    pub fn with_launch_options(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Proxy for one attempt and whether it came from the pool
    fn select_proxy(&self, request: &ScrapeRequest) -> Result<(Option<ProxyEntry>, bool)> {
        if let Some(pinned) = &request.proxy_url {
            return ProxyEntry::parse(pinned)
                .map(|entry| (Some(entry), false))
                .map_err(|e| ScrapeError::InvalidRequest(format!("proxy_url: {}", e)));
        }
        if !request.use_proxy {
            return Ok((None, false));
        }

        let proxy = self.pool.lock().unwrap_or_else(PoisonError::into_inner).next_proxy();
        if proxy.is_none() {
            log::info!("No proxy available, running without proxy");
        }
        Ok((proxy, true))
    }

    fn attempt(&self, request: &ScrapeRequest, proxy: Option<ProxyEntry>) -> Result<ScrapeResponse> {
        let session = BrowserSession::launch(self.launch.clone().proxy(proxy))?;
        session.scrape(request, self.config.drop_empty_records)
    }

    /// Scrape one page; failures are reported in the response, never returned
    pub fn scrape(&self, request: &ScrapeRequest) -> ScrapeResponse {
        let started = Instant::now();
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let (proxy, pooled) = match self.select_proxy(request) {
                Ok(selection) => selection,
                Err(e) => return ScrapeResponse::failed(request.url.clone(), e, started.elapsed()),
            };
            let server = proxy.as_ref().map(|p| p.server.clone());

            match self.attempt(request, proxy) {
                Ok(mut response) => {
                    response.load_time = started.elapsed().as_secs_f64();
                    return response;
                }
                Err(e) if e.is_session_failure() => {
                    log::warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, request.url, e);
                    if let (Some(server), true) = (server, pooled) {
                        self.pool.lock().unwrap_or_else(PoisonError::into_inner).mark_failed(&server);
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    log::error!("Scraping {} failed: {}", request.url, e);
                    return ScrapeResponse::failed(request.url.clone(), e, started.elapsed());
                }
            }
        }

        let error = last_error.unwrap_or_else(|| ScrapeError::NavigationFailed("no attempt was made".to_string()));
        ScrapeResponse::failed(request.url.clone(), error, started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(proxies: &[&str]) -> ScrapeService {
        let config = ScraperConfig {
            proxy_list: proxies.iter().map(|p| p.to_string()).collect(),
            ..ScraperConfig::default()
        };
        ScrapeService::new(config).unwrap()
    }

    #[test]
    fn test_pinned_proxy_wins() {
        let service = service(&["http://pool:1"]);
        let mut request = ScrapeRequest::new("https://example.com");
        request.proxy_url = Some("http://pinned:2:bob:pw".into());

        let (proxy, pooled) = service.select_proxy(&request).unwrap();
        let proxy = proxy.unwrap();
        assert_eq!(proxy.server, "http://pinned:2");
        assert_eq!(proxy.username.as_deref(), Some("bob"));
        assert!(!pooled);
    }

    #[test]
    fn test_pool_and_opt_out() {
        let service = service(&["http://pool:1"]);
        let request = ScrapeRequest::new("https://example.com");
        let (proxy, pooled) = service.select_proxy(&request).unwrap();
        assert_eq!(proxy.unwrap().server, "http://pool:1");
        assert!(pooled);

        let request = ScrapeRequest { use_proxy: false, ..request };
        assert_eq!(service.select_proxy(&request).unwrap(), (None, false));
    }

    #[test]
    fn test_invalid_pinned_proxy_fails_request() {
        let service = service(&[]);
        let mut request = ScrapeRequest::new("https://example.com");
        request.proxy_url = Some("   ".into());

        let response = service.scrape(&request);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("proxy_url"));
    }

    #[test]
    fn test_invalid_proxy_list_is_a_config_error() {
        let config = ScraperConfig { proxy_list: vec![":a:b:c".into()], ..ScraperConfig::default() };
        assert!(matches!(ScrapeService::new(config), Err(ScrapeError::Config(_))));
    }

    #[test]
    #[ignore]
    fn test_scrape_data_url() {
        let html = "<h1>Hello</h1><ul><li>a</li><li>b</li></ul>";
        let config = ScraperConfig { headless: true, proxy_enabled: false, max_retries: 1, ..ScraperConfig::default() };
        let service = ScrapeService::new(config).unwrap();

        let mut request = ScrapeRequest::new(format!("data:text/html,{}", html));
        request.wait_time = 0;
        request.extraction.get.insert("title".into(), "h1".into());

        let response = service.scrape(&request);
        assert!(response.success, "{:?}", response.error);
        assert_eq!(response.proxy_used, None);
        assert_eq!(response.data.unwrap().get["title"], "Hello");
    }
}
