use crate::browser::proxy::ProxyEntry;
use crate::config::ScraperConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// Chrome/Chromium executable; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,

    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,

    pub sandbox: bool,

    /// Overrides the browser's user agent
    pub user_agent: Option<String>,

    /// Deadline for navigation
    pub navigation_timeout: Duration,

    /// Deadline for `wait_for` selectors when a request sets none
    pub element_timeout: Duration,

    /// Egress proxy for every request of the session
    pub proxy: Option<ProxyEntry>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(5),
            proxy: None,
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch options matching the service configuration
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new()
            .headless(config.headless)
            .user_agent(config.user_agent.clone())
            .navigation_timeout(config.timeout)
            .element_timeout(config.default_wait_time)
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: PathBuf) -> Self {
        self.chrome_path = Some(path);
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: PathBuf) -> Self {
        self.user_data_dir = Some(dir);
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder method: set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builder method: set the navigation timeout
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Builder method: set the default element wait
    pub fn element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Builder method: route traffic through a proxy
    pub fn proxy(mut self, proxy: Option<ProxyEntry>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Options for connecting to an already running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL, e.g. `ws://127.0.0.1:9222/devtools/browser/<id>`
    pub ws_url: String,

    /// Connection timeout in milliseconds
    pub timeout: u64,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into(), timeout: 30_000 }
    }

    /// Builder method: set the connection timeout in milliseconds
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(false).window_size(800, 600).sandbox(false);

        assert!(!opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert!(!opts.sandbox);
        assert!(opts.proxy.is_none());
    }

    #[test]
    fn test_launch_options_from_config() {
        let config = ScraperConfig { headless: true, timeout: Duration::from_secs(5), ..ScraperConfig::default() };
        let opts = LaunchOptions::from_config(&config);

        assert!(opts.headless);
        assert_eq!(opts.navigation_timeout, Duration::from_secs(5));
        assert_eq!(opts.element_timeout, config.default_wait_time);
        assert_eq!(opts.user_agent.as_deref(), Some(config.user_agent.as_str()));
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }
}
