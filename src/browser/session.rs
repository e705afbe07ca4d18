use crate::{browser::{config::{ConnectionOptions, LaunchOptions}, proxy::ProxyEntry},
            config::ScraperConfig,
            dom::TabDocument,
            error::{Result, ScrapeError},
            scrape::{ExtractionRequest, Extraction, Extractor, ScrapeRequest, ScrapeResponse},
            tools::{ToolContext, ToolRegistry, ToolResult}};
use headless_chrome::{Browser, Tab};
use std::{ffi::{OsStr, OsString},
          sync::Arc,
          time::{Duration, Instant}};

/// Browser session that manages a Chrome/Chromium instance and one working tab
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab used for navigation and extraction
    tab: Arc<Tab>,

    /// Deadline for navigation
    navigation_timeout: Duration,

    /// Deadline for `wait_for` selectors when a request sets none
    element_timeout: Duration,

    /// Proxy the browser was launched with
    proxy: Option<ProxyEntry>,

    /// Settings consulted by tools run against this session
    config: ScraperConfig,

    /// Tool registry for executing scrape tools
    tool_registry: ToolRegistry,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Hide the automation flag from pages that check for it
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-dev-shm-usage"));

        // One hour instead of the default 30 seconds so long waits do not close the browser
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path.clone();
        launch_opts.user_data_dir = options.user_data_dir.clone();
        launch_opts.sandbox = options.sandbox;

        let user_agent_arg = options.user_agent.as_ref().map(|ua| OsString::from(format!("--user-agent={}", ua)));
        if let Some(arg) = &user_agent_arg {
            launch_opts.args.push(arg.as_os_str());
        }

        if let Some(proxy) = &options.proxy {
            log::info!("Using proxy: {}", proxy);
            launch_opts.proxy_server = Some(proxy.server.as_str());
        }

        let browser = Browser::new(launch_opts).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| ScrapeError::LaunchFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(options.navigation_timeout);

        if let Some(proxy) = options.proxy.as_ref().filter(|p| p.has_credentials()) {
            tab.enable_fetch(None, Some(true))
                .and_then(|tab| tab.authenticate(proxy.username.clone(), proxy.password.clone()))
                .map_err(|e| ScrapeError::LaunchFailed(format!("Failed to configure proxy authentication: {}", e)))?;
        }

        Ok(Self {
            browser,
            tab,
            navigation_timeout: options.navigation_timeout,
            element_timeout: options.element_timeout,
            proxy: options.proxy,
            config: ScraperConfig::default(),
            tool_registry: ToolRegistry::with_defaults(),
        })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let timeout = Duration::from_millis(options.timeout);
        let browser = Browser::connect_with_timeout(options.ws_url, timeout)
            .map_err(|e| ScrapeError::ConnectionFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self {
            browser,
            tab,
            navigation_timeout: timeout,
            element_timeout: LaunchOptions::default().element_timeout,
            proxy: None,
            config: ScraperConfig::default(),
            tool_registry: ToolRegistry::with_defaults(),
        })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Builder method: settings for tools run against this session.
    ///
    /// The `wait_for` fallback follows `default_wait_time`.
    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.element_timeout = config.default_wait_time;
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Proxy the browser routes its traffic through
    pub fn proxy(&self) -> Option<&ProxyEntry> {
        self.proxy.as_ref()
    }

    /// The working tab
    pub fn tab(&self) -> Arc<Tab> {
        Arc::clone(&self.tab)
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the working tab to a URL
    pub fn navigate(&self, url: &str) -> Result<()> {
        log::info!("Navigating to: {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| ScrapeError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Wait until `selector` matches an element, up to `timeout`
    pub fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|e| ScrapeError::Timeout(format!("Element '{}' did not appear: {}", selector, e)))?;

        Ok(())
    }

    /// Deadline applied to navigation
    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    /// Load a page the way a scrape request asks for.
    ///
    /// A `wait_for` selector that never shows up is logged; extraction still runs.
    pub fn load(&self, request: &ScrapeRequest) -> Result<()> {
        self.navigate(&request.url)?;
        self.wait_for_navigation()?;

        if request.wait_time > 0 {
            log::debug!("Waiting {} seconds after navigation", request.wait_time);
            std::thread::sleep(Duration::from_secs(request.wait_time));
        }

        if let Some(selector) = &request.wait_for {
            let timeout = request.element_timeout.map(Duration::from_secs).unwrap_or(self.element_timeout);
            if let Err(e) = self.wait_for_selector(selector, timeout) {
                log::warn!("{}", e);
            }
        }

        Ok(())
    }

    /// Run an extraction against the document currently loaded in the working tab
    pub fn extract(&self, request: &ExtractionRequest, drop_empty_default: bool) -> Result<Extraction> {
        let doc = TabDocument::new(&self.tab)?;
        Ok(Extractor::new(&doc).drop_empty_default(drop_empty_default).run(request))
    }

    /// Load and extract in one go; `Err` only for failures that leave no document to read
    pub fn scrape(&self, request: &ScrapeRequest, drop_empty_default: bool) -> Result<ScrapeResponse> {
        let started = Instant::now();
        self.load(request)?;
        let extraction = self.extract(&request.extraction, drop_empty_default)?;
        log::info!("Scraped {} in {:.2}s", request.url, started.elapsed().as_secs_f64());

        let mut response = ScrapeResponse::completed(request.url.clone(), extraction, started.elapsed());
        response.proxy_used = self.proxy.as_ref().map(|proxy| proxy.server.clone());
        Ok(response)
    }

    /// Get the tool registry
    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Get mutable tool registry
    pub fn tool_registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tool_registry
    }

    /// Execute a tool by name
    pub fn execute_tool(&self, name: &str, params: serde_json::Value) -> Result<ToolResult> {
        let mut context = ToolContext::new(self);
        self.tool_registry.execute(name, params, &mut context)
    }

    /// Close the working tab; the browser itself closes on drop
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(true)
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;

        Ok(())
    }
}
