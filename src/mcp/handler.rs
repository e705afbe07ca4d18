use crate::browser::{BrowserSession, LaunchOptions};
use crate::config::ScraperConfig;
use crate::error::Result as ScrapeResult;
use rmcp::{ServerHandler,
           handler::server::router::tool::ToolRouter,
           model::{Implementation, ServerCapabilities, ServerInfo},
           tool_handler};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// MCP server holding one browser session shared by every tool call
#[derive(Clone)]
pub struct BrowserServer {
    session: Arc<Mutex<BrowserSession>>,
    tool_router: ToolRouter<Self>,
}

impl BrowserServer {
    /// Launch a browser whose tools follow `config`, and wrap it in a server
    pub fn with_options(options: LaunchOptions, config: ScraperConfig) -> ScrapeResult<Self> {
        let session = BrowserSession::launch(options)?.with_config(config);
        Ok(Self::from_session(session))
    }

    /// Server over an existing session
    pub fn from_session(session: BrowserSession) -> Self {
        Self { session: Arc::new(Mutex::new(session)), tool_router: Self::tool_router() }
    }

    /// Lock the session; a panicked tool call does not poison it for later calls
    pub fn session(&self) -> MutexGuard<'_, BrowserSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[tool_handler]
impl ServerHandler for BrowserServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Scrape web pages with selector notation. `selector` reads text, `selector(attr)` reads an \
                 attribute, `span<div<h2` goes up one parent from `span` and reads the first `h2` there. Use \
                 browser_scrape to load and extract in one call, or browser_navigate then browser_extract."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
