//! Browser session management
//!
//! - [`BrowserSession`]: one Chrome instance with a working tab
//! - [`ProxyPool`]: rotating egress proxies with failure counting
//! - [`ScrapeService`]: per-request sessions with proxy selection and retries

pub mod config;
pub mod proxy;
pub mod service;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use proxy::{ProxyEntry, ProxyPool};
pub use service::ScrapeService;
pub use session::BrowserSession;
