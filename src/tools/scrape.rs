use crate::browser::ProxyEntry;
use crate::error::{Result, ScrapeError};
use crate::scrape::ScrapeRequest;
use crate::tools::{Tool, ToolContext, ToolResult, utils::normalize_url};

/// Loads a page in the working tab and extracts from it.
///
/// The session keeps the proxy it was launched with, so a request asking for
/// another one is rejected rather than served over the wrong route.
#[derive(Default)]
pub struct ScrapeTool;

/// Check the request's proxy fields against the proxy the session runs through
pub(crate) fn check_proxy(request: &ScrapeRequest, session_proxy: Option<&ProxyEntry>) -> Result<()> {
    if let Some(raw) = &request.proxy_url {
        let pinned = ProxyEntry::parse(raw).map_err(|e| ScrapeError::InvalidRequest(format!("proxy_url: {}", e)))?;
        return match session_proxy {
            Some(current) if current.server == pinned.server => Ok(()),
            Some(current) => Err(ScrapeError::InvalidRequest(format!(
                "proxy_url {} differs from the session proxy {}",
                pinned, current
            ))),
            None => Err(ScrapeError::InvalidRequest(format!(
                "proxy_url {} requested but the session runs without a proxy",
                pinned
            ))),
        };
    }

    match session_proxy {
        Some(current) if !request.use_proxy => Err(ScrapeError::InvalidRequest(format!(
            "use_proxy is false but the session runs through {}",
            current
        ))),
        _ => Ok(()),
    }
}

impl Tool for ScrapeTool {
    type Params = ScrapeRequest;

    fn name(&self) -> &str {
        "scrape"
    }

    fn execute_typed(&self, mut params: ScrapeRequest, context: &mut ToolContext) -> Result<ToolResult> {
        params.url = normalize_url(&params.url);
        check_proxy(&params, context.session.proxy())?;

        let config = context.session.config();
        let attempts = config.max_retries.max(1);
        for attempt in 1..=attempts {
            match context.session.scrape(&params, config.drop_empty_records) {
                Ok(response) => return Ok(ToolResult::success_with(serde_json::to_value(response)?)),
                Err(e) if e.is_session_failure() && attempt < attempts => {
                    log::warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, params.url, e);
                }
                Err(e) => {
                    log::warn!("Scraping {} failed: {}", params.url, e);
                    return Ok(ToolResult::failure(e.to_string()));
                }
            }
        }

        Ok(ToolResult::failure(format!("Scraping {} made no attempt", params.url)))
    }
}
