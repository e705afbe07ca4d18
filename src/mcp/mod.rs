//! MCP (Model Context Protocol) server for scraping
//!
//! Exposes the session tools as rmcp tools: `browser_navigate`,
//! `browser_scrape` and `browser_extract`.

pub mod handler;
pub use handler::BrowserServer;

use crate::scrape::{ExtractionRequest, ScrapeRequest};
use crate::tools::{NavigateParams, ToolContext, ToolResult as InternalToolResult};
use rmcp::{ErrorData as McpError,
           handler::server::wrapper::Parameters,
           model::{CallToolResult, Content},
           tool, tool_router};

/// Convert internal ToolResult to MCP CallToolResult
fn convert_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    if result.success {
        let text = match result.data {
            Some(data) => serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
            None => "Success".to_string(),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
        Err(McpError::internal_error(error_msg, None))
    }
}

impl BrowserServer {
    /// Run a registered tool against the shared session
    fn run_tool(&self, name: &str, params: serde_json::Value) -> Result<CallToolResult, McpError> {
        let session = self.session();
        let mut context = ToolContext::new(&*session);

        let result = session
            .tool_registry()
            .execute(name, params, &mut context)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        convert_result(result)
    }
}

#[tool_router]
impl BrowserServer {
    #[tool(description = "Navigate the browser to a URL")]
    fn browser_navigate(&self, params: Parameters<NavigateParams>) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(params.0).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        self.run_tool("navigate", params)
    }

    #[tool(description = "Load a URL and extract values with selector notation. `get` maps names to \
                          single values, `collect` maps names to lists of values or records")]
    fn browser_scrape(&self, params: Parameters<ScrapeRequest>) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(params.0).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        self.run_tool("scrape", params)
    }

    #[tool(description = "Extract values with selector notation from the page currently loaded")]
    fn browser_extract(&self, params: Parameters<ExtractionRequest>) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(params.0).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        self.run_tool("extract", params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_success() {
        let result = convert_result(InternalToolResult::success_with(serde_json::json!({"title": "Hello"}))).unwrap();
        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn test_convert_failure() {
        let error = convert_result(InternalToolResult::failure("navigation failed")).unwrap_err();
        assert_eq!(error.message, "navigation failed");
    }

    fn assert_server_handler<T: rmcp::ServerHandler + Clone + Send + Sync + 'static>() {}

    #[test]
    fn test_router_lists_browser_tools() {
        assert_server_handler::<BrowserServer>();

        let mut names: Vec<String> =
            BrowserServer::tool_router().list_all().into_iter().map(|tool| tool.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["browser_extract", "browser_navigate", "browser_scrape"]);
    }
}
