use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult, utils::normalize_url};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the navigate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// URL to open; a missing scheme is filled in
    pub url: String,

    /// Wait for the page load to finish (default: true)
    #[serde(default = "default_wait")]
    pub wait_for_load: bool,
}

fn default_wait() -> bool {
    true
}

/// Opens a URL in the working tab
#[derive(Default)]
pub struct NavigateTool;

impl Tool for NavigateTool {
    type Params = NavigateParams;

    fn name(&self) -> &str {
        "navigate"
    }

    fn execute_typed(&self, params: NavigateParams, context: &mut ToolContext) -> Result<ToolResult> {
        let url = normalize_url(&params.url);
        context.session.navigate(&url)?;

        if params.wait_for_load {
            context.session.wait_for_navigation()?;
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "url": url,
            "waited": params.wait_for_load
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_params_default() {
        let params: NavigateParams = serde_json::from_value(serde_json::json!({"url": "example.com"})).unwrap();
        assert_eq!(params.url, "example.com");
        assert!(params.wait_for_load);
    }

    #[test]
    fn test_navigate_params_explicit_wait() {
        let params: NavigateParams =
            serde_json::from_value(serde_json::json!({"url": "https://example.com", "wait_for_load": false})).unwrap();
        assert!(!params.wait_for_load);
    }

    #[test]
    fn test_navigate_tool_metadata() {
        let tool = NavigateTool;
        assert_eq!(tool.name(), "navigate");
        let schema = tool.parameters_schema();
        assert!(schema["properties"]["url"].is_object());
    }
}
