use crate::error::Result;
use crate::scrape::ExtractionRequest;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Runs an extraction against whatever page the working tab shows
#[derive(Default)]
pub struct ExtractTool;

impl Tool for ExtractTool {
    type Params = ExtractionRequest;

    fn name(&self) -> &str {
        "extract"
    }

    fn execute_typed(&self, params: ExtractionRequest, context: &mut ToolContext) -> Result<ToolResult> {
        let extraction = context.session.extract(&params, context.session.config().drop_empty_records)?;
        if !extraction.errors.is_empty() {
            log::debug!("Extraction finished with {} field errors", extraction.errors.len());
        }

        Ok(ToolResult::success_with(serde_json::to_value(extraction)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserSession, LaunchOptions};
    use crate::config::ScraperConfig;
    use crate::scrape::CollectField;

    #[test]
    fn test_extract_tool_metadata() {
        let tool = ExtractTool;
        assert_eq!(tool.name(), "extract");
        assert!(tool.parameters_schema()["properties"]["get"].is_object());
    }

    #[test]
    #[ignore]
    fn test_extract_current_page() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session.navigate("data:text/html,<h1>Menu</h1><ul><li>Tea</li><li>Coffee</li></ul>").unwrap();
        session.wait_for_navigation().unwrap();

        let result = session
            .execute_tool("extract", serde_json::json!({"get": {"title": "h1"}, "collect": {"items": {"selector": "li"}}}))
            .unwrap();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["data"]["get"]["title"], "Menu");
        assert_eq!(data["data"]["collect"]["items"], serde_json::json!(["Tea", "Coffee"]));
    }

    #[test]
    #[ignore]
    fn test_extract_follows_session_drop_empty_setting() {
        let config = ScraperConfig { drop_empty_records: true, ..ScraperConfig::default() };
        let session = BrowserSession::launch(LaunchOptions::new().headless(true))
            .expect("Failed to launch browser")
            .with_config(config);
        session.navigate("data:text/html,<ul><li><b>Tea</b></li><li></li></ul>").unwrap();
        session.wait_for_navigation().unwrap();

        let request = ExtractionRequest::new().collect("items", CollectField::new("li").with_field("name", "b"));
        let result = ExtractTool.execute_typed(request, &mut ToolContext::new(&session)).unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["data"]["collect"]["items"], serde_json::json!([{"name": "Tea"}]));
    }
}
