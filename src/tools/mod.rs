//! Scrape tools
//!
//! Tools are typed operations over a [`BrowserSession`] that can also be
//! invoked by name with JSON parameters through a [`ToolRegistry`]:
//! - `navigate`: load a URL in the working tab
//! - `scrape`: load a URL and run an extraction request
//! - `extract`: run an extraction request against the current page

pub mod extract;
pub mod navigate;
pub mod scrape;
pub mod utils;

pub use extract::ExtractTool;
pub use navigate::{NavigateParams, NavigateTool};
pub use scrape::ScrapeTool;

use crate::browser::BrowserSession;
use crate::error::{Result, ScrapeError};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Outcome of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result without payload
    pub fn success() -> Self {
        Self { success: true, data: None, error: None }
    }

    /// Successful result carrying `data`
    pub fn success_with(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Failed result with a message
    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// State shared with a tool during one invocation
pub struct ToolContext<'a> {
    pub session: &'a BrowserSession,
}

impl<'a> ToolContext<'a> {
    pub fn new(session: &'a BrowserSession) -> Self {
        Self { session }
    }
}

/// A typed tool
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    /// Name the tool is registered under
    fn name(&self) -> &str;

    /// JSON schema of the parameters
    fn parameters_schema(&self) -> Value {
        schemars::schema_for!(Self::Params).to_value()
    }

    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext) -> Result<ToolResult>;

    /// Decode JSON parameters and run the tool
    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let params: Self::Params = serde_json::from_value(params).map_err(|e| ScrapeError::ToolExecutionFailed {
            tool: Tool::name(self).to_string(),
            reason: format!("Invalid parameters: {}", e),
        })?;
        self.execute_typed(params, context)
    }
}

/// Object-safe view of a [`Tool`] used by the registry
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;
}

impl<T: Tool> DynTool for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn parameters_schema(&self) -> Value {
        Tool::parameters_schema(self)
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        Tool::execute(self, params, context)
    }
}

/// Tools by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `navigate`, `scrape` and `extract`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NavigateTool);
        registry.register(ScrapeTool);
        registry.register(ExtractTool);
        registry
    }

    /// Add a tool, replacing any tool of the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(Tool::name(&tool).to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names
    pub fn list_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Run a tool by name
    pub fn execute(&self, name: &str, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let tool = self.get(name).ok_or_else(|| ScrapeError::ToolExecutionFailed {
            tool: name.to_string(),
            reason: "Unknown tool".to_string(),
        })?;
        log::debug!("Executing tool '{}'", name);
        tool.execute(params, context)
    }
}
