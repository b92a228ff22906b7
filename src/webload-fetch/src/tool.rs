//! Agent tool wrapper around [`WebPageLoader`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::loader::WebPageLoader;

/// Name the tool is registered under.
pub const LOAD_WEB_PAGE: &str = "load_web_page";

/// Tool invocation errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),
}

/// Tool definition for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Trait for tool handlers.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the definition advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool.
    async fn execute(&self, arguments: Value) -> Result<String, ToolError>;
}

#[derive(Debug, Deserialize)]
struct LoadWebPageArgs {
    url: String,
}

/// `load_web_page` tool.
#[derive(Debug, Clone, Default)]
pub struct LoadWebPageTool {
    loader: WebPageLoader,
}

impl LoadWebPageTool {
    pub fn new(loader: WebPageLoader) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl ToolHandler for LoadWebPageTool {
    fn name(&self) -> &str {
        LOAD_WEB_PAGE
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            LOAD_WEB_PAGE,
            "Load a web page and return its visible text. Only public http and https \
             URLs can be loaded.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL of the page to load"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        let args: LoadWebPageArgs = serde_json::from_value(arguments)?;
        Ok(self.loader.load(&args.url).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition() {
        let tool = LoadWebPageTool::default();
        let definition = tool.definition();

        assert_eq!(tool.name(), "load_web_page");
        assert_eq!(definition.name, "load_web_page");
        assert_eq!(definition.parameters["required"], json!(["url"]));
        assert_eq!(definition.parameters["properties"]["url"]["type"], "string");
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let tool = LoadWebPageTool::default();

        assert!(matches!(
            tool.execute(json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            tool.execute(json!({ "url": 42 })).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
