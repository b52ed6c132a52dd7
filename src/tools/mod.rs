pub mod search;

use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::models::ToolDefinition;

/// What a tool may know about the turn that invoked it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolContext<'a> {
    pub document: Option<&'a str>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool. Failures are reported in the returned text so the model
    /// can see them; they never abort the turn.
    async fn call(&self, ctx: ToolContext<'_>, arguments: &str) -> String;
}

#[derive(Default)]
pub struct ToolRegistry {
    pub tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub async fn call_tool(&self, name: &str, ctx: ToolContext<'_>, arguments: &str) -> String {
        for tool in &self.tools {
            if tool.definition().function.name == name {
                return tool.call(ctx, arguments).await;
            }
        }
        format!("Error: Tool '{}' not found", name)
    }
}
