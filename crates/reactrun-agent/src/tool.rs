//! The capability every agent tool implements.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::ToolDefinition;

/// Errors a tool can report back to the agent loop.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and failed.
    #[error("{0}")]
    Execution(String),

    /// The tool's backing service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A named capability the agent can invoke.
///
/// Tool sets are plain ordered lists of `Arc<dyn Tool>`; tools discovered
/// from a tool server and first-party tools are the same kind of value.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of this tool.
    fn name(&self) -> &str;

    /// What this tool does, as shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool with the given arguments.
    async fn invoke(&self, args: Value) -> Result<String, ToolError>;

    /// Definition advertised to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters_schema())
    }
}
