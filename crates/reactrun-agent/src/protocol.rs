//! Seams between the agent loop and its surroundings.
//!
//! - [`ChatModel`]: one request/response exchange with a language model.
//! - [`ProgressHandler`]: callbacks fired while the loop runs.
//! - [`AgentRunner`]: the whole loop as a black box, as consumed by a job.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::tool::Tool;
use crate::types::{AgentResponse, ChatMessage, ToolDefinition};

/// A chat-completions capable language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the conversation so far.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, AgentError>;
}

/// Handler trait for agent progress callbacks.
///
/// Implement this trait to observe model and tool activity, e.g. to forward
/// it to an event queue. Callbacks cannot fail the loop.
#[async_trait]
pub trait ProgressHandler: Send + Sync {
    /// Called before each model request.
    async fn on_llm_start(&self, message_count: usize);

    /// Called before a tool runs, with its raw JSON arguments.
    async fn on_tool_start(&self, tool_name: &str, input: &str);

    /// Called after a tool returned successfully.
    async fn on_tool_end(&self, tool_name: &str, output: &str);

    /// Called when a tool call could not be completed.
    async fn on_tool_error(&self, tool_name: &str, error: &str);
}

/// Runs an agent to completion against a tool set.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Invoke the agent with `prompt`, reporting progress to `handler`.
    async fn invoke(
        &self,
        tools: &[Arc<dyn Tool>],
        prompt: &str,
        handler: Option<Arc<dyn ProgressHandler>>,
    ) -> Result<AgentResponse, AgentError>;
}
