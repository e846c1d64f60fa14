//! ReAct agent loop.
//!
//! The loop alternates model requests and tool calls until the model answers
//! without requesting a tool, or the iteration limit is reached.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::NoopHandler;
use crate::error::AgentError;
use crate::protocol::{AgentRunner, ChatModel, ProgressHandler};
use crate::tool::{Tool, ToolError};
use crate::types::{AgentResponse, ChatMessage, ToolCall, ToolDefinition};

/// Default number of model requests before the loop gives up.
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Tool-calling agent over a [`ChatModel`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use reactrun_agent::{AgentRunner, NoopHandler, OpenAiChatModel, ReactAgent};
///
/// async fn run() -> Result<(), Box<dyn std::error::Error>> {
///     let agent = ReactAgent::new(Arc::new(OpenAiChatModel::from_env()))
///         .with_system_prompt("You are a helpful assistant.");
///
///     let response = agent
///         .invoke(&[], "What is 2 + 2?", Some(Arc::new(NoopHandler)))
///         .await?;
///     println!("{}", response.final_text());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ReactAgent {
    model: Arc<dyn ChatModel>,
    max_iterations: usize,
    system_prompt: Option<String>,
}

impl ReactAgent {
    /// Create an agent over the given model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
        }
    }

    /// Set the maximum number of model requests.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set a system prompt sent ahead of the user prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Maximum number of model requests.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run one requested tool call, returning the text sent back to the model.
    async fn run_call(
        &self,
        tools: &[Arc<dyn Tool>],
        call: &ToolCall,
        handler: &dyn ProgressHandler,
    ) -> String {
        let name = call.function.name.as_str();
        let raw_args = call.function.arguments.as_str();

        handler.on_tool_start(name, raw_args).await;

        let outcome = match tools.iter().find(|t| t.name() == name) {
            Some(tool) => match parse_arguments(raw_args) {
                Ok(args) => tool.invoke(args).await,
                Err(e) => Err(e),
            },
            None => Err(ToolError::InvalidArguments(format!(
                "{} is not a valid tool",
                name
            ))),
        };

        match outcome {
            Ok(output) => {
                debug!(tool = %name, output_len = output.len(), "Tool finished");
                handler.on_tool_end(name, &output).await;
                output
            }
            Err(e) => {
                let message = e.to_string();
                warn!(tool = %name, error = %message, "Tool call failed");
                handler.on_tool_error(name, &message).await;
                format!("Error: {}", message)
            }
        }
    }
}

#[async_trait]
impl AgentRunner for ReactAgent {
    async fn invoke(
        &self,
        tools: &[Arc<dyn Tool>],
        prompt: &str,
        handler: Option<Arc<dyn ProgressHandler>>,
    ) -> Result<AgentResponse, AgentError> {
        let handler: Arc<dyn ProgressHandler> = handler.unwrap_or_else(|| Arc::new(NoopHandler));
        let definitions: Vec<ToolDefinition> = tools.iter().map(|t| t.definition()).collect();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        info!(
            tools = definitions.len(),
            prompt_len = prompt.len(),
            max_iterations = self.max_iterations,
            "Starting agent loop"
        );

        for iteration in 1..=self.max_iterations {
            handler.on_llm_start(messages.len()).await;

            let reply = self.model.complete(&messages, &definitions).await?;
            let calls = reply.requested_calls().to_vec();
            messages.push(reply);

            if calls.is_empty() {
                info!(iterations = iteration, "Agent produced final answer");
                return Ok(AgentResponse { messages });
            }

            debug!(iteration, calls = calls.len(), "Model requested tool calls");

            for call in &calls {
                let content = self.run_call(tools, call, handler.as_ref()).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), content));
            }
        }

        warn!(max_iterations = self.max_iterations, "Agent hit iteration limit");
        Err(AgentError::MaxIterations(self.max_iterations))
    }
}

fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
