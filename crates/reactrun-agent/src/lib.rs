//! ReAct agent for ReactRun
//!
//! This crate provides the agent collaborator a job runs against: a
//! tool-calling loop over an OpenAI-compatible chat-completions model,
//! the `Tool` capability every tool implements, and the `ProgressHandler`
//! callbacks used to report model and tool activity while the loop runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reactrun_agent::{AgentRunner, OpenAiChatModel, ReactAgent, Tool};
//!
//! async fn run_agent(tools: Vec<Arc<dyn Tool>>) -> Result<(), Box<dyn std::error::Error>> {
//!     let model = OpenAiChatModel::from_env().with_model("gpt-4");
//!     let agent = ReactAgent::new(Arc::new(model)).with_max_iterations(25);
//!
//!     let response = agent.invoke(&tools, "What is 2 + 2?", None).await?;
//!
//!     println!("Answer: {}", response.final_text());
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod executor;
mod openai;
mod protocol;
mod tool;
mod types;

// Re-export main types
pub use client::NoopHandler;
pub use error::AgentError;
pub use executor::{ReactAgent, DEFAULT_MAX_ITERATIONS};
pub use openai::{OpenAiChatModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use protocol::{AgentRunner, ChatModel, ProgressHandler};
pub use tool::{Tool, ToolError};
pub use types::{
    AgentResponse, ChatCompletion, ChatMessage, ChatRequest, Choice, FunctionCall,
    FunctionDefinition, Role, ToolCall, ToolDefinition,
};
