//! Tool sessions and the tool set a job runs with.
//!
//! A job opens one [`ToolSession`] from a [`ToolProvider`], lists the
//! session's tools, and appends the worker's first-party tools. The session
//! is closed before the job finishes, whatever the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use reactrun_agent::Tool;
use tracing::info;

use crate::error::SessionError;

mod image;
mod mcp;

pub use image::CreateImage;
pub use mcp::{McpStdioProvider, McpTool};

/// Source of tool sessions.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Open a new session. The caller must [`ToolSession::close`] it.
    async fn open(&self) -> Result<Box<dyn ToolSession>, SessionError>;
}

/// A live connection to a provider of tools.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Tools offered by this session.
    async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, SessionError>;

    /// Release the session and its transport.
    async fn close(self: Box<Self>);
}

/// The session's tools followed by the first-party tools.
pub async fn load_all_tools(
    session: &dyn ToolSession,
    first_party: &[Arc<dyn Tool>],
) -> Result<Vec<Arc<dyn Tool>>, SessionError> {
    let mut tools = session.list_tools().await?;
    let discovered = tools.len();
    tools.extend(first_party.iter().cloned());

    info!(
        discovered,
        first_party = first_party.len(),
        tools = ?tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
        "Loaded tool set"
    );
    Ok(tools)
}
