//! MCP tool server over stdio.
//!
//! The server is a child process driven through the `rmcp` client. One
//! session owns one child; the running service answers server-initiated
//! requests such as `ping` while the agent waits on tool calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reactrun_agent::{Tool, ToolError};
use rmcp::model::{CallToolRequestParam, ClientInfo, Content};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{error, info, warn};

use super::{ToolProvider, ToolSession};
use crate::config::{Config, MCP_SERVER_PACKAGE};
use crate::error::SessionError;

/// MCP protocol revision announced during initialization.
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Launches an MCP server as a child process for each session.
#[derive(Debug, Clone)]
pub struct McpStdioProvider {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl McpStdioProvider {
    /// Provider running `command` with `args`.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: Vec::new(),
        }
    }

    /// Provider for the Python code-interpreter server described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.mcp_command.clone(),
            vec![
                MCP_SERVER_PACKAGE.to_string(),
                "--dir".to_string(),
                config.work_dir.display().to_string(),
                "--python-path".to_string(),
                config.python_path.clone(),
            ],
        )
        .with_env("MCP_ALLOW_SYSTEM_ACCESS", "0")
        .with_env("PYTHONIOENCODING", config.python_io_encoding.clone())
    }

    /// Add an environment variable for the server process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl ToolProvider for McpStdioProvider {
    async fn open(&self) -> Result<Box<dyn ToolSession>, SessionError> {
        info!(command = %self.command, args = ?self.args, "Starting MCP server");

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true);

        let transport = TokioChildProcess::new(command).map_err(|e| {
            error!(command = %self.command, error = %e, "Failed to spawn MCP server");
            SessionError::Spawn(e)
        })?;

        // Dropping the pending handshake drops the transport, which kills the child.
        match tokio::time::timeout(INIT_TIMEOUT, client_info()?.serve(transport)).await {
            Ok(Ok(service)) => {
                info!("MCP server initialized");
                Ok(Box::new(McpSession { service }))
            }
            Ok(Err(e)) => {
                error!(error = %e, "MCP server failed to initialize");
                Err(SessionError::Initialize(e.to_string()))
            }
            Err(_) => {
                error!(timeout_secs = INIT_TIMEOUT.as_secs(), "MCP server initialization timed out");
                Err(SessionError::Initialize(format!(
                    "timed out after {}s",
                    INIT_TIMEOUT.as_secs()
                )))
            }
        }
    }
}

/// Client identity and protocol revision sent with `initialize`.
fn client_info() -> Result<ClientInfo, SessionError> {
    let info = serde_json::from_value(json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))?;
    Ok(info)
}

/// Text items of a `tools/call` result joined by newlines.
fn content_text(content: &[Content]) -> String {
    content
        .iter()
        .map(|item| match item.as_text() {
            Some(text) => text.text.clone(),
            None => serde_json::to_string(item).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct McpSession {
    service: RunningService<RoleClient, ClientInfo>,
}

#[async_trait]
impl ToolSession for McpSession {
    async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, SessionError> {
        let tools = self.service.peer().list_all_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| {
                Arc::new(McpTool {
                    peer: self.service.peer().clone(),
                    name: tool.name.to_string(),
                    description: tool
                        .description
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    schema: Value::Object(tool.input_schema.as_ref().clone()),
                }) as Arc<dyn Tool>
            })
            .collect())
    }

    async fn close(self: Box<Self>) {
        match self.service.cancel().await {
            Ok(reason) => info!(reason = ?reason, "MCP server stopped"),
            Err(e) => warn!(error = %e, "MCP service task failed"),
        }
    }
}

/// A tool offered by an MCP server.
pub struct McpTool {
    peer: Peer<RoleClient>,
    name: String,
    description: String,
    schema: Value,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn invoke(&self, args: Value) -> Result<String, ToolError> {
        let params: CallToolRequestParam =
            serde_json::from_value(json!({ "name": self.name, "arguments": args }))
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let text = content_text(&result.content);
        if result.is_error.unwrap_or(false) {
            Err(ToolError::Execution(text))
        } else {
            Ok(text)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Shell helpers answering a request read into `$line` with its own id.
    const REPLY: &str = r#"
reply() {
    id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
    printf '{"jsonrpc":"2.0","id":%s,"result":%s}\n' "$id" "$1"
}
fail() {
    id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
    printf '{"jsonrpc":"2.0","id":%s,"error":%s}\n' "$id" "$1"
}
handshake() {
    read -r line
    reply '{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake","version":"0"}}'
    read -r line
    printf '%s\n' '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info","data":"ready"}}'
}
"#;

    const TOOLS: &str = r#"{"tools":[{"name":"run_python","description":"Run code","inputSchema":{"type":"object","properties":{"code":{"type":"string"}}}},{"name":"bare","inputSchema":{"type":"object"}}]}"#;

    fn fake_provider(body: &str) -> McpStdioProvider {
        let script = format!("{REPLY}\nTOOLS='{TOOLS}'\n{body}");
        McpStdioProvider::new("sh", vec!["-c".to_string(), script])
    }

    #[tokio::test]
    async fn test_session_lists_and_calls_tools() {
        let provider = fake_provider(
            r#"
handshake
read -r line
reply "$TOOLS"
read -r line
reply '{"content":[{"type":"text","text":"4"},{"type":"text","text":"done"}],"isError":false}'
read -r line
reply '{"content":[{"type":"text","text":"NameError"}],"isError":true}'
read -r line
fail '{"code":-32602,"message":"Unknown tool"}'
read -r line
"#,
        );
        let session = provider.open().await.unwrap();
        let tools = session.list_tools().await.unwrap();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name(), "run_python");
        assert_eq!(tools[0].description(), "Run code");
        assert_eq!(tools[1].description(), "");
        assert_eq!(tools[1].parameters_schema()["type"], "object");

        let output = tools[0].invoke(json!({"code": "print(2+2)"})).await.unwrap();
        assert_eq!(output, "4\ndone");

        let failed = tools[0].invoke(json!({"code": "x"})).await;
        assert!(matches!(failed, Err(ToolError::Execution(ref m)) if m == "NameError"));

        let rpc_error = tools[1].invoke(json!({})).await;
        assert!(matches!(rpc_error, Err(ToolError::Transport(_))));

        session.close().await;

        let after_close = tools[0].invoke(json!({"code": "1"})).await;
        assert!(matches!(after_close, Err(ToolError::Transport(_))));
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        // The tool list is only sent once the ping reply has arrived.
        let provider = fake_provider(
            r#"
handshake
printf '%s\n' '{"jsonrpc":"2.0","id":"srv-1","method":"ping"}'
pong=""
list=""
while [ -z "$pong" ] || [ -z "$list" ]; do
    read -r line || exit 1
    case "$line" in
        *'"srv-1"'*) pong=1 ;;
        *tools/list*) list="$line" ;;
    esac
done
line="$list"
reply "$TOOLS"
read -r line
"#,
        );
        let session = provider.open().await.unwrap();

        let tools = session.list_tools().await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["run_python", "bare"]);

        session.close().await;
    }

    #[tokio::test]
    async fn test_non_object_arguments_are_rejected() {
        let provider = fake_provider(
            r#"
handshake
read -r line
reply "$TOOLS"
read -r line
"#,
        );
        let session = provider.open().await.unwrap();
        let tools = session.list_tools().await.unwrap();

        let result = tools[0].invoke(json!("print(1)")).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));

        session.close().await;
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let provider = McpStdioProvider::new("/nonexistent/mcp-server", Vec::new());
        let result = provider.open().await;
        assert!(matches!(result, Err(SessionError::Spawn(_))));
    }

    #[tokio::test]
    async fn test_server_exiting_during_initialize() {
        let provider = McpStdioProvider::new("sh", vec!["-c".to_string(), "exit 0".to_string()]);
        let result = provider.open().await;
        assert!(matches!(result, Err(SessionError::Initialize(_))));
    }

    #[test]
    fn test_provider_from_config() {
        let config = Config {
            work_dir: PathBuf::from("/work"),
            python_path: "python3".to_string(),
            ..Config::default()
        };
        let provider = McpStdioProvider::from_config(&config);

        assert_eq!(provider.command, "uvx");
        assert_eq!(
            provider.args,
            vec![
                "mcp-python-code-interpreter",
                "--dir",
                "/work",
                "--python-path",
                "python3"
            ]
        );
        assert!(provider
            .env
            .contains(&("MCP_ALLOW_SYSTEM_ACCESS".to_string(), "0".to_string())));
        assert!(provider
            .env
            .contains(&("PYTHONIOENCODING".to_string(), "utf-8".to_string())));
    }

    #[test]
    fn test_client_info_announces_protocol() {
        let info = serde_json::to_value(client_info().unwrap()).unwrap();
        assert_eq!(info["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(info["clientInfo"]["name"], "reactrun-worker");
    }

    #[test]
    fn test_content_text() {
        assert_eq!(content_text(&[]), "");
        assert_eq!(
            content_text(&[Content::text("4"), Content::text("done")]),
            "4\ndone"
        );

        let image = content_text(&[Content::image("eA==", "image/png")]);
        let parsed: Value = serde_json::from_str(&image).unwrap();
        assert_eq!(parsed["type"], "image");
    }
}
