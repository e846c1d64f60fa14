//! Worker configuration.

use std::path::PathBuf;

use clap::Args;
use reactrun_agent::{DEFAULT_BASE_URL, DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL};

/// Default image generation model.
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// Default launcher for the code-interpreter tool server.
pub const DEFAULT_MCP_COMMAND: &str = "uvx";

/// Package name of the code-interpreter tool server.
pub const MCP_SERVER_PACKAGE: &str = "mcp-python-code-interpreter";

/// Worker settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    /// Working directory for the code interpreter and generated images
    #[arg(long, env = "PGPT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Python interpreter handed to the code interpreter
    #[arg(long, env = "PGPT_PYTHON_PATH")]
    pub python_path: Option<String>,

    /// API key for the model and image endpoints
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Chat model used by the agent
    #[arg(long, env = "REACTRUN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, default_value = "0")]
    pub temperature: f32,

    /// Maximum model requests per job
    #[arg(long, env = "REACTRUN_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Image generation model
    #[arg(long, env = "REACTRUN_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    /// Launcher used to start the code-interpreter tool server
    #[arg(long, env = "REACTRUN_MCP_COMMAND", default_value = DEFAULT_MCP_COMMAND)]
    pub mcp_command: String,

    /// Encoding forwarded to the tool server's Python
    #[arg(long, env = "PYTHONIOENCODING", default_value = "utf-8")]
    pub python_io_encoding: String,
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory handed to the code interpreter; generated images land here.
    pub work_dir: PathBuf,

    /// Python interpreter path.
    pub python_path: String,

    /// API key, checked when the model or image endpoint is first called.
    pub api_key: Option<String>,

    /// API base URL.
    pub base_url: String,

    /// Chat model name.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum model requests per job.
    pub max_iterations: usize,

    /// Image generation model name.
    pub image_model: String,

    /// Tool server launcher.
    pub mcp_command: String,

    /// `PYTHONIOENCODING` for the tool server.
    pub python_io_encoding: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            python_path: "python".to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            mcp_command: DEFAULT_MCP_COMMAND.to_string(),
            python_io_encoding: "utf-8".to_string(),
        }
    }
}

impl From<WorkerArgs> for Config {
    fn from(args: WorkerArgs) -> Self {
        let defaults = Config::default();
        let python_path = args
            .python_path
            .or_else(|| std::env::var("PYTHON").ok())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.python_path);

        Self {
            work_dir: args.work_dir.unwrap_or(defaults.work_dir),
            python_path,
            api_key: args.api_key.filter(|k| !k.is_empty()),
            base_url: args.base_url,
            model: args.model,
            temperature: args.temperature,
            max_iterations: args.max_iterations,
            image_model: args.image_model,
            mcp_command: args.mcp_command,
            python_io_encoding: args.python_io_encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        worker: WorkerArgs,
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_iterations, 25);
        assert_eq!(config.image_model, "gpt-image-1");
        assert_eq!(config.mcp_command, "uvx");
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_args_into_config() {
        let cli = TestCli::parse_from([
            "test",
            "--work-dir",
            "/tmp/jobs",
            "--python-path",
            "/usr/bin/python3",
            "--api-key",
            "sk-test",
            "--model",
            "gpt-4o",
            "--max-iterations",
            "5",
        ]);
        let config = Config::from(cli.worker);

        assert_eq!(config.work_dir, PathBuf::from("/tmp/jobs"));
        assert_eq!(config.python_path, "/usr/bin/python3");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_iterations, 5);
    }
}
