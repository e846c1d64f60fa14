//! ReactRun Worker

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reactrun_core::JobInputs;
use reactrun_worker::http::{create_router, AppState};
use reactrun_worker::{Config, JobExecutor, JsonLinesSink, WorkerArgs, WorkerError};

/// ReactRun worker - runs ReAct agent jobs and streams their events.
#[derive(Parser, Debug)]
#[command(name = "reactrun-worker", version, about)]
struct Cli {
    #[command(flatten)]
    worker: WorkerArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one job and write its events to stdout as JSON lines
    Run {
        /// Job context document (JSON file, or - for stdin)
        #[arg(long, default_value = "-")]
        context: String,
    },

    /// Serve the job HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "REACTRUN_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries events
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Worker failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), WorkerError> {
    let config = Config::from(cli.worker);

    info!(
        work_dir = %config.work_dir.display(),
        model = %config.model,
        mcp_command = %config.mcp_command,
        api_key_set = config.api_key.is_some(),
        "Starting ReactRun worker"
    );

    let executor = JobExecutor::from_config(&config);

    match cli.command {
        Command::Run { context } => {
            let inputs = read_context(&context).await?;
            let report = executor
                .execute(&inputs, Arc::new(JsonLinesSink::stdout()))
                .await;
            info!(job_id = %report.job_id, status = ?report.outcome.status, "Job finished");
            Ok(())
        }
        Command::Serve { bind } => {
            let addr: SocketAddr = bind
                .parse()
                .map_err(|_| WorkerError::InvalidBind(bind.clone()))?;
            let router = create_router(Arc::new(AppState { executor }));

            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(addr = %addr, "HTTP server listening");
            axum::serve(listener, router).await?;
            Ok(())
        }
    }
}

async fn read_context(source: &str) -> Result<JobInputs, WorkerError> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(PathBuf::from(source)).await?
    };

    let context: Value = serde_json::from_str(&raw)?;
    Ok(JobInputs::from_context(context)?)
}
