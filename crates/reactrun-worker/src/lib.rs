//! ReactRun worker library.
//!
//! Runs one agent job at a time per call: composes the prompt, drives the
//! agent against a tool session, turns the free-form answer into a JSON
//! payload, and streams lifecycle events to an [`EventSink`].

pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod http;
pub mod inline;
pub mod progress;
pub mod prompt;
pub mod sink;
pub mod tools;

pub use config::{Config, WorkerArgs};
pub use error::{SessionError, SinkError, WorkerError};
pub use executor::{JobExecutor, JobReport};
pub use extract::extract;
pub use inline::{inline, inline_with, ArtifactFs, LocalFs};
pub use progress::QueueProgress;
pub use prompt::compose;
pub use sink::{emit, ChannelSink, EventSink, JsonLinesSink};
pub use tools::{load_all_tools, ToolProvider, ToolSession};
