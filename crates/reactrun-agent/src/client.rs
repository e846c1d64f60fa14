//! Ready-to-use implementation of the `ProgressHandler` trait.

use async_trait::async_trait;
use tracing::trace;

use crate::protocol::ProgressHandler;

/// A handler that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl ProgressHandler for NoopHandler {
    async fn on_llm_start(&self, message_count: usize) {
        trace!(message_count, "LLM start");
    }

    async fn on_tool_start(&self, tool_name: &str, _input: &str) {
        trace!(tool = %tool_name, "Tool start");
    }

    async fn on_tool_end(&self, tool_name: &str, _output: &str) {
        trace!(tool = %tool_name, "Tool end");
    }

    async fn on_tool_error(&self, tool_name: &str, _error: &str) {
        trace!(tool = %tool_name, "Tool error");
    }
}

#[cfg(test)]
pub(crate) use channel::{ChannelHandler, ProgressUpdate};

#[cfg(test)]
mod channel {
    use super::*;
    use tokio::sync::mpsc;

    /// Progress observed by a [`ChannelHandler`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum ProgressUpdate {
        LlmStarted { message_count: usize },
        ToolStarted { tool_name: String, input: String },
        ToolFinished { tool_name: String, output: String },
        ToolFailed { tool_name: String, error: String },
    }

    /// A handler that forwards every callback into a channel.
    pub(crate) struct ChannelHandler {
        tx: mpsc::UnboundedSender<ProgressUpdate>,
    }

    impl ChannelHandler {
        /// Create a new handler with its update receiver.
        pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx }, rx)
        }

        fn send(&self, update: ProgressUpdate) {
            // Receiver might be dropped
            self.tx.send(update).ok();
        }
    }

    #[async_trait]
    impl ProgressHandler for ChannelHandler {
        async fn on_llm_start(&self, message_count: usize) {
            self.send(ProgressUpdate::LlmStarted { message_count });
        }

        async fn on_tool_start(&self, tool_name: &str, input: &str) {
            self.send(ProgressUpdate::ToolStarted {
                tool_name: tool_name.to_string(),
                input: input.to_string(),
            });
        }

        async fn on_tool_end(&self, tool_name: &str, output: &str) {
            self.send(ProgressUpdate::ToolFinished {
                tool_name: tool_name.to_string(),
                output: output.to_string(),
            });
        }

        async fn on_tool_error(&self, tool_name: &str, error: &str) {
            self.send(ProgressUpdate::ToolFailed {
                tool_name: tool_name.to_string(),
                error: error.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_handler_forwards_updates() {
        let (handler, mut rx) = ChannelHandler::new();

        handler.on_llm_start(1).await;
        handler.on_tool_start("run_python", "{}").await;
        handler.on_tool_end("run_python", "42").await;

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressUpdate::LlmStarted { message_count: 1 }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ProgressUpdate::ToolStarted { .. }
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressUpdate::ToolFinished {
                tool_name: "run_python".to_string(),
                output: "42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_channel_handler_tolerates_dropped_receiver() {
        let (handler, rx) = ChannelHandler::new();
        drop(rx);
        handler.on_tool_error("run_python", "boom").await;
    }
}
