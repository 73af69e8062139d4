use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use herald_assistant::{AssistantClient, Run, RunId, RunStatus, ThreadId, ToolOutput};
use herald_core::HeraldError;
use herald_toolset::ToolsetClient;
use tracing::{debug, warn};

/// Collaborator that drives a run to completion.
///
/// Given a run and its thread, execute whatever tool calls the model
/// requests until the run reaches a terminal state. The review handler
/// depends only on this seam, so tests mock it instead of re-testing the
/// provider's polling behavior.
#[async_trait]
pub trait ResolveRun: Send + Sync {
    /// Drive `run` on `thread` until it completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the run ends in any terminal state other than
    /// completed, or if the wait itself fails.
    async fn resolve(&self, thread: &ThreadId, run: &RunId) -> Result<(), HeraldError>;
}

/// Production [`ResolveRun`]: poll the run, relay requested tool calls to
/// the integration service, submit their outputs, repeat.
///
/// A failed action does not abort the run: its error text is submitted as
/// that call's output so the model can finish and report. The optional
/// deadline bounds how long one event may hold the process.
pub struct ToolCallLoop {
    assistant: Arc<AssistantClient>,
    toolset: Arc<ToolsetClient>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ToolCallLoop {
    /// Create the loop with the given polling cadence and optional deadline.
    pub fn new(
        assistant: Arc<AssistantClient>,
        toolset: Arc<ToolsetClient>,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            assistant,
            toolset,
            poll_interval,
            timeout,
        }
    }

    async fn execute_tool_calls(&self, state: &Run) -> Vec<ToolOutput> {
        let calls = state
            .required_action
            .as_ref()
            .map(|a| a.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or_default();

        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let name = call.function.name.as_str();
            debug!(tool = name, call_id = %call.id, "executing requested tool call");
            let arguments: serde_json::Value = match serde_json::from_str(&call.function.arguments)
            {
                Ok(v) => v,
                Err(e) => {
                    warn!(tool = name, error = %e, "model sent malformed tool arguments");
                    outputs.push(ToolOutput {
                        tool_call_id: call.id.clone(),
                        output: error_output(&format!("malformed arguments: {e}")),
                    });
                    continue;
                }
            };
            let output = match self.toolset.execute_action(name, arguments).await {
                Ok(result) => result.to_string(),
                Err(e) => {
                    warn!(tool = name, error = %e, "tool call failed");
                    error_output(&e.to_string())
                }
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }
}

fn error_output(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[async_trait]
impl ResolveRun for ToolCallLoop {
    async fn resolve(&self, thread: &ThreadId, run: &RunId) -> Result<(), HeraldError> {
        let started = Instant::now();
        let mut state = self.assistant.get_run(thread, run).await?;
        loop {
            match state.status {
                RunStatus::Completed => return Ok(()),
                RunStatus::RequiresAction => {
                    let outputs = self.execute_tool_calls(&state).await;
                    // Submission returns the continued run; no extra poll needed.
                    state = self.assistant.submit_tool_outputs(thread, run, &outputs).await?;
                }
                status if status.is_terminal() => {
                    let detail = state
                        .last_error
                        .map(|e| e.message)
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "no detail reported".into());
                    return Err(HeraldError::Assistant(format!(
                        "run {run} ended with status {status}: {detail}"
                    )));
                }
                _ => {
                    if let Some(timeout) = self.timeout {
                        if started.elapsed() >= timeout {
                            return Err(HeraldError::Toolset(format!(
                                "run {run} did not finish within {}s",
                                timeout.as_secs()
                            )));
                        }
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    state = self.assistant.get_run(thread, run).await?;
                }
            }
        }
    }
}
