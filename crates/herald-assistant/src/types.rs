use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a registered assistant.
///
/// # Examples
///
/// ```
/// use herald_assistant::AssistantId;
///
/// let id = AssistantId("asst_abc123".into());
/// assert_eq!(id.to_string(), "asst_abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssistantId(pub String);

/// Opaque identifier of a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

/// Opaque identifier of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl fmt::Display for AssistantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered assistant, as returned by the create call.
#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    /// Identifier referenced by every subsequent run.
    pub id: AssistantId,
}

/// A conversation thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    /// Identifier used for message and run calls.
    pub id: ThreadId,
}

/// A message appended to a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message identifier (unused beyond logging).
    pub id: String,
}

/// Role of a thread message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user input (the event payload).
    User,
    /// Assistant output.
    Assistant,
}

/// Lifecycle state of a run.
///
/// Unknown future states deserialize to [`RunStatus::Unknown`] rather than
/// failing the poll loop.
///
/// # Examples
///
/// ```
/// use herald_assistant::RunStatus;
///
/// let status: RunStatus = serde_json::from_str("\"requires_action\"").unwrap();
/// assert_eq!(status, RunStatus::RequiresAction);
/// assert!(!status.is_terminal());
/// assert!(RunStatus::Completed.is_terminal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted, not yet scheduled.
    Queued,
    /// Model is working.
    InProgress,
    /// The run is blocked on tool outputs from us.
    RequiresAction,
    /// Cancellation requested, not yet effective.
    Cancelling,
    /// Terminal: cancelled before completion.
    Cancelled,
    /// Terminal: the provider reported a failure.
    Failed,
    /// Terminal: finished normally.
    Completed,
    /// Terminal: ended without a full response.
    Incomplete,
    /// Terminal: provider-side deadline elapsed.
    Expired,
    /// Any status this build does not know about.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run has reached a state it will never leave.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A run of the assistant against a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    /// Run identifier.
    pub id: RunId,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// Present while `status` is `requires_action`.
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    /// Present on failed runs.
    #[serde(default)]
    pub last_error: Option<RunLastError>,
}

/// Provider-reported failure detail on a run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunLastError {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Action the provider is waiting on.
#[derive(Debug, Clone, Deserialize)]
pub struct RequiredAction {
    /// Tool calls pending execution on our side.
    pub submit_tool_outputs: SubmitToolOutputs,
}

/// The batch of tool calls a blocked run is waiting for.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitToolOutputs {
    /// Pending calls, resolved in order.
    pub tool_calls: Vec<ToolCallRequest>,
}

/// One tool invocation requested by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id echoed back in the matching [`ToolOutput`].
    pub id: String,
    /// The function the model wants invoked.
    pub function: FunctionCall,
}

/// Function name + raw JSON arguments of a requested call.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    /// Capability wire name (e.g. `GITHUB_CREATE_AN_ISSUE`).
    pub name: String,
    /// Arguments as a JSON-encoded string, passed through unparsed.
    pub arguments: String,
}

/// Result of one executed tool call, submitted back to the run.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    /// Correlation id from the originating [`ToolCallRequest`].
    pub tool_call_id: String,
    /// Serialized execution result (or error text).
    pub output: String,
}

/// A function tool handed to the provider at registration.
///
/// ```json
/// { "type": "function", "function": { "name": "...", ... } }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    /// The wrapped function schema.
    pub function: FunctionDefinition,
}

/// The function schema nested inside [`ToolDefinition`].
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    /// Capability wire name.
    pub name: String,
    /// Short description shown to the model.
    pub description: String,
    /// JSON-schema object describing the parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Wrap a function schema in the provider's tool envelope.
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            tool_type: "function",
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Payload of the create-assistant call.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssistantRequest {
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// System instructions (the composed review prompt).
    pub instructions: String,
    /// Model identifier for the selected endpoint.
    pub model: String,
    /// The capability set the model may call.
    pub tools: Vec<ToolDefinition>,
}
