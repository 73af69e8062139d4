//! Assistants API client infrastructure for Herald.
//!
//! Speaks the OpenAI-compatible Assistants surface (assistants, threads,
//! messages, runs, tool outputs) against whichever endpoint configuration
//! selected: the direct provider or an OpenRouter-style proxy. The wire
//! format lives in [`types`]; all transport, auth headers, and error mapping
//! live in [`client`].

pub mod client;
pub mod types;

pub use client::AssistantClient;
pub use types::{
    Assistant, AssistantId, CreateAssistantRequest, FunctionCall, FunctionDefinition, Message,
    MessageRole, RequiredAction, Run, RunId, RunLastError, RunStatus, SubmitToolOutputs, Thread,
    ThreadId, ToolCallRequest, ToolDefinition, ToolOutput,
};
