//! Review orchestration for Herald.
//!
//! Composes the assistant's standing instructions, drives the per-event
//! sequence (thread, message, run), and resolves the tool calls a run
//! requests until it reaches a terminal state.

pub mod handler;
pub mod prompt;
pub mod resolver;

pub use handler::{playground_url, ReviewHandler, ReviewOutcome};
pub use prompt::compose_instructions;
pub use resolver::{ResolveRun, ToolCallLoop};
