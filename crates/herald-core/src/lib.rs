//! Shared domain types for Herald.
//!
//! Contains configuration loading and resolution, the cross-cutting error
//! type, and the trigger event envelope. Infrastructure crates
//! (`herald-assistant`, `herald-toolset`) and the orchestration crate
//! (`herald-review`) all build on the types defined here; this crate itself
//! performs no network I/O.

pub mod config;
pub mod error;
pub mod event;

pub use config::{
    ApiTarget, AssistantConfig, ChannelConfig, EnvSource, HeraldConfig, ProcessEnv, PromptSource,
    RuntimeConfig, StdinPrompt, ToolsetConfig, DIRECT_BASE_URL, DIRECT_DEFAULT_MODEL,
    PROXY_BASE_URL, PROXY_DEFAULT_MODEL,
};
pub use error::{Disposition, HeraldError};
pub use event::TriggerEvent;
