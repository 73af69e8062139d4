//! Tool-integration service client for Herald.
//!
//! Three concerns live here: the fixed capability catalog the assistant is
//! registered with ([`catalog`]), remote execution of the actions the model
//! requests during a run ([`client`]), and the trigger subscription that
//! delivers pull-request events ([`listener`]).

pub mod catalog;
pub mod client;
pub mod listener;

pub use catalog::Capability;
pub use client::ToolsetClient;
pub use listener::{EventStream, TriggerListener};
