// src/agents/mod.rs
// C9: Agent Registry + invocation.

pub mod concrete;
pub mod registry;
pub mod types;

pub use registry::AgentRegistry;
pub use types::{Agent, AgentContext, AgentOutcome};
