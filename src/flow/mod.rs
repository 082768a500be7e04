// src/flow/mod.rs
// C7: Flow Dispatcher facade + flow catalog cache.

pub mod cache;
pub mod dispatcher;
pub mod types;

pub use cache::FlowCache;
pub use dispatcher::{FlowDispatcher, PhpBackendFlowDispatcher};
pub use types::{FlowDefinition, FlowHandle, FlowStepResult};
