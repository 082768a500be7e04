// src/api/mod.rs
// The one HTTP surface: POST /v1/messages wrapping `processMessage` (spec
// §6), plus health/readiness/liveness probes, grounded in the teacher's
// `api::{http, state}` split.

pub mod http;
pub mod state;

pub use state::AppState;
