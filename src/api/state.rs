// src/api/state.rs
// Shared handler state, grounded in the teacher's `state::AppState`
// (a `Clone` struct of `Arc`s handed to every router via `with_state`),
// narrowed to this crate's two handler dependencies.

use crate::orchestrator::Orchestrator;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sqlite_pool: SqlitePool,
}
