// src/api/http/mod.rs

pub mod health;
pub mod messages;

pub use health::{health_check, liveness_check, readiness_check};
pub use messages::create_messages_router;
