// src/config/mod.rs
// Central configuration, composed from domain sub-configs the way the
// teacher's MiraConfig composes gemini/openai/memory/server config structs.

pub mod external;
pub mod flow_cache;
pub mod server;

use once_cell::sync::Lazy;

pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub external: external::ExternalServicesConfig,
    pub server: server::ServerConfig,
    pub database: server::DatabaseConfig,
    pub logging: server::LoggingConfig,
    pub flow_cache: flow_cache::FlowCacheConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            external: external::ExternalServicesConfig::from_env(),
            server: server::ServerConfig::from_env(),
            database: server::DatabaseConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
            flow_cache: flow_cache::FlowCacheConfig::from_env(),
        }
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
