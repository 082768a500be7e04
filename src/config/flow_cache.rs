// src/config/flow_cache.rs

#[derive(Debug, Clone)]
pub struct FlowCacheConfig {
    pub ttl_secs: u64,
}

impl FlowCacheConfig {
    pub fn from_env() -> Self {
        Self { ttl_secs: super::env_u64("FLOW_CACHE_TTL_SECS", 300) }
    }
}
