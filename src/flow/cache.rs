// src/flow/cache.rs
// Flow catalog cache (spec §5 "Caches"): TTL'd, single-flight
// `findFlowByIntent`, with an explicit `clear()` for tests. Grounded in the
// teacher's split between `cache/session_state.rs` (the cached value) and
// `cache/session_state_store.rs` (the thing that populates it).

use super::dispatcher::FlowDispatcher;
use super::types::FlowDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CacheEntry {
    value: Option<FlowDefinition>,
    inserted_at: Instant,
}

pub struct FlowCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Single-flight: in-flight loads for a key share one future via this
    /// per-key lock, so concurrent callers converge on a single fetch.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FlowCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()), inflight: Mutex::new(HashMap::new()) }
    }

    fn cache_key(intent: &str, module: Option<&str>) -> String {
        format!("{intent}::{}", module.unwrap_or(""))
    }

    pub async fn find_flow_by_intent(
        &self,
        dispatcher: &dyn FlowDispatcher,
        intent: &str,
        module: Option<&str>,
        message: Option<&str>,
    ) -> anyhow::Result<Option<FlowDefinition>> {
        let key = Self::cache_key(intent, module);

        if let Some(entry) = self.entries.lock().await.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
        }

        let lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        let _guard = lock.lock().await;

        // Re-check after acquiring the single-flight lock: another caller
        // may have just populated it.
        if let Some(entry) = self.entries.lock().await.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
        }

        let value = dispatcher.find_flow_by_intent(intent, module, message).await?;
        self.entries.lock().await.insert(key, CacheEntry { value: value.clone(), inserted_at: Instant::now() });
        Ok(value)
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::FlowStepResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDispatcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FlowDispatcher for CountingDispatcher {
        async fn get_active_flow(&self, _key: &str) -> anyhow::Result<Option<crate::flow::types::FlowHandle>> {
            Ok(None)
        }
        async fn is_in_wait_state(&self, _key: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn process_active_flow(&self, _k: &str, _m: &str, _i: &str, _c: f32) -> anyhow::Result<FlowStepResult> {
            unreachable!()
        }
        async fn start_flow(&self, _f: &str, _c: serde_json::Value) -> anyhow::Result<FlowStepResult> {
            unreachable!()
        }
        async fn find_flow_by_intent(
            &self,
            intent: &str,
            module: Option<&str>,
            _message: Option<&str>,
        ) -> anyhow::Result<Option<FlowDefinition>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(FlowDefinition { flow_id: intent.to_string(), module: module.map(str::to_string) }))
        }
        async fn suspend_flow(&self, _k: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn cancel_flow(&self, _k: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn resume_suspended_flow(&self, _k: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn repeated_lookups_within_ttl_hit_cache() {
        let cache = FlowCache::new(Duration::from_secs(60));
        let dispatcher = CountingDispatcher { calls: AtomicUsize::new(0) };

        cache.find_flow_by_intent(&dispatcher, "order_food", Some("food"), None).await.unwrap();
        cache.find_flow_by_intent(&dispatcher, "order_food", Some("food"), None).await.unwrap();

        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_forces_a_fresh_lookup() {
        let cache = FlowCache::new(Duration::from_secs(60));
        let dispatcher = CountingDispatcher { calls: AtomicUsize::new(0) };

        cache.find_flow_by_intent(&dispatcher, "order_food", None, None).await.unwrap();
        cache.clear().await;
        cache.find_flow_by_intent(&dispatcher, "order_food", None, None).await.unwrap();

        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 2);
    }
}
