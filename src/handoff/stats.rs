// src/handoff/stats.rs
// Statistics per `source_to_target` pair (spec §4.8.2), grounded in the
// teacher's `RoutingStats` (`llm/router/types.rs`): count, success rate,
// avg duration, kept in an `RwLock`-guarded map.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct PairStats {
    pub count: u64,
    pub successes: u64,
    pub total_duration: Duration,
}

impl PairStats {
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.successes as f64 / self.count as f64
        }
    }

    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

#[derive(Default)]
pub struct HandoffStats {
    pairs: RwLock<HashMap<String, PairStats>>,
}

impl HandoffStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(source: &str, target: &str) -> String {
        format!("{source}->{target}")
    }

    pub fn record(&self, source: &str, target: &str, success: bool, duration: Duration) {
        let mut pairs = self.pairs.write().unwrap();
        let entry = pairs.entry(Self::key(source, target)).or_default();
        entry.count += 1;
        if success {
            entry.successes += 1;
        }
        entry.total_duration += duration;
    }

    pub fn get(&self, source: &str, target: &str) -> PairStats {
        self.pairs.read().unwrap().get(&Self::key(source, target)).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_success_rate_per_pair() {
        let stats = HandoffStats::new();
        stats.record("search_agent", "order_agent", true, Duration::from_millis(100));
        stats.record("search_agent", "order_agent", false, Duration::from_millis(200));

        let pair = stats.get("search_agent", "order_agent");
        assert_eq!(pair.count, 2);
        assert_eq!(pair.success_rate(), 0.5);
        assert_eq!(pair.avg_duration(), Duration::from_millis(150));
    }
}
