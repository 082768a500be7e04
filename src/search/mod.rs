// src/search/mod.rs
// C11: Function Executor — `search_products` composition (spec §4.9).
// Zone resolution → query parse/merge → module resolution → semantic
// branch with keyword fallback → distance enrichment → fire-and-forget
// history tracking → uniform response shape.

pub mod deps;
pub mod types;

use crate::fire_and_forget::FireAndForgetQueue;
use crate::query_parser;
use deps::{EmbeddingClient, KeywordSearchClient, RoutingClient, SearchFilters, SearchHistoryTracker, SemanticSearchClient};
use std::sync::Arc;
use types::{SearchArgs, SearchItem, SearchMode, SearchResponse, ZoneInfo, DEFAULT_LIMIT, KNN_K};

pub struct SearchExecutor {
    pub embedding: Arc<dyn EmbeddingClient>,
    pub semantic: Arc<dyn SemanticSearchClient>,
    pub keyword: Arc<dyn KeywordSearchClient>,
    pub routing: Option<Arc<dyn RoutingClient>>,
    pub history_tracker: Option<Arc<dyn SearchHistoryTracker>>,
    pub fire_and_forget: Arc<FireAndForgetQueue>,
}

/// Caller-side context the search executor needs but does not own: the
/// participant's cached zone/location and the "is vegetarian" signal
/// derived from their preference profile (spec §4.9 step 1/2).
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub participant_id: String,
    pub cached_zone_id: Option<i64>,
    pub location: Option<(f64, f64)>,
    pub context_module: Option<String>,
    pub profile_veg: Option<bool>,
}

const ECOM_ALIASES: &[&str] = &["dukan", "shop", "grocery", "kirana"];

fn normalize_module(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if ECOM_ALIASES.contains(&lower.as_str()) {
        "ecom".to_string()
    } else {
        lower
    }
}

fn sniff_module(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    if lower.contains("restaurant") || lower.contains("cafe") {
        Some("food")
    } else if lower.contains("dukan") || lower.contains("shop") {
        Some("ecom")
    } else {
        None
    }
}

impl SearchExecutor {
    pub async fn search_products(
        &self,
        args: SearchArgs,
        ctx: &SearchContext,
        zone_lookup: Option<&(dyn Fn(f64, f64) -> Option<i64> + Sync)>,
    ) -> SearchResponse {
        let (zone_id, zone_warning) = self.resolve_zone(ctx, zone_lookup);

        let parsed = query_parser::parse(&args.query);
        let veg = query_parser::merge_veg(args.veg, parsed.veg, ctx.profile_veg);
        let price_min = args.price_min.or(parsed.price_min);
        let price_max = args.price_max.or(parsed.price_max);
        let category = args.category.clone().or_else(|| parsed.category.map(str::to_string));

        let module = args
            .module
            .as_deref()
            .map(normalize_module)
            .or_else(|| parsed.target_module.map(normalize_module))
            .or_else(|| ctx.context_module.clone())
            .or_else(|| sniff_module(&args.query).map(str::to_string))
            .unwrap_or_else(|| "ecom".to_string());

        let filters = SearchFilters {
            module: module.clone(),
            query: parsed.clean_query.clone(),
            veg,
            price_min,
            price_max,
            category,
            zone_id,
            limit: args.limit.unwrap_or(DEFAULT_LIMIT),
        };

        let (mut items, mode) = self.run_semantic_or_keyword(&filters).await;

        if let (Some(routing), Some(loc)) = (&self.routing, ctx.location) {
            self.enrich_with_distance(&mut items, routing.as_ref(), loc).await;
        }

        self.track_history(ctx, &filters);

        let showing = items.len() as u64;
        SearchResponse {
            total: showing,
            showing,
            message: search_summary_message(showing, &filters.module),
            items,
            search_mode: mode,
            zone: zone_id.map(|id| ZoneInfo { zone_id: id, zone_name: None }),
            warning: zone_warning,
        }
    }

    fn resolve_zone(&self, ctx: &SearchContext, zone_lookup: Option<&(dyn Fn(f64, f64) -> Option<i64> + Sync)>) -> (Option<i64>, Option<String>) {
        if let Some(zone_id) = ctx.cached_zone_id {
            return (Some(zone_id), None);
        }
        if let (Some(lookup), Some((lat, lng))) = (zone_lookup, ctx.location) {
            if let Some(zone_id) = lookup(lat, lng) {
                return (Some(zone_id), None);
            }
            return (None, Some("Couldn't confirm your delivery zone, showing results without a zone filter.".to_string()));
        }
        (None, None)
    }

    async fn run_semantic_or_keyword(&self, filters: &SearchFilters) -> (Vec<SearchItem>, SearchMode) {
        match self.try_semantic(filters).await {
            Ok(items) => (items, SearchMode::Semantic),
            Err(e) => {
                tracing::warn!(error = %e, module = %filters.module, "semantic search failed, falling back to keyword search");
                match self.keyword.keyword_search(filters).await {
                    Ok(items) => (items, SearchMode::Keyword),
                    Err(e) => {
                        tracing::error!(error = %e, "keyword search fallback also failed");
                        (vec![], SearchMode::Keyword)
                    }
                }
            }
        }
    }

    async fn try_semantic(&self, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>> {
        let vector = self.embedding.embed(&filters.query).await?;
        let index = format!("{}_items_v2", filters.module);
        self.semantic.knn_search(&index, &vector, KNN_K, filters).await
    }

    async fn enrich_with_distance(&self, items: &mut [SearchItem], routing: &dyn RoutingClient, from: (f64, f64)) {
        for item in items.iter_mut() {
            if let (Some(lat), Some(lng)) = (item.lat, item.lng) {
                match routing.distance_km(from, (lat, lng)).await {
                    Ok(km) => item.distance_km = Some(km),
                    Err(e) => {
                        tracing::debug!(error = %e, "distance enrichment skipped for item");
                    }
                }
            }
        }
        items.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    fn track_history(&self, ctx: &SearchContext, filters: &SearchFilters) {
        let Some(tracker) = self.history_tracker.clone() else {
            return;
        };
        let participant_id = ctx.participant_id.clone();
        let query = filters.query.clone();
        let module = filters.module.clone();
        // search-history tracking is fire-and-forget (spec §4.9 step 7).
        self.fire_and_forget.submit("search_history", async move {
            tracker.record(&participant_id, &query, &module).await
        });
    }
}

fn search_summary_message(count: u64, module: &str) -> String {
    if count == 0 {
        format!("I couldn't find anything in {module} matching that. Try a different search?")
    } else {
        format!("Found {count} result{} for you.", if count == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingEmbedding;
    #[async_trait]
    impl EmbeddingClient for FailingEmbedding {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("embedding service 503")
        }
    }

    struct UnreachableSemantic;
    #[async_trait]
    impl SemanticSearchClient for UnreachableSemantic {
        async fn knn_search(&self, _i: &str, _v: &[f32], _k: u32, _f: &SearchFilters) -> anyhow::Result<Vec<SearchItem>> {
            unreachable!("semantic branch should not be called once embedding fails")
        }
    }

    struct FakeKeyword;
    #[async_trait]
    impl KeywordSearchClient for FakeKeyword {
        async fn keyword_search(&self, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>> {
            Ok(vec![SearchItem { id: "1".to_string(), name: format!("keyword-result-for-{}", filters.module), ..Default::default() }])
        }
    }

    fn executor(keyword: Arc<dyn KeywordSearchClient>) -> SearchExecutor {
        SearchExecutor {
            embedding: Arc::new(FailingEmbedding),
            semantic: Arc::new(UnreachableSemantic),
            keyword,
            routing: None,
            history_tracker: None,
            fire_and_forget: Arc::new(FireAndForgetQueue::spawn(8)),
        }
    }

    #[tokio::test]
    async fn embedding_failure_falls_back_to_keyword_search() {
        // S6: embedding service returns 503 within timeout.
        let exec = executor(Arc::new(FakeKeyword));
        let args = SearchArgs { query: "veg pizza".to_string(), ..Default::default() };
        let ctx = SearchContext { cached_zone_id: Some(7), ..Default::default() };

        let resp = exec.search_products(args, &ctx, None).await;

        assert_eq!(resp.search_mode, SearchMode::Keyword);
        assert_eq!(resp.zone.unwrap().zone_id, 7);
        assert_eq!(resp.items.len(), 1);
    }

    #[test]
    fn ecom_aliases_normalize() {
        for alias in ECOM_ALIASES {
            assert_eq!(normalize_module(alias), "ecom");
        }
    }

    #[tokio::test]
    async fn zone_lookup_failure_produces_warning_not_block() {
        let exec = executor(Arc::new(FakeKeyword));
        let ctx = SearchContext { location: Some((18.5, 73.8)), ..Default::default() };
        let (zone_id, warning) = exec.resolve_zone(&ctx, Some(&|_lat, _lng| None));
        assert_eq!(zone_id, None);
        assert!(warning.is_some());
    }

    struct RecordingTracker(Arc<std::sync::Mutex<Vec<(String, String, String)>>>);
    #[async_trait]
    impl deps::SearchHistoryTracker for RecordingTracker {
        async fn record(&self, participant_id: &str, query: &str, module: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push((participant_id.to_string(), query.to_string(), module.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn search_products_records_history_through_the_real_tracker() {
        // Spec §4.9 step 7: the profile write actually happens, not just a
        // log line, once a tracker is wired in.
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut exec = executor(Arc::new(FakeKeyword));
        exec.history_tracker = Some(Arc::new(RecordingTracker(calls.clone())));

        let args = SearchArgs { query: "veg pizza".to_string(), ..Default::default() };
        let ctx = SearchContext { participant_id: "whatsapp-42".to_string(), cached_zone_id: Some(7), ..Default::default() };
        exec.search_products(args, &ctx, None).await;

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.as_slice(), [("whatsapp-42".to_string(), "veg pizza".to_string(), "ecom".to_string())]);
    }
}
