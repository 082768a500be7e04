// src/search/deps.rs
// External collaborators of the search composition (spec §4.9, §6): the
// embedding service, the k-NN/keyword search backends, the routing
// (distance) service, and search-history tracking. Grounded in the same
// reqwest-over-async-trait shape as `address/deps.rs`.

use super::types::SearchItem;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub module: String,
    pub query: String,
    pub veg: Option<bool>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub category: Option<String>,
    pub zone_id: Option<i64>,
    pub limit: u32,
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

#[async_trait]
pub trait SemanticSearchClient: Send + Sync {
    /// k-NN query against `<module>_items_v2` (spec §4.9 step 4).
    async fn knn_search(&self, index: &str, vector: &[f32], k: u32, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>>;
}

#[async_trait]
pub trait KeywordSearchClient: Send + Sync {
    async fn keyword_search(&self, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>>;
}

#[async_trait]
pub trait RoutingClient: Send + Sync {
    async fn distance_km(&self, from: (f64, f64), to: (f64, f64)) -> anyhow::Result<f64>;
}

#[async_trait]
pub trait SearchHistoryTracker: Send + Sync {
    async fn record(&self, participant_id: &str, query: &str, module: &str) -> anyhow::Result<()>;
}

const EMBED_TIMEOUT: Duration = Duration::from_secs(5);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ReqwestEmbeddingClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestEmbeddingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl EmbeddingClient for ReqwestEmbeddingClient {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/embed", self.base_url))
            .timeout(EMBED_TIMEOUT)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp["embedding"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_f64()).map(|v| v as f32).collect())
            .ok_or_else(|| anyhow::anyhow!("embedding service returned no vector"))
    }
}

pub struct OpenSearchSemanticClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenSearchSemanticClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl SemanticSearchClient for OpenSearchSemanticClient {
    async fn knn_search(&self, index: &str, vector: &[f32], k: u32, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>> {
        let mut must = vec![];
        if let Some(veg) = filters.veg {
            must.push(serde_json::json!({ "term": { "veg": veg } }));
        }
        if let Some(category) = &filters.category {
            must.push(serde_json::json!({ "term": { "category.keyword": category } }));
        }
        if let Some(zone_id) = filters.zone_id {
            must.push(serde_json::json!({ "term": { "zone_id": zone_id } }));
        }
        if filters.price_min.is_some() || filters.price_max.is_some() {
            let mut range = serde_json::Map::new();
            if let Some(min) = filters.price_min {
                range.insert("gte".to_string(), serde_json::json!(min));
            }
            if let Some(max) = filters.price_max {
                range.insert("lte".to_string(), serde_json::json!(max));
            }
            must.push(serde_json::json!({ "range": { "price": range } }));
        }

        let body = serde_json::json!({
            "size": filters.limit,
            "query": {
                "bool": {
                    "must": must,
                    "should": [{
                        "knn": { "field": "embedding", "query_vector": vector, "k": k }
                    }]
                }
            }
        });

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/{index}/_search", self.base_url))
            .timeout(SEARCH_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hits = resp["hits"]["hits"].as_array().cloned().unwrap_or_default();
        Ok(hits.into_iter().map(hit_to_item).collect())
    }
}

pub struct HttpKeywordSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKeywordSearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl KeywordSearchClient for HttpKeywordSearchClient {
    async fn keyword_search(&self, filters: &SearchFilters) -> anyhow::Result<Vec<SearchItem>> {
        let mut query = vec![("q", filters.query.clone()), ("module", filters.module.clone()), ("limit", filters.limit.to_string())];
        if let Some(veg) = filters.veg {
            query.push(("veg", veg.to_string()));
        }
        if let Some(category) = &filters.category {
            query.push(("category", category.clone()));
        }
        if let Some(zone_id) = filters.zone_id {
            query.push(("zone_id", zone_id.to_string()));
        }
        if let Some(min) = filters.price_min {
            query.push(("price_min", min.to_string()));
        }
        if let Some(max) = filters.price_max {
            query.push(("price_max", max.to_string()));
        }

        let resp: serde_json::Value = self
            .client
            .get(format!("{}/search", self.base_url))
            .timeout(SEARCH_TIMEOUT)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = resp["items"].as_array().cloned().unwrap_or_default();
        Ok(items.into_iter().map(hit_to_item).collect())
    }
}

fn hit_to_item(v: serde_json::Value) -> SearchItem {
    let source = v.get("_source").cloned().unwrap_or(v);
    SearchItem {
        id: source["id"].as_str().unwrap_or_default().to_string(),
        name: source["name"].as_str().unwrap_or_default().to_string(),
        price: source["price"].as_f64().unwrap_or_default(),
        category: source["category"].as_str().map(str::to_string),
        veg: source["veg"].as_bool(),
        rating: source["rating"].as_f64().map(|v| v as f32),
        lat: source["lat"].as_f64(),
        lng: source["lng"].as_f64(),
        distance_km: None,
        raw: source,
    }
}

pub struct ReqwestRoutingClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestRoutingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl RoutingClient for ReqwestRoutingClient {
    async fn distance_km(&self, from: (f64, f64), to: (f64, f64)) -> anyhow::Result<f64> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/distance", self.base_url))
            .timeout(SEARCH_TIMEOUT)
            .query(&[("from_lat", from.0), ("from_lng", from.1), ("to_lat", to.0), ("to_lng", to.1)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp["distance_km"].as_f64().ok_or_else(|| anyhow::anyhow!("routing service returned no distance"))
    }
}

pub struct PhpBackendSearchHistoryTracker {
    client: reqwest::Client,
    base_url: String,
}

impl PhpBackendSearchHistoryTracker {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl SearchHistoryTracker for PhpBackendSearchHistoryTracker {
    async fn record(&self, participant_id: &str, query: &str, module: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/api/v1/profile/search-history", self.base_url))
            .json(&serde_json::json!({ "participantId": participant_id, "query": query, "module": module }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
