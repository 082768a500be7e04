// src/search/types.rs
// C11 data shapes (spec §4.9 step 8): the uniform response across the
// semantic and keyword branches.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Semantic,
    Keyword,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub veg: Option<bool>,
    pub rating: Option<f32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance_km: Option<f64>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
    pub showing: u64,
    pub items: Vec<SearchItem>,
    pub message: String,
    pub search_mode: SearchMode,
    pub zone: Option<ZoneInfo>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub zone_id: i64,
    pub zone_name: Option<String>,
}

/// Caller-supplied arguments to `search_products`, merged with the parsed
/// query per the precedence of spec §4.9 step 2/3.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub query: String,
    pub module: Option<String>,
    pub veg: Option<bool>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub category: Option<String>,
    pub limit: Option<u32>,
}

pub const DEFAULT_LIMIT: u32 = 20;
pub const KNN_K: u32 = 100;
